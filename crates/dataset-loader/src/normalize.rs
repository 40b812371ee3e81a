use indicator_math::force_ascending;
use serde_json::Value;
use stats_core::IndicatorRow;

// Per-field alias precedence: first non-null candidate wins.
// Legacy datasets mixed snake_case and camelCase writers, so both
// spellings survive here in the order the original writers appeared.
const PRICE_ALIASES: &[&str] = &["price", "close", "last", "lastPrice", "last_price"];
const HIGH52_ALIASES: &[&str] = &["high52", "week52_high", "high_52w", "fiftyTwoWeekHigh"];
const RSI_ALIASES: &[&str] = &["rsi", "rsi14", "rsi_14"];
const MA50_ALIASES: &[&str] = &["ma50", "ma_50", "sma50", "sma_50"];
const PCT_VS_MA50_ALIASES: &[&str] = &["pct_vs_ma50", "pctVsMA50", "pct_vs_ma_50"];
const YIELD_ALIASES: &[&str] = &["dividend_yield", "dividendYield", "yield"];
const MARKET_CAP_ALIASES: &[&str] = &["market_cap", "marketCap", "mktcap"];
const COMPANY_ALIASES: &[&str] = &["company", "name", "company_name", "companyName"];
const SECTOR_ALIASES: &[&str] = &["sector", "gics_sector", "sectorName"];
const HISTORICAL_ALIASES: &[&str] = &["historical", "historical_closes", "history", "closes"];

/// First finite numeric among the alias candidates, in order.
fn pick_number(row: &Value, aliases: &[&str]) -> Option<f64> {
    for key in aliases {
        if let Some(v) = row.get(key).and_then(Value::as_f64) {
            if v.is_finite() {
                return Some(v);
            }
        }
    }
    None
}

fn pick_string(row: &Value, aliases: &[&str]) -> Option<String> {
    for key in aliases {
        if let Some(s) = row.get(key).and_then(Value::as_str) {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

/// Extract historical closes. Precedence: explicit numeric array,
/// then array of objects carrying a `close`, then a nested OHLC
/// container's close array, else empty. The result is forced
/// ascending exactly once.
fn pick_historical(row: &Value) -> Vec<f64> {
    let mut closes = Vec::new();

    for key in HISTORICAL_ALIASES {
        if let Some(arr) = row.get(key).and_then(Value::as_array) {
            closes = extract_closes(arr);
            if !closes.is_empty() {
                break;
            }
        }
    }

    if closes.is_empty() {
        if let Some(arr) = row
            .get("ohlc")
            .and_then(|o| o.get("close"))
            .and_then(Value::as_array)
        {
            closes = extract_closes(arr);
        }
    }

    force_ascending(&mut closes);
    closes
}

fn extract_closes(arr: &[Value]) -> Vec<f64> {
    arr.iter()
        .filter_map(|item| match item {
            Value::Number(_) => item.as_f64(),
            Value::Object(_) => item.get("close").and_then(Value::as_f64),
            _ => None,
        })
        .filter(|v| v.is_finite())
        .collect()
}

/// Normalize one raw dataset row into the canonical shape. Rows with
/// no usable ticker are dropped.
pub fn normalize_row(row: &Value) -> Option<IndicatorRow> {
    let ticker = pick_string(row, &["ticker", "symbol"])?;

    Some(IndicatorRow {
        ticker: stats_core::normalize_ticker(&ticker),
        price: pick_number(row, PRICE_ALIASES),
        high52: pick_number(row, HIGH52_ALIASES),
        rsi: pick_number(row, RSI_ALIASES),
        ma50: pick_number(row, MA50_ALIASES),
        pct_vs_ma50: pick_number(row, PCT_VS_MA50_ALIASES),
        company: pick_string(row, COMPANY_ALIASES),
        sector: pick_string(row, SECTOR_ALIASES),
        dividend_yield: pick_number(row, YIELD_ALIASES),
        market_cap: pick_number(row, MARKET_CAP_ALIASES),
        historical: pick_historical(row),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_price_precedence_first_non_null_wins() {
        let row = json!({"ticker": "AAPL", "price": 190.0, "close": 188.0});
        let norm = normalize_row(&row).unwrap();
        assert_eq!(norm.price, Some(190.0));

        let row = json!({"ticker": "AAPL", "close": 188.0, "last": 187.0});
        assert_eq!(normalize_row(&row).unwrap().price, Some(188.0));
    }

    #[test]
    fn test_non_finite_becomes_none() {
        let row = json!({"ticker": "AAPL", "rsi": null, "rsi14": 55.0});
        assert_eq!(normalize_row(&row).unwrap().rsi, Some(55.0));

        // serde_json has no NaN literal; a string where a number should be
        // is just as non-numeric
        let row = json!({"ticker": "AAPL", "ma50": "broken"});
        assert_eq!(normalize_row(&row).unwrap().ma50, None);
    }

    #[test]
    fn test_historical_numeric_array_preferred() {
        let row = json!({
            "ticker": "AAPL",
            "historical": [100.0, 101.0, 102.0],
            "ohlc": {"close": [1.0, 2.0]}
        });
        assert_eq!(normalize_row(&row).unwrap().historical, vec![100.0, 101.0, 102.0]);
    }

    #[test]
    fn test_historical_array_of_objects() {
        let row = json!({
            "ticker": "AAPL",
            "historical": [{"close": 10.0}, {"close": 11.0}]
        });
        assert_eq!(normalize_row(&row).unwrap().historical, vec![10.0, 11.0]);
    }

    #[test]
    fn test_historical_nested_ohlc_fallback() {
        let row = json!({"ticker": "AAPL", "ohlc": {"close": [5.0, 6.0, 7.0]}});
        assert_eq!(normalize_row(&row).unwrap().historical, vec![5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_historical_descending_is_reversed_once() {
        let row = json!({"ticker": "AAPL", "historical": [150.0, 140.0, 130.0]});
        assert_eq!(normalize_row(&row).unwrap().historical, vec![130.0, 140.0, 150.0]);
    }

    #[test]
    fn test_row_without_ticker_dropped() {
        let row = json!({"price": 10.0});
        assert!(normalize_row(&row).is_none());
    }

    #[test]
    fn test_ticker_is_case_normalized() {
        let row = json!({"ticker": " aapl "});
        assert_eq!(normalize_row(&row).unwrap().ticker, "AAPL");
    }
}
