use crate::http_client;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use stats_core::{Candle, MarketDataSource, ProviderKind, Quote, StatsError};

const BASE_URL: &str = "https://api.twelvedata.com";

/// TwelveData: quote and daily time series. Numbers arrive as strings
/// and the series arrives newest-first, so everything is parsed and
/// re-ordered to the common ascending shape here.
#[derive(Clone)]
pub struct TwelveDataClient {
    api_key: String,
    client: Client,
}

impl TwelveDataClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: http_client(),
        }
    }

    /// Built from `TWELVEDATA_API_KEY`; `None` when the key is absent.
    pub fn from_env() -> Option<Self> {
        std::env::var("TWELVEDATA_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .map(Self::new)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, StatsError> {
        let url = format!("{}/{}", BASE_URL, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| StatsError::SourceUnavailable(format!("twelvedata: {}", e)))?;

        if !response.status().is_success() {
            return Err(StatsError::SourceUnavailable(format!(
                "twelvedata HTTP {} on {}",
                response.status(),
                path
            )));
        }

        response
            .json()
            .await
            .map_err(|e| StatsError::SourceUnavailable(format!("twelvedata parse: {}", e)))
    }
}

fn parse_num(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_time(raw: &str) -> Option<DateTime<Utc>> {
    // Daily bars come as "2024-06-03", intraday as "2024-06-03 15:30:00"
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[async_trait]
impl MarketDataSource for TwelveDataClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::TwelveData
    }

    async fn quote(&self, symbol: &str) -> Result<Option<Quote>, StatsError> {
        let body: QuoteResponse = self
            .get_json("quote", &[("symbol", symbol.to_string())])
            .await?;

        // An error payload still comes back as 200 with a status field
        if body.status.as_deref() == Some("error") {
            return Ok(None);
        }

        let price = match body.close.as_deref().and_then(parse_num) {
            Some(p) if p != 0.0 => p,
            _ => return Ok(None),
        };

        Ok(Some(Quote {
            price,
            prev_close: body.previous_close.as_deref().and_then(parse_num),
            change: body.change.as_deref().and_then(parse_num),
            change_percent: body.percent_change.as_deref().and_then(parse_num),
        }))
    }

    async fn daily_candles(&self, symbol: &str) -> Result<Vec<Candle>, StatsError> {
        let body: TimeSeriesResponse = self
            .get_json(
                "time_series",
                &[
                    ("symbol", symbol.to_string()),
                    ("interval", "1day".to_string()),
                    ("outputsize", "252".to_string()),
                ],
            )
            .await?;

        if body.status.as_deref() == Some("error") {
            return Ok(Vec::new());
        }

        let mut candles: Vec<Candle> = body
            .values
            .unwrap_or_default()
            .into_iter()
            .filter_map(|v| {
                let time = parse_time(&v.datetime)?;
                let close = parse_num(&v.close)?;
                Some(Candle {
                    time,
                    open: v.open.as_deref().and_then(parse_num).unwrap_or(close),
                    high: v.high.as_deref().and_then(parse_num).unwrap_or(close),
                    low: v.low.as_deref().and_then(parse_num).unwrap_or(close),
                    close,
                    volume: v.volume.as_deref().and_then(parse_num).unwrap_or(0.0),
                })
            })
            .collect();

        // Newest-first upstream; normalize to ascending
        candles.sort_by_key(|c| c.time);
        Ok(candles)
    }
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    close: Option<String>,
    #[serde(default)]
    previous_close: Option<String>,
    #[serde(default)]
    change: Option<String>,
    #[serde(default)]
    percent_change: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TimeSeriesResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    values: Option<Vec<TimeSeriesValue>>,
}

#[derive(Debug, Deserialize)]
struct TimeSeriesValue {
    datetime: String,
    close: String,
    #[serde(default)]
    open: Option<String>,
    #[serde(default)]
    high: Option<String>,
    #[serde(default)]
    low: Option<String>,
    #[serde(default)]
    volume: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_num_rejects_garbage() {
        assert_eq!(parse_num("191.25"), Some(191.25));
        assert_eq!(parse_num(" 3.5 "), Some(3.5));
        assert_eq!(parse_num("NaN"), None);
        assert_eq!(parse_num("n/a"), None);
    }

    #[test]
    fn test_parse_time_daily_and_intraday() {
        assert!(parse_time("2024-06-03").is_some());
        assert!(parse_time("2024-06-03 15:30:00").is_some());
        assert!(parse_time("yesterday").is_none());
    }
}
