use crate::{http_client, Resolution};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use stats_core::{Candle, MarketDataSource, ProviderKind, Quote, StatsError};

const BASE_URL: &str = "https://finnhub.io/api/v1";

/// Finnhub: quote, stock metrics (52-week high) and candle history.
/// Quote prices of exactly 0.0 are Finnhub's "unknown symbol" sentinel
/// and are treated as no data, not as a price.
#[derive(Clone)]
pub struct FinnhubClient {
    api_key: String,
    client: Client,
}

impl FinnhubClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: http_client(),
        }
    }

    /// Built from `FINNHUB_API_KEY`; `None` when the key is absent.
    pub fn from_env() -> Option<Self> {
        std::env::var("FINNHUB_API_KEY")
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
            .query(&[("token", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| StatsError::SourceUnavailable(format!("finnhub: {}", e)))?;

        if !response.status().is_success() {
            return Err(StatsError::SourceUnavailable(format!(
                "finnhub HTTP {} on {}",
                response.status(),
                path
            )));
        }

        response
            .json()
            .await
            .map_err(|e| StatsError::SourceUnavailable(format!("finnhub parse: {}", e)))
    }

    /// Candle history at the given resolution, bounded by the
    /// per-resolution lookback window. Ascending timestamps.
    pub async fn candles(
        &self,
        symbol: &str,
        resolution: Resolution,
    ) -> Result<Vec<Candle>, StatsError> {
        let to = Utc::now();
        let from = to - resolution.lookback();
        let res_param = match resolution {
            Resolution::Daily => "D",
            Resolution::Minute => "1",
        };

        let body: CandleResponse = self
            .get_json(
                "stock/candle",
                &[
                    ("symbol", symbol.to_string()),
                    ("resolution", res_param.to_string()),
                    ("from", from.timestamp().to_string()),
                    ("to", to.timestamp().to_string()),
                ],
            )
            .await?;

        // "no_data" status is a valid empty answer, not a failure
        if body.s.as_deref() != Some("ok") {
            return Ok(Vec::new());
        }

        let mut candles = Vec::with_capacity(body.t.len());
        for (i, &ts) in body.t.iter().enumerate() {
            let time = match DateTime::from_timestamp(ts, 0) {
                Some(t) => t,
                None => continue,
            };
            candles.push(Candle {
                time,
                open: body.o.get(i).copied().unwrap_or(f64::NAN),
                high: body.h.get(i).copied().unwrap_or(f64::NAN),
                low: body.l.get(i).copied().unwrap_or(f64::NAN),
                close: match body.c.get(i).copied() {
                    Some(c) if c.is_finite() => c,
                    _ => continue,
                },
                volume: body.v.get(i).copied().unwrap_or(0.0),
            });
        }
        candles.sort_by_key(|c| c.time);
        Ok(candles)
    }
}

#[async_trait]
impl MarketDataSource for FinnhubClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Finnhub
    }

    async fn quote(&self, symbol: &str) -> Result<Option<Quote>, StatsError> {
        let body: QuoteResponse = self
            .get_json("quote", &[("symbol", symbol.to_string())])
            .await?;

        match body.c {
            Some(price) if price.is_finite() && price != 0.0 => Ok(Some(Quote {
                price,
                prev_close: body.pc.filter(|p| p.is_finite() && *p != 0.0),
                change: body.d,
                change_percent: body.dp,
            })),
            _ => Ok(None),
        }
    }

    async fn high52(&self, symbol: &str) -> Result<Option<f64>, StatsError> {
        let body: MetricResponse = self
            .get_json(
                "stock/metric",
                &[
                    ("symbol", symbol.to_string()),
                    ("metric", "all".to_string()),
                ],
            )
            .await?;

        Ok(body
            .metric
            .and_then(|m| m.week52_high)
            .filter(|h| h.is_finite() && *h > 0.0))
    }

    async fn daily_candles(&self, symbol: &str) -> Result<Vec<Candle>, StatsError> {
        self.candles(symbol, Resolution::Daily).await
    }
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    c: Option<f64>,
    #[serde(default)]
    pc: Option<f64>,
    #[serde(default)]
    d: Option<f64>,
    #[serde(default)]
    dp: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct MetricResponse {
    metric: Option<MetricFields>,
}

#[derive(Debug, Deserialize)]
struct MetricFields {
    #[serde(rename = "52WeekHigh")]
    week52_high: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CandleResponse {
    s: Option<String>,
    #[serde(default)]
    t: Vec<i64>,
    #[serde(default)]
    o: Vec<f64>,
    #[serde(default)]
    h: Vec<f64>,
    #[serde(default)]
    l: Vec<f64>,
    #[serde(default)]
    c: Vec<f64>,
    #[serde(default)]
    v: Vec<f64>,
}
