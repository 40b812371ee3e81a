use crate::{http_client, DAILY_LOOKBACK_DAYS};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use stats_core::{Candle, MarketDataSource, ProviderKind, Quote, StatsError};

const BASE_URL: &str = "https://api.polygon.io";

/// Polygon: previous-close quote and daily aggregates.
/// Aggregate timestamps are epoch milliseconds.
#[derive(Clone)]
pub struct PolygonClient {
    api_key: String,
    client: Client,
}

impl PolygonClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: http_client(),
        }
    }

    /// Built from `POLYGON_API_KEY`; `None` when the key is absent.
    pub fn from_env() -> Option<Self> {
        std::env::var("POLYGON_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .map(Self::new)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, StatsError> {
        let response = self
            .client
            .get(url)
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| StatsError::SourceUnavailable(format!("polygon: {}", e)))?;

        if !response.status().is_success() {
            return Err(StatsError::SourceUnavailable(format!(
                "polygon HTTP {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| StatsError::SourceUnavailable(format!("polygon parse: {}", e)))
    }
}

#[async_trait]
impl MarketDataSource for PolygonClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Polygon
    }

    /// Polygon has no single live-quote endpoint on the basic plan;
    /// previous close is the best-effort price.
    async fn quote(&self, symbol: &str) -> Result<Option<Quote>, StatsError> {
        let url = format!("{}/v2/aggs/ticker/{}/prev", BASE_URL, symbol);
        let body: AggregateResponse = self.get_json(&url).await?;

        Ok(body
            .results
            .into_iter()
            .next()
            .filter(|r| r.c.is_finite() && r.c != 0.0)
            .map(|r| Quote {
                price: r.c,
                prev_close: None,
                change: None,
                change_percent: None,
            }))
    }

    async fn daily_candles(&self, symbol: &str) -> Result<Vec<Candle>, StatsError> {
        let to = Utc::now();
        let from = to - Duration::days(DAILY_LOOKBACK_DAYS);
        let url = format!(
            "{}/v2/aggs/ticker/{}/range/1/day/{}/{}",
            BASE_URL,
            symbol,
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d")
        );

        let body: AggregateResponse = self.get_json(&url).await?;

        let mut candles: Vec<Candle> = body
            .results
            .into_iter()
            .filter_map(|r| {
                let time = DateTime::from_timestamp_millis(r.t)?;
                r.c.is_finite().then_some(Candle {
                    time,
                    open: r.o,
                    high: r.h,
                    low: r.l,
                    close: r.c,
                    volume: r.v,
                })
            })
            .collect();
        candles.sort_by_key(|c| c.time);
        Ok(candles)
    }
}

#[derive(Debug, Deserialize)]
struct AggregateResponse {
    #[serde(default)]
    results: Vec<AggregateResult>,
}

#[derive(Debug, Deserialize)]
struct AggregateResult {
    t: i64,
    #[serde(default)]
    o: f64,
    #[serde(default)]
    h: f64,
    #[serde(default)]
    l: f64,
    c: f64,
    #[serde(default)]
    v: f64,
}
