use crate::{Candle, ProviderKind, Quote, StatsError};
use async_trait::async_trait;

/// A single upstream market-data source. Providers implement the
/// subset of methods their API supports; the defaults return "no data"
/// so callers can walk a provider list without caring which methods a
/// given source actually backs.
///
/// Contract: `Ok(None)` / `Ok(vec![])` means the source answered but
/// had nothing for this symbol (an upstream "no data" sentinel counts).
/// `Err` means the source itself failed (transport, non-2xx, parse).
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    fn kind(&self) -> ProviderKind;

    async fn quote(&self, _symbol: &str) -> Result<Option<Quote>, StatsError> {
        Ok(None)
    }

    /// 52-week high from the provider's fundamentals/metrics endpoint.
    async fn high52(&self, _symbol: &str) -> Result<Option<f64>, StatsError> {
        Ok(None)
    }

    /// Daily candles, ascending, capped to the provider recency window.
    async fn daily_candles(&self, _symbol: &str) -> Result<Vec<Candle>, StatsError> {
        Ok(Vec::new())
    }
}
