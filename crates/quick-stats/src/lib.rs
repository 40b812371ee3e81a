//! Per-ticker "quick stats" aggregation: reconciles live providers,
//! the per-kind caches, and the local indicator dataset into one
//! snapshot with fixed field-precedence rules. The aggregator never
//! errors; any source failing degrades only the fields it would have
//! supplied.

use dataset_loader::DatasetLoader;
use indicator_math::{
    force_ascending, momentum_pct, rsi, sma, trend_from_momentum, MOMENTUM_LOOKBACK, RSI_PERIOD,
};
use market_cache::{TtlCache, CANDLE_TTL_SECS, METRIC_TTL_SECS, QUOTE_TTL_SECS};
use provider_clients::ProviderSet;
use stats_core::{normalize_ticker, Clock, IndicatorRow, QuickStats, Quote, SystemClock};
use std::sync::Arc;

const MA_PERIOD: usize = 50;

pub struct QuickStatsService {
    providers: ProviderSet,
    dataset: Arc<DatasetLoader>,
    quote_cache: TtlCache<Quote>,
    metric_cache: TtlCache<f64>,
    candle_cache: TtlCache<Arc<Vec<f64>>>,
}

impl QuickStatsService {
    pub fn new(providers: ProviderSet, dataset: DatasetLoader, clock: Arc<dyn Clock>) -> Self {
        Self {
            providers,
            dataset: Arc::new(dataset),
            quote_cache: TtlCache::new(QUOTE_TTL_SECS, Arc::clone(&clock)),
            metric_cache: TtlCache::new(METRIC_TTL_SECS, Arc::clone(&clock)),
            candle_cache: TtlCache::new(CANDLE_TTL_SECS, clock),
        }
    }

    /// Providers from API-key env vars, dataset path from env, wall clock.
    pub fn from_env() -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self::new(
            ProviderSet::from_env(),
            DatasetLoader::from_env(Arc::clone(&clock)),
            clock,
        )
    }

    pub fn providers(&self) -> &ProviderSet {
        &self.providers
    }

    pub fn dataset(&self) -> &DatasetLoader {
        &self.dataset
    }

    /// One reconciled snapshot. Field precedence:
    /// price: live quote > dataset; high52: live metrics > dataset;
    /// closes: live candles > dataset historical; ma50/rsi: dataset
    /// value > derived from closes; pct_vs_ma50: always recomputed from
    /// the resolved price and MA50, dataset value only as last resort;
    /// trend: momentum over closes with MA-deviation fallback, absent
    /// when neither input resolves.
    pub async fn get_quick_stats(&self, ticker: &str) -> QuickStats {
        let key = normalize_ticker(ticker);

        let (quote, live_high52, live_closes, row) = tokio::join!(
            self.cached_quote(&key),
            self.cached_high52(&key),
            self.cached_closes(&key),
            self.dataset_lookup(&key),
        );

        let price = quote
            .map(|q| q.price)
            .or_else(|| row.as_ref().and_then(|r| r.price));

        let high52 = live_high52.or_else(|| row.as_ref().and_then(|r| r.high52));

        let closes: Vec<f64> = if !live_closes.is_empty() {
            live_closes
        } else {
            row.as_ref().map(|r| r.historical.clone()).unwrap_or_default()
        };

        let ma50 = row
            .as_ref()
            .and_then(|r| r.ma50)
            .or_else(|| sma(&closes, MA_PERIOD));

        let rsi_value = row
            .as_ref()
            .and_then(|r| r.rsi)
            .or_else(|| rsi(&closes, RSI_PERIOD));

        // Live price must reflect in the percentage even when the MA50
        // came from the static dataset, so this is recomputed rather
        // than read from the row whenever possible.
        let pct_vs_ma50 = match (price, ma50) {
            (Some(p), Some(ma)) if ma != 0.0 => Some((p / ma - 1.0) * 100.0),
            _ => row.as_ref().and_then(|r| r.pct_vs_ma50),
        };

        let momentum = momentum_pct(&closes, MOMENTUM_LOOKBACK);
        // No momentum and no MA deviation means nothing to classify: the
        // field stays absent so a fully unresolved ticker reads as empty
        // rather than flat.
        let trend = (momentum.is_some() || pct_vs_ma50.is_some())
            .then(|| trend_from_momentum(momentum, pct_vs_ma50));

        QuickStats {
            ticker: key,
            price,
            high52,
            rsi: rsi_value,
            ma50,
            pct_vs_ma50,
            trend,
        }
    }

    /// Human-readable one-line summary of whichever fields resolved,
    /// comma-joined. A fixed sentinel string when nothing resolved.
    pub async fn retrieve_price_features(&self, ticker: &str) -> String {
        let stats = self.get_quick_stats(ticker).await;
        if stats.is_empty() {
            return format!("no data available for {}", stats.ticker);
        }

        let mut parts = Vec::new();
        if let Some(p) = stats.price {
            parts.push(format!("price ${:.2}", p));
        }
        if let Some(h) = stats.high52 {
            parts.push(format!("52w high ${:.2}", h));
        }
        if let Some(r) = stats.rsi {
            parts.push(format!("RSI {:.1}", r));
        }
        if let Some(m) = stats.ma50 {
            parts.push(format!("MA50 {:.2}", m));
        }
        if let Some(pct) = stats.pct_vs_ma50 {
            parts.push(format!("{:+.1}% vs MA50", pct));
        }
        if let Some(t) = stats.trend {
            parts.push(format!("trend {}", t.as_str()));
        }

        format!("{}: {}", stats.ticker, parts.join(", "))
    }

    /// Recent close series for charting or derivation: live candles
    /// first, then dataset historical, then a single-point series from
    /// the last known price, else empty.
    pub async fn get_recent_closes(&self, ticker: &str) -> Vec<f64> {
        let key = normalize_ticker(ticker);

        let live = self.cached_closes(&key).await;
        if !live.is_empty() {
            return live;
        }

        if let Some(row) = self.dataset_lookup(&key).await {
            if !row.historical.is_empty() {
                return row.historical;
            }
            if let Some(price) = row.price {
                return vec![price];
            }
        }

        if let Some(quote) = self.cached_quote(&key).await {
            return vec![quote.price];
        }

        Vec::new()
    }

    /// Dataset row passthrough for batch consumers (screener).
    pub fn dataset_row(&self, ticker: &str) -> Option<IndicatorRow> {
        self.dataset.find_by_ticker(ticker)
    }

    /// A cold dataset cache reads the file from disk, so the lookup
    /// runs on the blocking pool and can overlap the live fetches.
    async fn dataset_lookup(&self, key: &str) -> Option<IndicatorRow> {
        let dataset = Arc::clone(&self.dataset);
        let ticker = key.to_string();
        match tokio::task::spawn_blocking(move || dataset.find_by_ticker(&ticker)).await {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!("dataset lookup for {} failed: {}", key, e);
                None
            }
        }
    }

    async fn cached_quote(&self, key: &str) -> Option<Quote> {
        if let Some(quote) = self.quote_cache.get(key) {
            return Some(quote);
        }

        for provider in self.providers.ordered(None) {
            match provider.quote(key).await {
                Ok(Some(quote)) => {
                    self.quote_cache.insert(key, quote.clone());
                    return Some(quote);
                }
                Ok(None) => continue,
                Err(e) => {
                    tracing::debug!("{} quote via {} failed: {}", key, provider.kind().as_str(), e);
                }
            }
        }
        None
    }

    async fn cached_high52(&self, key: &str) -> Option<f64> {
        if let Some(high) = self.metric_cache.get(key) {
            return Some(high);
        }

        for provider in self.providers.ordered(None) {
            match provider.high52(key).await {
                Ok(Some(high)) => {
                    self.metric_cache.insert(key, high);
                    return Some(high);
                }
                Ok(None) => continue,
                Err(e) => {
                    tracing::debug!(
                        "{} 52w high via {} failed: {}",
                        key,
                        provider.kind().as_str(),
                        e
                    );
                }
            }
        }
        None
    }

    async fn cached_closes(&self, key: &str) -> Vec<f64> {
        if let Some(closes) = self.candle_cache.get(key) {
            return closes.as_ref().clone();
        }

        for provider in self.providers.ordered(None) {
            match provider.daily_candles(key).await {
                Ok(candles) if !candles.is_empty() => {
                    let mut closes: Vec<f64> =
                        candles.iter().map(|c| c.close).filter(|c| c.is_finite()).collect();
                    force_ascending(&mut closes);
                    self.candle_cache.insert(key, Arc::new(closes.clone()));
                    return closes;
                }
                Ok(_) => continue,
                Err(e) => {
                    tracing::debug!(
                        "{} candles via {} failed: {}",
                        key,
                        provider.kind().as_str(),
                        e
                    );
                }
            }
        }
        Vec::new()
    }
}
