use crate::{FinnhubClient, PolygonClient, TwelveDataClient};
use futures_util::future::join_all;
use stats_core::{normalize_ticker, MarketDataSource, ProviderKind, Quote, StatsError};
use std::collections::HashMap;
use std::sync::Arc;

/// Order a provider list: the preferred provider first when it is both
/// a valid name and actually configured, then the remaining configured
/// providers in the fixed default priority.
pub fn provider_order(
    providers: &[Arc<dyn MarketDataSource>],
    preferred: Option<&str>,
) -> Vec<Arc<dyn MarketDataSource>> {
    let preferred_kind = preferred.and_then(ProviderKind::from_name);
    let mut ordered: Vec<Arc<dyn MarketDataSource>> = Vec::with_capacity(providers.len());

    if let Some(kind) = preferred_kind {
        if let Some(p) = providers.iter().find(|p| p.kind() == kind) {
            ordered.push(Arc::clone(p));
        }
    }

    for kind in ProviderKind::default_priority() {
        if Some(*kind) == preferred_kind {
            continue;
        }
        if let Some(p) = providers.iter().find(|p| p.kind() == *kind) {
            ordered.push(Arc::clone(p));
        }
    }

    ordered
}

/// The set of configured live providers plus the batch progressive-fill
/// resolution over them.
#[derive(Clone, Default)]
pub struct ProviderSet {
    providers: Vec<Arc<dyn MarketDataSource>>,
}

impl ProviderSet {
    pub fn new(providers: Vec<Arc<dyn MarketDataSource>>) -> Self {
        Self { providers }
    }

    /// Build from environment keys. Providers without a key are simply
    /// not constructed; an empty set is legal and only surfaces as
    /// `ConfigurationMissing` when live resolution is explicitly asked for.
    pub fn from_env() -> Self {
        let mut providers: Vec<Arc<dyn MarketDataSource>> = Vec::new();
        if let Some(c) = FinnhubClient::from_env() {
            providers.push(Arc::new(c));
        }
        if let Some(c) = TwelveDataClient::from_env() {
            providers.push(Arc::new(c));
        }
        if let Some(c) = PolygonClient::from_env() {
            providers.push(Arc::new(c));
        }
        tracing::info!(
            "Configured {} live provider(s): {:?}",
            providers.len(),
            providers.iter().map(|p| p.kind().as_str()).collect::<Vec<_>>()
        );
        Self { providers }
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn providers(&self) -> &[Arc<dyn MarketDataSource>] {
        &self.providers
    }

    pub fn ordered(&self, preferred: Option<&str>) -> Vec<Arc<dyn MarketDataSource>> {
        provider_order(&self.providers, preferred)
    }

    /// Resolve quotes for a batch of tickers by walking providers in
    /// priority order. A provider that resolves only some of the batch
    /// still contributes those fills; the rest move on to the next
    /// provider. Per-ticker requests against one provider run
    /// concurrently with independent failure isolation.
    ///
    /// This is the one place where "no provider at all" is a hard,
    /// actionable error rather than a degraded field.
    pub async fn resolve_quotes_batch(
        &self,
        tickers: &[String],
        preferred: Option<&str>,
    ) -> Result<QuoteBatch, StatsError> {
        if self.providers.is_empty() {
            return Err(StatsError::ConfigurationMissing(
                "no market data provider is configured".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        let mut unresolved: Vec<String> = tickers
            .iter()
            .map(|t| normalize_ticker(t))
            .filter(|t| !t.is_empty() && seen.insert(t.clone()))
            .collect();
        let mut resolved: HashMap<String, Quote> = HashMap::new();

        for provider in self.ordered(preferred) {
            if unresolved.is_empty() {
                break;
            }

            let fetches = unresolved.iter().map(|ticker| {
                let provider = Arc::clone(&provider);
                let ticker = ticker.clone();
                async move {
                    let result = provider.quote(&ticker).await;
                    (ticker, result)
                }
            });

            let mut still_unresolved = Vec::new();
            for (ticker, result) in join_all(fetches).await {
                match result {
                    Ok(Some(quote)) => {
                        resolved.insert(ticker, quote);
                    }
                    Ok(None) => still_unresolved.push(ticker),
                    Err(e) => {
                        tracing::warn!(
                            "{} quote failed on {}: {}",
                            ticker,
                            provider.kind().as_str(),
                            e
                        );
                        still_unresolved.push(ticker);
                    }
                }
            }
            unresolved = still_unresolved;
        }

        Ok(QuoteBatch {
            quotes: resolved,
            unresolved,
        })
    }
}

/// Outcome of a batch quote resolution: what filled, and what no
/// provider could answer.
#[derive(Debug, Default)]
pub struct QuoteBatch {
    pub quotes: HashMap<String, Quote>,
    pub unresolved: Vec<String>,
}
