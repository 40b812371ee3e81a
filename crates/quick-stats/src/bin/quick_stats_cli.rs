//! quick-stats-cli: resolve free text to a ticker and print its
//! one-line quick stats summary.
//!
//! Usage:
//!   cargo run -p quick-stats -- "how is apple doing"
//!   cargo run -p quick-stats -- TSLA MSFT

use quick_stats::QuickStatsService;
use ticker_resolver::{ResolveContext, TickerResolver};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        anyhow::bail!("usage: quick-stats-cli <free text or tickers>...");
    }

    let service = QuickStatsService::from_env();
    let rows = service.dataset().rows().map(|r| r.as_ref().clone()).unwrap_or_default();
    let resolver = TickerResolver::new(&rows);

    for query in &args {
        let resolution = resolver.resolve(query, &ResolveContext::default());
        match &resolution.best_ticker {
            Some(ticker) => {
                tracing::info!(
                    "\"{}\" -> {} ({:?}, confidence {})",
                    query,
                    ticker,
                    resolution.matched_by,
                    resolution.confidence.as_f64()
                );
                println!("{}", service.retrieve_price_features(ticker).await);
            }
            None => {
                println!("{}: no ticker found ({})", query, resolution.reason);
            }
        }
    }

    Ok(())
}
