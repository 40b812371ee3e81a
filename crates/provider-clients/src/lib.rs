pub mod finnhub;
pub mod order;
pub mod polygon;
pub mod twelvedata;

pub use finnhub::FinnhubClient;
pub use order::{provider_order, ProviderSet};
pub use polygon::PolygonClient;
pub use twelvedata::TwelveDataClient;

use chrono::Duration;

/// Daily candle history is capped to ~252 trading days of lookback.
pub const DAILY_LOOKBACK_DAYS: i64 = 400;

/// Minute-bar history is capped to roughly one trading session.
pub const MINUTE_LOOKBACK_HOURS: i64 = 7;

/// Per-request timeout applied to every provider HTTP call. A timeout
/// is a plain failure; the caller moves on to the next provider rather
/// than retrying inline.
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Candle resolution requested from a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Daily,
    Minute,
}

impl Resolution {
    /// How far back a request at this resolution may reach.
    pub fn lookback(&self) -> Duration {
        match self {
            Resolution::Daily => Duration::days(DAILY_LOOKBACK_DAYS),
            Resolution::Minute => Duration::hours(MINUTE_LOOKBACK_HOURS),
        }
    }
}

pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
