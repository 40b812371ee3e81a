use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV daily candle, normalized from whatever shape a provider returns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Live quote. Only `price` is guaranteed when a quote resolves;
/// the change fields depend on what the upstream returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub price: f64,
    #[serde(default)]
    pub prev_close: Option<f64>,
    #[serde(default)]
    pub change: Option<f64>,
    #[serde(default)]
    pub change_percent: Option<f64>,
}

/// Trend classification derived from momentum or MA deviation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Up => "up",
            Trend::Down => "down",
            Trend::Flat => "flat",
        }
    }
}

/// One reconciled snapshot per ticker. Every field is optional:
/// `None` means "could not be determined", never zero. Derived fields
/// are recomputed per request and never persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuickStats {
    pub ticker: String,
    pub price: Option<f64>,
    pub high52: Option<f64>,
    pub rsi: Option<f64>,
    pub ma50: Option<f64>,
    pub pct_vs_ma50: Option<f64>,
    pub trend: Option<Trend>,
}

impl QuickStats {
    /// True when no field at all could be resolved.
    pub fn is_empty(&self) -> bool {
        self.price.is_none()
            && self.high52.is_none()
            && self.rsi.is_none()
            && self.ma50.is_none()
            && self.pct_vs_ma50.is_none()
            && self.trend.is_none()
    }
}

/// Canonical dataset record after legacy-alias normalization.
/// `historical` is always ascending (oldest first), possibly empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub ticker: String,
    pub price: Option<f64>,
    pub high52: Option<f64>,
    pub rsi: Option<f64>,
    pub ma50: Option<f64>,
    pub pct_vs_ma50: Option<f64>,
    pub company: Option<String>,
    pub sector: Option<String>,
    pub dividend_yield: Option<f64>,
    pub market_cap: Option<f64>,
    pub historical: Vec<f64>,
}

/// How a ticker resolution was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchedBy {
    Symbol,
    Company,
    Alias,
    Cookie,
    ClientHint,
}

/// Closed confidence enumeration: reflects how the match was found,
/// not a probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    None,
    Contextual,
    Fuzzy,
    Company,
    Symbol,
}

impl Confidence {
    pub fn as_f64(&self) -> f64 {
        match self {
            Confidence::None => 0.0,
            Confidence::Contextual => 0.25,
            Confidence::Fuzzy => 0.5,
            Confidence::Company => 0.75,
            Confidence::Symbol => 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerResolutionResult {
    pub best_ticker: Option<String>,
    pub all_tickers: Vec<String>,
    pub matched_by: Option<MatchedBy>,
    pub confidence: Confidence,
    pub reason: String,
}

impl TickerResolutionResult {
    pub fn no_match(reason: impl Into<String>) -> Self {
        Self {
            best_ticker: None,
            all_tickers: Vec::new(),
            matched_by: None,
            confidence: Confidence::None,
            reason: reason.into(),
        }
    }
}

/// One line of a built portfolio
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allocation {
    pub ticker: String,
    pub dollars: f64,
    pub est_shares: Option<f64>,
    pub sector: Option<String>,
    pub notes: Option<String>,
}

/// Known upstream market-data providers, in default priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Finnhub,
    TwelveData,
    Polygon,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Finnhub => "finnhub",
            ProviderKind::TwelveData => "twelvedata",
            ProviderKind::Polygon => "polygon",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "finnhub" => Some(ProviderKind::Finnhub),
            "twelvedata" | "twelve_data" | "12data" => Some(ProviderKind::TwelveData),
            "polygon" => Some(ProviderKind::Polygon),
            _ => None,
        }
    }

    /// Fixed default priority used when the caller expresses no preference.
    pub fn default_priority() -> &'static [ProviderKind] {
        &[
            ProviderKind::Finnhub,
            ProviderKind::TwelveData,
            ProviderKind::Polygon,
        ]
    }
}

/// Uppercase and trim a ticker for use as a cache / lookup key.
pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_ascii_uppercase()
}
