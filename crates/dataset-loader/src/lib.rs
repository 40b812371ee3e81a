pub mod normalize;

pub use normalize::normalize_row;

use market_cache::{TtlCache, DATASET_TTL_SECS};
use serde_json::Value;
use stats_core::{normalize_ticker, Clock, IndicatorRow};
use std::path::PathBuf;
use std::sync::Arc;

const DEFAULT_DATASET_PATH: &str = "sp500_indicators.json";
const DATASET_CACHE_KEY: &str = "dataset";

/// Loads the local pre-computed indicator dataset, the fallback of
/// last resort when no live provider answers. The file is read and
/// normalized at most once per dataset TTL; a missing or malformed
/// file is a silent miss (logged), never a hard failure.
pub struct DatasetLoader {
    path: PathBuf,
    cache: TtlCache<Arc<Vec<IndicatorRow>>>,
}

impl DatasetLoader {
    pub fn new(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: path.into(),
            cache: TtlCache::new(DATASET_TTL_SECS, clock),
        }
    }

    /// Path from `INDICATOR_DATASET_PATH`, defaulting to the bundled
    /// dataset file name in the working directory.
    pub fn from_env(clock: Arc<dyn Clock>) -> Self {
        let path = std::env::var("INDICATOR_DATASET_PATH")
            .unwrap_or_else(|_| DEFAULT_DATASET_PATH.to_string());
        Self::new(path, clock)
    }

    /// All normalized rows, or `None` when the dataset is unavailable.
    pub fn rows(&self) -> Option<Arc<Vec<IndicatorRow>>> {
        if let Some(rows) = self.cache.get(DATASET_CACHE_KEY) {
            return Some(rows);
        }

        let rows = Arc::new(self.load()?);
        self.cache.insert(DATASET_CACHE_KEY, Arc::clone(&rows));
        Some(rows)
    }

    /// O(n) lookup on the case-normalized ticker.
    pub fn find_by_ticker(&self, ticker: &str) -> Option<IndicatorRow> {
        let key = normalize_ticker(ticker);
        self.rows()?.iter().find(|r| r.ticker == key).cloned()
    }

    /// Every ticker the dataset knows, for resolver universe building.
    pub fn tickers(&self) -> Vec<String> {
        self.rows()
            .map(|rows| rows.iter().map(|r| r.ticker.clone()).collect())
            .unwrap_or_default()
    }

    fn load(&self) -> Option<Vec<IndicatorRow>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("indicator dataset unreadable at {:?}: {}", self.path, e);
                return None;
            }
        };

        let parsed: Value = match serde_json::from_str(&raw) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("indicator dataset malformed at {:?}: {}", self.path, e);
                return None;
            }
        };

        let rows: Vec<IndicatorRow> = parsed
            .as_array()
            .map(|arr| arr.iter().filter_map(normalize_row).collect())
            .unwrap_or_default();

        if rows.is_empty() {
            tracing::warn!("indicator dataset at {:?} yielded no rows", self.path);
            return None;
        }

        tracing::debug!("loaded {} indicator rows from {:?}", rows.len(), self.path);
        Some(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stats_core::SystemClock;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("dataset_loader_{}_{}.json", name, std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_and_find() {
        let path = write_temp(
            "basic",
            r#"[
                {"ticker": "aapl", "price": 190.0, "historical": [1.0, 2.0, 3.0]},
                {"symbol": "MSFT", "close": 420.0}
            ]"#,
        );
        let loader = DatasetLoader::new(&path, Arc::new(SystemClock));

        let row = loader.find_by_ticker(" AAPL ").unwrap();
        assert_eq!(row.price, Some(190.0));
        assert_eq!(row.historical, vec![1.0, 2.0, 3.0]);

        // symbol alias and close alias both normalize
        let row = loader.find_by_ticker("msft").unwrap();
        assert_eq!(row.price, Some(420.0));

        assert!(loader.find_by_ticker("ZZZZ").is_none());
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file_is_silent_none() {
        let loader = DatasetLoader::new("/nonexistent/nowhere.json", Arc::new(SystemClock));
        assert!(loader.rows().is_none());
        assert!(loader.find_by_ticker("AAPL").is_none());
    }

    #[test]
    fn test_malformed_file_is_silent_none() {
        let path = write_temp("malformed", "{ not json");
        let loader = DatasetLoader::new(&path, Arc::new(SystemClock));
        assert!(loader.rows().is_none());
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_rows_cached_between_calls() {
        let path = write_temp("cached", r#"[{"ticker": "AAPL"}]"#);
        let loader = DatasetLoader::new(&path, Arc::new(SystemClock));

        assert_eq!(loader.rows().unwrap().len(), 1);
        // File deleted, but the cached load still serves within the TTL
        std::fs::remove_file(&path).ok();
        assert_eq!(loader.rows().unwrap().len(), 1);
    }
}
