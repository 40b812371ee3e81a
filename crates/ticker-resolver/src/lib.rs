//! Free text -> canonical ticker resolution.
//!
//! Strict priority pipeline, short-circuiting at the first success:
//! explicit symbol tokens beat company-name mentions, which beat stale
//! session context. Ambiguity resolves toward the most recent and most
//! explicit signal.

pub mod names;
pub mod symbols;

use names::{build_alias_table, build_name_table, NameMatch};
use stats_core::{
    normalize_ticker, Confidence, IndicatorRow, MatchedBy, TickerResolutionResult,
};
use std::collections::{HashMap, HashSet};

/// Session context consulted only when neither a symbol nor a company
/// name resolves: a cookie-stored prior ticker, then a client hint.
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    pub cookie_ticker: Option<String>,
    pub client_hint: Option<String>,
}

pub struct TickerResolver {
    universe: HashSet<String>,
    name_table: Vec<(String, String)>,
    alias_table: HashMap<&'static str, &'static str>,
    /// When true, the first symbol occurrence wins instead of the last.
    prefer_first: bool,
}

impl TickerResolver {
    /// Build from dataset rows: the ticker universe comes from the rows
    /// plus the manual alias targets, the name table from company names
    /// with legal suffixes stripped.
    pub fn new(rows: &[IndicatorRow]) -> Self {
        let alias_table = build_alias_table();
        let mut universe: HashSet<String> =
            rows.iter().map(|r| r.ticker.clone()).collect();
        universe.extend(alias_table.values().map(|t| t.to_string()));

        Self {
            universe,
            name_table: build_name_table(rows),
            alias_table,
            prefer_first: false,
        }
    }

    pub fn prefer_first(mut self, prefer_first: bool) -> Self {
        self.prefer_first = prefer_first;
        self
    }

    pub fn universe(&self) -> &HashSet<String> {
        &self.universe
    }

    /// Resolve free text to a ticker. Never errors: a failed resolution
    /// is an explicit no-match result with the reason filled in.
    pub fn resolve(&self, text: &str, ctx: &ResolveContext) -> TickerResolutionResult {
        // 1. Explicit symbol tokens
        let found = symbols::scan(text, &self.universe);
        if !found.is_empty() {
            let best = if self.prefer_first {
                found.first()
            } else {
                found.last()
            };
            // Users often restate the ticker they actually mean at the
            // end of a sentence ("...about Tesla, I mean TSLA").
            if let Some(best) = best.cloned() {
                let mut seen = HashSet::new();
                let all_tickers: Vec<String> = found
                    .into_iter()
                    .filter(|t| seen.insert(t.clone()))
                    .collect();
                return TickerResolutionResult {
                    best_ticker: Some(best.clone()),
                    all_tickers,
                    matched_by: Some(MatchedBy::Symbol),
                    confidence: Confidence::Symbol,
                    reason: format!("explicit symbol token \"{}\"", best),
                };
            }
        }

        // 2. Company-name match over normalized word spans
        if let Some(m) = names::best_match(text, &self.name_table, &self.alias_table) {
            return self.from_name_match(m);
        }

        // 3. Contextual fallback: cookie before client hint
        if let Some(ticker) = self.contextual(ctx.cookie_ticker.as_deref()) {
            return TickerResolutionResult {
                best_ticker: Some(ticker.clone()),
                all_tickers: vec![ticker],
                matched_by: Some(MatchedBy::Cookie),
                confidence: Confidence::Contextual,
                reason: "no match in text; fell back to last session ticker".to_string(),
            };
        }
        if let Some(ticker) = self.contextual(ctx.client_hint.as_deref()) {
            return TickerResolutionResult {
                best_ticker: Some(ticker.clone()),
                all_tickers: vec![ticker],
                matched_by: Some(MatchedBy::ClientHint),
                confidence: Confidence::Contextual,
                reason: "no match in text; fell back to client-supplied hint".to_string(),
            };
        }

        TickerResolutionResult::no_match("no symbol, company name, or session context matched")
    }

    fn from_name_match(&self, m: NameMatch) -> TickerResolutionResult {
        let confidence = if m.score >= 0.9 {
            Confidence::Company
        } else {
            Confidence::Fuzzy
        };
        let matched_by = if m.via_alias {
            MatchedBy::Alias
        } else {
            MatchedBy::Company
        };
        tracing::debug!(
            "company match \"{}\" -> {} (score {:.2})",
            m.phrase,
            m.ticker,
            m.score
        );
        TickerResolutionResult {
            best_ticker: Some(m.ticker.clone()),
            all_tickers: vec![m.ticker],
            matched_by: Some(matched_by),
            confidence,
            reason: format!("company name \"{}\" (score {:.2})", m.phrase, m.score),
        }
    }

    fn contextual(&self, candidate: Option<&str>) -> Option<String> {
        let ticker = normalize_ticker(candidate?);
        self.universe.contains(&ticker).then_some(ticker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(ticker: &str, company: &str) -> IndicatorRow {
        IndicatorRow {
            ticker: ticker.to_string(),
            company: Some(company.to_string()),
            ..Default::default()
        }
    }

    fn resolver() -> TickerResolver {
        TickerResolver::new(&[
            row("AAPL", "Apple Inc."),
            row("TSLA", "Tesla, Inc."),
            row("AMZN", "Amazon.com, Inc."),
            row("MSFT", "Microsoft Corporation"),
            row("JPM", "JPMorgan Chase & Co."),
            row("ALL", "The Allstate Corporation"),
            row("BRK.B", "Berkshire Hathaway Inc."),
        ])
    }

    #[test]
    fn test_explicit_symbol_beats_company_mention() {
        let r = resolver().resolve("I love Amazon but buy 10 TSLA", &ResolveContext::default());
        assert_eq!(r.best_ticker.as_deref(), Some("TSLA"));
        assert_eq!(r.matched_by, Some(MatchedBy::Symbol));
        assert_eq!(r.confidence, Confidence::Symbol);
        assert_eq!(r.confidence.as_f64(), 1.0);
    }

    #[test]
    fn test_last_symbol_occurrence_wins_by_default() {
        let r = resolver().resolve("compare AAPL with MSFT", &ResolveContext::default());
        assert_eq!(r.best_ticker.as_deref(), Some("MSFT"));
        assert_eq!(r.all_tickers, vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn test_prefer_first_flips_selection() {
        let r = resolver()
            .prefer_first(true)
            .resolve("compare AAPL with MSFT", &ResolveContext::default());
        assert_eq!(r.best_ticker.as_deref(), Some("AAPL"));
    }

    #[test]
    fn test_company_name_match() {
        let r = resolver().resolve("how is apple doing today", &ResolveContext::default());
        assert_eq!(r.best_ticker.as_deref(), Some("AAPL"));
        assert!(matches!(
            r.matched_by,
            Some(MatchedBy::Company) | Some(MatchedBy::Alias)
        ));
        assert_eq!(r.confidence, Confidence::Company);
    }

    #[test]
    fn test_alias_match() {
        let r = resolver().resolve("what about facebook?", &ResolveContext::default());
        assert_eq!(r.best_ticker.as_deref(), Some("META"));
        assert_eq!(r.matched_by, Some(MatchedBy::Alias));
    }

    #[test]
    fn test_stop_word_ticker_needs_dollar_prefix() {
        // "ALL" is a real ticker but also a common word: plain use is
        // skipped, the $-prefixed form is explicit.
        let r = resolver().resolve("sell ALL my shares", &ResolveContext::default());
        assert_ne!(r.best_ticker.as_deref(), Some("ALL"));

        let r = resolver().resolve("thoughts on $ALL", &ResolveContext::default());
        assert_eq!(r.best_ticker.as_deref(), Some("ALL"));
        assert_eq!(r.matched_by, Some(MatchedBy::Symbol));
    }

    #[test]
    fn test_share_class_symbol() {
        let r = resolver().resolve("is BRK.B overvalued", &ResolveContext::default());
        assert_eq!(r.best_ticker.as_deref(), Some("BRK.B"));
    }

    #[test]
    fn test_cookie_fallback_before_client_hint() {
        let ctx = ResolveContext {
            cookie_ticker: Some("aapl".to_string()),
            client_hint: Some("MSFT".to_string()),
        };
        let r = resolver().resolve("what about the price?", &ctx);
        assert_eq!(r.best_ticker.as_deref(), Some("AAPL"));
        assert_eq!(r.matched_by, Some(MatchedBy::Cookie));
        assert_eq!(r.confidence, Confidence::Contextual);
    }

    #[test]
    fn test_client_hint_when_cookie_invalid() {
        let ctx = ResolveContext {
            cookie_ticker: Some("ZZZZ".to_string()),
            client_hint: Some("MSFT".to_string()),
        };
        let r = resolver().resolve("what about the price?", &ctx);
        assert_eq!(r.best_ticker.as_deref(), Some("MSFT"));
        assert_eq!(r.matched_by, Some(MatchedBy::ClientHint));
    }

    #[test]
    fn test_no_match_is_explicit() {
        let r = resolver().resolve("tell me a joke", &ResolveContext::default());
        assert!(r.best_ticker.is_none());
        assert!(r.all_tickers.is_empty());
        assert_eq!(r.confidence, Confidence::None);
        assert!(!r.reason.is_empty());
    }

    #[test]
    fn test_unknown_symbol_shape_not_matched() {
        // Correct shape, but not in the universe
        let r = resolver().resolve("buy XXXX now", &ResolveContext::default());
        assert!(r.best_ticker.is_none());
    }
}
