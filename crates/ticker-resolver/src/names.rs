use stats_core::IndicatorRow;
use std::collections::{HashMap, HashSet};

/// Maximum word-span length scanned against the name table.
const MAX_SPAN_WORDS: usize = 5;

/// Minimum fuzzy score accepted as equivalent to a direct hit.
const ACCEPT_THRESHOLD: f64 = 0.82;

/// Trailing legal-entity words stripped when building name keys.
const LEGAL_SUFFIXES: &[&str] = &[
    "inc", "incorporated", "corp", "corporation", "co", "company", "ltd", "plc", "group",
    "holdings",
];

/// Hand-maintained nicknames that the company-name table cannot derive.
pub fn build_alias_table() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        ("apple", "AAPL"),
        ("google", "GOOGL"),
        ("alphabet", "GOOGL"),
        ("facebook", "META"),
        ("meta", "META"),
        ("amazon", "AMZN"),
        ("microsoft", "MSFT"),
        ("tesla", "TSLA"),
        ("netflix", "NFLX"),
        ("nvidia", "NVDA"),
        ("berkshire", "BRK.B"),
        ("jp morgan", "JPM"),
        ("jpmorgan", "JPM"),
        ("coca cola", "KO"),
        ("coke", "KO"),
        ("exxon", "XOM"),
        ("walmart", "WMT"),
        ("disney", "DIS"),
        ("mcdonalds", "MCD"),
        ("goldman", "GS"),
        ("goldman sachs", "GS"),
    ])
}

/// Normalized company name -> ticker pairs from the dataset. Stored as
/// a vec so fuzzy scans iterate deterministically.
pub fn build_name_table(rows: &[IndicatorRow]) -> Vec<(String, String)> {
    let mut table = Vec::new();
    let mut seen = HashSet::new();

    for row in rows {
        let Some(company) = row.company.as_deref() else {
            continue;
        };
        let key = strip_legal_suffix(&normalize_text(company));
        if key.is_empty() || !seen.insert(key.clone()) {
            continue;
        }
        table.push((key, row.ticker.clone()));
    }

    table
}

/// Lowercase, `&` -> "and", punctuation stripped except `.`, whitespace
/// collapsed.
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str(" and "),
            c if c.is_alphanumeric() || c == '.' => {
                out.extend(c.to_lowercase());
            }
            _ => out.push(' '),
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_legal_suffix(normalized: &str) -> String {
    let mut words: Vec<&str> = normalized.split_whitespace().collect();
    while let Some(last) = words.last() {
        let bare = last.trim_end_matches('.');
        if words.len() > 1 && LEGAL_SUFFIXES.contains(&bare) {
            words.pop();
        } else {
            break;
        }
    }
    words
        .into_iter()
        .map(|w| w.trim_end_matches('.'))
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone)]
pub struct NameMatch {
    pub ticker: String,
    pub phrase: String,
    pub score: f64,
    pub via_alias: bool,
}

/// Scan every contiguous word-span of length 1..=5 in the text against
/// the alias and name tables. Exact normalized-phrase hits score 0.9;
/// otherwise a token-overlap fuzzy score (scaled by 0.7, with substring
/// containment boosts to 0.75/0.85) applies, accepted only at or above
/// the 0.82 threshold. The highest-scoring span wins.
pub fn best_match(
    text: &str,
    name_table: &[(String, String)],
    alias_table: &HashMap<&'static str, &'static str>,
) -> Option<NameMatch> {
    let normalized = normalize_text(text);
    let words: Vec<&str> = normalized.split_whitespace().collect();
    if words.is_empty() {
        return None;
    }

    let mut best: Option<NameMatch> = None;

    for start in 0..words.len() {
        let max_len = MAX_SPAN_WORDS.min(words.len() - start);
        for len in 1..=max_len {
            let phrase = words[start..start + len].join(" ");

            let candidate = if let Some(ticker) = alias_table.get(phrase.as_str()) {
                Some(NameMatch {
                    ticker: ticker.to_string(),
                    phrase: phrase.clone(),
                    score: 0.9,
                    via_alias: true,
                })
            } else if let Some((_, ticker)) =
                name_table.iter().find(|(name, _)| *name == phrase)
            {
                Some(NameMatch {
                    ticker: ticker.clone(),
                    phrase: phrase.clone(),
                    score: 0.9,
                    via_alias: false,
                })
            } else {
                fuzzy_best(&phrase, name_table)
            };

            if let Some(candidate) = candidate {
                let better = best
                    .as_ref()
                    .map(|b| candidate.score > b.score)
                    .unwrap_or(true);
                if better {
                    best = Some(candidate);
                }
            }
        }
    }

    best.filter(|m| m.score >= ACCEPT_THRESHOLD)
}

/// Best fuzzy candidate for one phrase across the whole name table.
fn fuzzy_best(phrase: &str, name_table: &[(String, String)]) -> Option<NameMatch> {
    let phrase_words: HashSet<&str> = phrase.split_whitespace().collect();
    let mut best: Option<NameMatch> = None;

    for (name, ticker) in name_table {
        let score = fuzzy_score(phrase, &phrase_words, name);
        if score <= 0.0 {
            continue;
        }
        let better = best.as_ref().map(|b| score > b.score).unwrap_or(true);
        if better {
            best = Some(NameMatch {
                ticker: ticker.clone(),
                phrase: phrase.to_string(),
                score,
                via_alias: false,
            });
        }
    }

    best
}

fn fuzzy_score(phrase: &str, phrase_words: &HashSet<&str>, name: &str) -> f64 {
    let name_words: HashSet<&str> = name.split_whitespace().collect();
    if phrase_words.is_empty() || name_words.is_empty() {
        return 0.0;
    }

    let overlap = phrase_words.intersection(&name_words).count() as f64;
    let min_size = phrase_words.len().min(name_words.len()) as f64;
    let mut score = overlap / min_size * 0.7;

    // Containment of one full string in the other is stronger evidence
    // than bag-of-words overlap; longer phrases earn the bigger boost.
    if name.contains(phrase) || phrase.contains(name) {
        let boost = if phrase.len() >= 9 { 0.85 } else { 0.75 };
        score = score.max(boost);
    }

    score
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

    fn table() -> Vec<(String, String)> {
        build_name_table(&[
            row("AAPL", "Apple Inc."),
            row("MSFT", "Microsoft Corporation"),
            row("JPM", "JPMorgan Chase & Co."),
            row("PG", "The Procter & Gamble Company"),
            row("BRK.B", "Berkshire Hathaway Inc."),
        ])
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("Apple, Inc.!"), "apple inc.");
        assert_eq!(normalize_text("Procter & Gamble"), "procter and gamble");
        assert_eq!(normalize_text("  lots   of SPACE "), "lots of space");
    }

    #[test]
    fn test_legal_suffix_stripped_in_table() {
        let t = table();
        assert!(t.iter().any(|(n, s)| n == "apple" && s == "AAPL"));
        assert!(t.iter().any(|(n, s)| n == "microsoft" && s == "MSFT"));
        assert!(t.iter().any(|(n, s)| n == "berkshire hathaway" && s == "BRK.B"));
    }

    #[test]
    fn test_exact_phrase_scores_point_nine() {
        let m = best_match("thoughts on microsoft please", &table(), &build_alias_table())
            .unwrap();
        assert_eq!(m.ticker, "MSFT");
        assert!((m.score - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_alias_beats_nothing() {
        let m = best_match("is facebook up?", &table(), &build_alias_table()).unwrap();
        assert_eq!(m.ticker, "META");
        assert!(m.via_alias);
    }

    #[test]
    fn test_containment_boost_accepted() {
        // "berkshire hathaway inc" normalizes oddly; the span
        // "hathaway" alone is contained in "berkshire hathaway" but
        // short spans only reach 0.75 and are rejected.
        let m = best_match("hathaway results", &table(), &HashMap::new());
        assert!(m.is_none());

        // The longer containment earns 0.85 and passes the threshold.
        let m = best_match("berkshire hathaway results", &table(), &HashMap::new());
        assert!(m.is_some());
    }

    #[test]
    fn test_overlap_alone_cannot_pass_threshold() {
        // Pure token overlap tops out at 0.7, below the 0.82 floor.
        let m = best_match("chase gamble", &table(), &HashMap::new());
        assert!(m.is_none());
    }

    #[test]
    fn test_no_match_on_unrelated_text() {
        assert!(best_match("tell me a joke", &table(), &build_alias_table()).is_none());
    }
}
