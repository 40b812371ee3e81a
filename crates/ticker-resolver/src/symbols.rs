use std::collections::HashSet;

/// Uppercase tokens that are valid ticker shapes but far more likely to
/// be ordinary words in shouted text ("SELL ALL NOW"). Applied
/// uniformly at this single entry point; a `$` prefix bypasses the
/// list because it is unambiguous.
const SYMBOL_STOP_WORDS: &[&str] = &[
    "A", "I", "ALL", "AN", "AND", "ANY", "ARE", "AT", "BE", "BEST", "BIG", "BUY", "CAN", "DO",
    "FOR", "GET", "GO", "GOOD", "HAS", "HOLD", "HOW", "IF", "IN", "IS", "IT", "ME", "MY", "NEW",
    "NO", "NOW", "OF", "ON", "OR", "OUT", "OWN", "SEE", "SELL", "SO", "THE", "TO", "UP", "US",
    "WE", "WHAT", "WHY", "YOU",
];

fn is_stop_word(token: &str) -> bool {
    SYMBOL_STOP_WORDS.contains(&token)
}

/// True for the explicit symbol shape: 1-5 uppercase letters with an
/// optional single-letter `.`-suffixed share class (BRK.B).
fn is_symbol_shape(token: &str) -> bool {
    let (body, class) = match token.split_once('.') {
        Some((body, class)) => (body, Some(class)),
        None => (token, None),
    };

    if body.is_empty() || body.len() > 5 || !body.chars().all(|c| c.is_ascii_uppercase()) {
        return false;
    }
    match class {
        Some(class) => class.len() == 1 && class.chars().all(|c| c.is_ascii_uppercase()),
        None => true,
    }
}

/// Scan text for explicit ticker tokens, in order of occurrence.
/// Tokens must match the symbol shape and belong to the known
/// universe. Duplicates are kept so the caller's last-occurrence
/// preference still sees a restated ticker.
pub fn scan(text: &str, universe: &HashSet<String>) -> Vec<String> {
    let mut found = Vec::new();

    for raw in text.split(|c: char| c.is_whitespace() || is_boundary(c)) {
        if raw.is_empty() {
            continue;
        }

        let (token, dollar_prefixed) = match raw.strip_prefix('$') {
            Some(rest) => (rest, true),
            None => (raw, false),
        };

        if !is_symbol_shape(token) {
            continue;
        }
        if !dollar_prefixed && is_stop_word(token) {
            continue;
        }
        if universe.contains(token) {
            found.push(token.to_string());
        }
    }

    found
}

/// Punctuation that terminates a token. `$` and `.` stay inside tokens
/// so `$TSLA` and `BRK.B` survive; a trailing `.` is not a share class
/// and fails the shape check on its own.
fn is_boundary(c: char) -> bool {
    !(c.is_ascii_alphanumeric() || c == '$' || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn universe(tickers: &[&str]) -> HashSet<String> {
        tickers.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_scan_basic() {
        let u = universe(&["TSLA", "AAPL"]);
        assert_eq!(scan("buy TSLA today", &u), vec!["TSLA"]);
        assert_eq!(scan("TSLA, then AAPL!", &u), vec!["TSLA", "AAPL"]);
    }

    #[test]
    fn test_lowercase_not_a_symbol() {
        let u = universe(&["TSLA"]);
        assert!(scan("buy tsla today", &u).is_empty());
    }

    #[test]
    fn test_dollar_prefix_bypasses_stop_words() {
        let u = universe(&["ALL"]);
        assert!(scan("sell ALL now", &u).is_empty());
        assert_eq!(scan("thoughts on $ALL?", &u), vec!["ALL"]);
    }

    #[test]
    fn test_share_class_shape() {
        assert!(is_symbol_shape("BRK.B"));
        assert!(is_symbol_shape("TSLA"));
        assert!(!is_symbol_shape("BRK."));
        assert!(!is_symbol_shape("BRK.BB"));
        assert!(!is_symbol_shape("TOOLONG"));
        assert!(!is_symbol_shape("Tsla"));
        assert!(!is_symbol_shape(""));
    }

    #[test]
    fn test_duplicates_preserved_in_order() {
        let u = universe(&["TSLA", "AAPL"]);
        assert_eq!(scan("TSLA AAPL TSLA", &u), vec!["TSLA", "AAPL", "TSLA"]);
    }

    #[test]
    fn test_unknown_ticker_ignored() {
        let u = universe(&["TSLA"]);
        assert!(scan("buy XXXX", &u).is_empty());
    }
}
