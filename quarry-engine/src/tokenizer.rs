//! Tokenizer: lowercase maximal ASCII alphanumeric runs, per-record set
//!
//! Bytes outside `[A-Za-z0-9]` (including invalid UTF-8) are separators.
//! The per-record set gives postings their set semantics; cross-record
//! occurrence totals come from upserting once per containing record.

use std::collections::BTreeSet;

/// Distinct lowercased tokens of one record.
pub fn record_tokens(bytes: &[u8]) -> BTreeSet<String> {
    let mut tokens = BTreeSet::new();
    let mut run = String::new();
    for &b in bytes {
        if b.is_ascii_alphanumeric() {
            run.push(char::from(b.to_ascii_lowercase()));
        } else if !run.is_empty() {
            tokens.insert(std::mem::take(&mut run));
        }
    }
    if !run.is_empty() {
        tokens.insert(run);
    }
    tokens
}

/// Normalize a query term the way import normalized tokens.
pub fn normalize_term(term: &str) -> String {
    term.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(bytes: &[u8]) -> Vec<String> {
        record_tokens(bytes).into_iter().collect()
    }

    #[test]
    fn test_lowercases_and_splits_on_non_alnum() {
        assert_eq!(tokens(b"Alpha, beta-GAMMA."), ["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_digits_join_runs() {
        assert_eq!(tokens(b"err404 handler"), ["err404", "handler"]);
    }

    #[test]
    fn test_duplicates_collapse_within_record() {
        assert_eq!(tokens(b"alpha alpha ALPHA"), ["alpha"]);
    }

    #[test]
    fn test_invalid_utf8_is_a_separator() {
        assert_eq!(tokens(b"alpha\xff\xfebeta"), ["alpha", "beta"]);
    }

    #[test]
    fn test_empty_record_has_no_tokens() {
        assert!(tokens(b"").is_empty());
        assert!(tokens(b" \n\t--- ").is_empty());
    }
}
