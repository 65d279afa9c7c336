//! Name normalizer (spec §4.1, component C1).
//!
//! Same shape as the teacher's `normalize_cue`: a pure function that folds
//! an arbitrary input string into a canonical form plus a trace of what was
//! applied, except here the canonical form is a name (joined + tokenized)
//! rather than a cue string.

use crate::config::HONORIFICS;
use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

/// Sentinel returned for empty or honorific-only input (spec §4.1 edge case).
pub const EMPTY_SENTINEL: &str = "";

#[derive(Debug, Clone, Serialize)]
pub struct NormalizeTrace {
    pub raw: String,
    pub normalized: String,
    pub stripped_honorifics: Vec<String>,
}

/// Canonicalized name: `joined` is used for dictionary/full-name lookups,
/// `tokens` preserves surface order for the surname-priority rule and
/// per-token phonetic work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedName {
    pub joined: String,
    pub tokens: Vec<String>,
}

impl NormalizedName {
    pub fn is_empty(&self) -> bool {
        self.joined.is_empty() || self.tokens.is_empty()
    }
}

/// Normalize a raw name per spec §4.1:
/// 1. NFKC fold, trim.
/// 2. Lowercase.
/// 3. Strip honorifics bounded by whitespace/string-end.
/// 4. Collapse internal whitespace.
/// 5. Tokenize, preserving order; also produce the joined form.
pub fn normalize_name(raw: &str) -> (NormalizedName, NormalizeTrace) {
    let folded: String = raw.nfkc().collect();
    let trimmed = folded.trim();
    let lowered = trimmed.to_lowercase();

    let mut stripped_honorifics = Vec::new();
    let mut tokens: Vec<String> = lowered
        .split_whitespace()
        .filter(|tok| {
            let bare = tok.trim_end_matches('.');
            if HONORIFICS.contains(&bare) {
                stripped_honorifics.push(bare.to_string());
                false
            } else {
                true
            }
        })
        .map(|s| s.to_string())
        .collect();

    // Collapse-whitespace step is implicit in split_whitespace/join below.
    tokens.retain(|t| !t.is_empty());
    let joined = tokens.join(" ");

    let normalized = NormalizedName {
        joined: joined.clone(),
        tokens,
    };

    (
        normalized,
        NormalizeTrace {
            raw: raw.to_string(),
            normalized: joined,
            stripped_honorifics,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_sentinel() {
        let (norm, _) = normalize_name("   ");
        assert!(norm.is_empty());
        assert_eq!(norm.joined, EMPTY_SENTINEL);
    }

    #[test]
    fn honorific_only_input_yields_sentinel() {
        let (norm, trace) = normalize_name("Dr.");
        assert!(norm.is_empty());
        assert_eq!(trace.stripped_honorifics, vec!["dr".to_string()]);
    }

    #[test]
    fn strips_honorifics_and_lowercases() {
        let (norm, trace) = normalize_name("  Dr John   SEPTEMBER ");
        assert_eq!(norm.joined, "john september");
        assert_eq!(norm.tokens, vec!["john".to_string(), "september".to_string()]);
        assert_eq!(trace.stripped_honorifics, vec!["dr".to_string()]);
    }

    #[test]
    fn unicode_names_pass_through_unchanged_besides_case() {
        let (norm, _) = normalize_name("Zoë Müller");
        assert_eq!(norm.tokens, vec!["zoë".to_string(), "müller".to_string()]);
    }

    #[test]
    fn normalize_is_idempotent() {
        let (first, _) = normalize_name("  Mr Bongani   Mthembu");
        let (second, _) = normalize_name(&first.joined);
        assert_eq!(first, second);
    }

    #[test]
    fn numerics_and_symbols_are_retained_as_tokens() {
        let (norm, _) = normalize_name("Director #2");
        assert_eq!(norm.tokens, vec!["director".to_string(), "#2".to_string()]);
    }
}
