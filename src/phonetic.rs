//! Phonetic consensus classifier (spec §4.3, component C3).
//!
//! Builds a phonetic index over the dictionary once at startup, then scores
//! a query name against it under five independent algorithms
//! (`rphonetic`), aggregating per-ethnicity weighted votes into a single
//! consensus score — the same multi-signal, weighted-vote shape the
//! teacher's `jobs.rs` alias proposer uses across multiple `rayon`-folded
//! lexical signals, here applied to phonetic codes instead of token cues.

use crate::config::{
    ALGO_WEIGHT_DOUBLE_METAPHONE, ALGO_WEIGHT_MATCH_RATING, ALGO_WEIGHT_METAPHONE,
    ALGO_WEIGHT_NYSIIS, ALGO_WEIGHT_SOUNDEX, PHONETIC_CONFIDENCE_CEILING,
    PHONETIC_CONFIDENCE_FLOOR, PHONETIC_CONFIDENCE_SLOPE, PHONETIC_CONSENSUS_GATE,
    PHONETIC_SIMILARITY_GATE,
};
use crate::dictionary::{NameDictEntry, NameDictionary};
use crate::model::{Classification, Ethnicity, Method, PhoneticDetails, PhoneticMatch};
use crate::normalize::NormalizedName;
use rphonetic::{DoubleMetaphone, Encoder, MatchRatingApproach, Metaphone, Nysiis, Soundex};
use std::collections::HashMap;
use std::time::Instant;

const ALGORITHMS: [&str; 5] = ["double_metaphone", "metaphone", "nysiis", "match_rating", "soundex"];

type Buckets = HashMap<&'static str, HashMap<String, Vec<(String, Ethnicity)>>>;

fn empty_buckets() -> Buckets {
    ALGORITHMS.iter().map(|a| (*a, HashMap::new())).collect()
}

fn merge_buckets(mut a: Buckets, b: Buckets) -> Buckets {
    for (algorithm, codes) in b {
        let entry = a.entry(algorithm).or_default();
        for (code, mut names) in codes {
            entry.entry(code).or_default().append(&mut names);
        }
    }
    a
}

fn algo_weight(algorithm: &str) -> f64 {
    match algorithm {
        "double_metaphone" => ALGO_WEIGHT_DOUBLE_METAPHONE,
        "metaphone" => ALGO_WEIGHT_METAPHONE,
        "nysiis" => ALGO_WEIGHT_NYSIIS,
        "match_rating" => ALGO_WEIGHT_MATCH_RATING,
        "soundex" => ALGO_WEIGHT_SOUNDEX,
        _ => 0.0,
    }
}

/// Encoders for the five algorithms the cascade votes across. Built once;
/// `rphonetic`'s encoders are cheap, stateless beyond their tables.
struct Encoders {
    double_metaphone: DoubleMetaphone,
    metaphone: Metaphone,
    nysiis: Nysiis,
    match_rating: MatchRatingApproach,
    soundex: Soundex,
}

impl Default for Encoders {
    fn default() -> Self {
        Self {
            double_metaphone: DoubleMetaphone::default(),
            metaphone: Metaphone::default(),
            nysiis: Nysiis::default(),
            match_rating: MatchRatingApproach,
            soundex: Soundex::default(),
        }
    }
}

impl Encoders {
    /// Encode `name` under every algorithm, returning `(algorithm, code)`
    /// pairs. Double Metaphone contributes its primary code only — the
    /// alternate exists for recall on edge cases this classifier doesn't
    /// need, since the index already fans out across five algorithms.
    fn encode_all(&self, name: &str) -> Vec<(&'static str, String)> {
        vec![
            (
                "double_metaphone",
                self.double_metaphone.double_metaphone(name).primary().to_string(),
            ),
            ("metaphone", self.metaphone.encode(name)),
            ("nysiis", self.nysiis.encode(name)),
            ("match_rating", self.match_rating.encode(name)),
            ("soundex", self.soundex.encode(name)),
        ]
    }
}

/// `algorithm -> code -> [(dictionary_name, ethnicity)]`, built once from
/// the dictionary at startup.
pub struct PhoneticIndex {
    encoders: Encoders,
    buckets: HashMap<&'static str, HashMap<String, Vec<(String, Ethnicity)>>>,
}

impl PhoneticIndex {
    pub fn build(dict: &NameDictionary) -> Self {
        use rayon::prelude::*;

        let encoders = Encoders::default();
        let entries: Vec<&NameDictEntry> = dict.iter().collect();

        // Encoding every dictionary name under five algorithms is pure CPU
        // work with no shared state until the fold — a rayon fold/reduce
        // over per-worker partial indexes, same shape as the teacher's
        // alias proposer folding lexical signals in `jobs.rs`.
        let buckets = entries
            .par_iter()
            .fold(
                || empty_buckets(),
                |mut acc, entry| {
                    for (algorithm, code) in encoders.encode_all(&entry.name) {
                        if code.is_empty() {
                            continue;
                        }
                        acc.get_mut(algorithm)
                            .unwrap()
                            .entry(code)
                            .or_insert_with(Vec::new)
                            .push((entry.name.clone(), entry.ethnicity));
                    }
                    acc
                },
            )
            .reduce(empty_buckets, merge_buckets);

        Self { encoders, buckets }
    }

    /// Score every dictionary name sharing a phonetic code with any token of
    /// `normalized`, aggregate into per-ethnicity weights, and return the
    /// winner if both the consensus and similarity gates clear (spec §4.3).
    pub fn classify(
        &self,
        normalized: &NormalizedName,
        input_name: &str,
        started: Instant,
    ) -> Option<Classification> {
        if normalized.is_empty() {
            return None;
        }

        let mut votes: Vec<PhoneticMatch> = Vec::new();

        for token in &normalized.tokens {
            for (algorithm, code) in self.encoders.encode_all(token) {
                if code.is_empty() {
                    continue;
                }
                let Some(candidates) = self.buckets.get(algorithm).and_then(|b| b.get(&code))
                else {
                    continue;
                };
                for (candidate_name, ethnicity) in candidates {
                    let similarity = token_similarity(token, candidate_name);
                    votes.push(PhoneticMatch {
                        algorithm: algorithm.to_string(),
                        matched_name: candidate_name.clone(),
                        matched_ethnicity: *ethnicity,
                        similarity,
                    });
                }
            }
        }

        if votes.is_empty() {
            return None;
        }

        let mut weight_by_ethnicity: HashMap<Ethnicity, f64> = HashMap::new();
        for vote in &votes {
            let contribution = vote.similarity * algo_weight(&vote.algorithm);
            *weight_by_ethnicity.entry(vote.matched_ethnicity).or_insert(0.0) += contribution;
        }

        let total_weight: f64 = weight_by_ethnicity.values().sum();
        if total_weight <= 0.0 {
            return None;
        }

        let (winner, winner_weight) = weight_by_ethnicity
            .iter()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(e, w)| (*e, *w))
            .unwrap();

        let consensus_score = winner_weight / total_weight;

        let best_similarity_for_winner = votes
            .iter()
            .filter(|v| v.matched_ethnicity == winner)
            .map(|v| v.similarity)
            .fold(0.0_f64, f64::max);

        if consensus_score < PHONETIC_CONSENSUS_GATE
            || best_similarity_for_winner < PHONETIC_SIMILARITY_GATE
        {
            return None;
        }

        let confidence = (PHONETIC_CONFIDENCE_FLOOR + PHONETIC_CONFIDENCE_SLOPE * consensus_score)
            .clamp(PHONETIC_CONFIDENCE_FLOOR, PHONETIC_CONFIDENCE_CEILING);

        let mut winner_votes: Vec<PhoneticMatch> = votes
            .into_iter()
            .filter(|v| v.matched_ethnicity == winner)
            .collect();
        winner_votes.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap());
        winner_votes.truncate(5);

        Some(Classification {
            input_name: input_name.to_string(),
            normalized_name: normalized.joined.clone(),
            ethnicity: winner,
            confidence,
            method: Method::Phonetic,
            processing_time_ms: started.elapsed().as_secs_f64() * 1000.0,
            phonetic_details: Some(PhoneticDetails {
                matches: winner_votes,
                consensus_score,
            }),
            llm_cost_usd: None,
            llm_tokens: None,
            error: None,
        })
    }
}

/// Per-token `(algorithm, code)` pairs plus the "phonetic family" value
/// (every distinct code across every token and algorithm, sorted and
/// joined) for a normalized name — the two derived-pattern kinds the
/// learning store folds alongside its prefix/suffix n-grams (spec §4.4).
/// Pattern values are prefixed with their algorithm so two algorithms that
/// happen to produce the same short code never collide in storage.
pub fn phonetic_patterns(normalized: &NormalizedName) -> Vec<(&'static str, String)> {
    let encoders = Encoders::default();
    let mut family_codes: Vec<String> = Vec::new();
    let mut patterns = Vec::new();

    for token in &normalized.tokens {
        for (algorithm, code) in encoders.encode_all(token) {
            if code.is_empty() {
                continue;
            }
            patterns.push(("phonetic_key", format!("{algorithm}:{code}")));
            family_codes.push(code);
        }
    }

    family_codes.sort();
    family_codes.dedup();
    if !family_codes.is_empty() {
        patterns.push(("full_phonetic_family", family_codes.join(":")));
    }

    patterns
}

/// Normalized string similarity in `[0, 1]`, 1.0 for an exact match.
fn token_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 0.0;
    }
    1.0 - (strsim::levenshtein(a, b) as f64 / max_len as f64)
}
