//! Tuning configuration for the classification cascade and job runner.
//!
//! Mirrors the teacher's `config.rs`: free-standing `SCREAMING_SNAKE`
//! constants for values that are tunable but rarely touched, plus a small
//! `clap`-derived enum for the one choice that changes behavior at
//! construction time (`Mode`).

use serde::{Deserialize, Serialize};

// Rule tier confidence bases (spec 4.2).
pub const RULE_CONFIDENCE_FULL_NAME: f64 = 0.95;
pub const RULE_CONFIDENCE_SURNAME: f64 = 0.85;
pub const RULE_CONFIDENCE_GIVEN_NAME: f64 = 0.75;

// Phonetic tier (spec 4.3).
pub const PHONETIC_CONSENSUS_GATE: f64 = 0.60;
pub const PHONETIC_SIMILARITY_GATE: f64 = 0.75;
pub const PHONETIC_CONFIDENCE_FLOOR: f64 = 0.55;
pub const PHONETIC_CONFIDENCE_SLOPE: f64 = 0.4;
pub const PHONETIC_CONFIDENCE_CEILING: f64 = 0.92;

pub const ALGO_WEIGHT_DOUBLE_METAPHONE: f64 = 1.0;
pub const ALGO_WEIGHT_METAPHONE: f64 = 0.9;
pub const ALGO_WEIGHT_NYSIIS: f64 = 0.85;
pub const ALGO_WEIGHT_MATCH_RATING: f64 = 0.8;
pub const ALGO_WEIGHT_SOUNDEX: f64 = 0.7;

// Learning store (spec 4.4).
pub const MIN_SUPPORT: u32 = 2;
pub const MIN_PATTERN_CONF: f64 = 0.80;
pub const LEARNED_CONFIDENCE_CAP: f64 = 0.95;
pub const LEARNED_SHARE_GATE: f64 = 0.65;
pub const LEARNED_WEIGHT_GATE: f64 = 1.5;
pub const LEARNED_CONFIDENCE_CEILING: f64 = 0.88;
pub const LEARNED_CONFIDENCE_BASE: f64 = 0.6;
pub const LEARNED_CONFIDENCE_SLOPE: f64 = 0.3;
pub const NGRAM_SIZES: [usize; 3] = [3, 4, 5];

// LLM gateway (spec 4.5).
pub const DEFAULT_LLM_CONCURRENCY: usize = 4;
pub const DEFAULT_LLM_TIMEOUT_S: f64 = 30.0;
pub const LLM_RETRY_BACKOFFS_S: [f64; 2] = [1.0, 4.0];
pub const LLM_CONFIDENCE_FLOOR: f64 = 0.50;

// Cascade gates (spec 4.6), before the per-mode adjustment.
pub const RULE_TIER_GATE: f64 = 0.80;
pub const LEARNED_TIER_GATE: f64 = 0.75;
pub const PHONETIC_TIER_GATE: f64 = 0.70;
pub const STRICT_MODE_DELTA: f64 = 0.05;

// Job runner (spec 4.7, 5, 6).
pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_ROW_PARALLELISM: usize = 8;
pub const DEFAULT_MAX_ERROR_RATIO: f64 = 0.20;
pub const LEARNING_STORE_WRITE_TIMEOUT_S: f64 = 5.0;
pub const BATCH_COMMIT_TIMEOUT_S: f64 = 10.0;

pub const HONORIFICS: [&str; 6] = ["mr", "mrs", "ms", "dr", "prof", "adv"];

/// Named preset of cascade thresholds. Immutable once a `Cascade` is built.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    CostOptimized,
    Strict,
    LlmOnly,
}

/// Resolved gate values for a `Mode`. Computed once at cascade construction.
#[derive(Clone, Copy, Debug)]
pub struct Thresholds {
    pub rule_gate: f64,
    pub learned_gate: f64,
    pub phonetic_gate: f64,
    pub llm_gate: f64,
    /// `llm_only` skips tiers 2-4 (rule, learned, phonetic) entirely.
    pub skip_to_llm: bool,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Mode::CostOptimized => "cost-optimized",
            Mode::Strict => "strict",
            Mode::LlmOnly => "llm-only",
        };
        f.write_str(s)
    }
}

impl Thresholds {
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::CostOptimized => Self {
                rule_gate: RULE_TIER_GATE,
                learned_gate: LEARNED_TIER_GATE,
                phonetic_gate: PHONETIC_TIER_GATE,
                llm_gate: LLM_CONFIDENCE_FLOOR,
                skip_to_llm: false,
            },
            Mode::Strict => Self {
                rule_gate: RULE_TIER_GATE + STRICT_MODE_DELTA,
                learned_gate: LEARNED_TIER_GATE + STRICT_MODE_DELTA,
                phonetic_gate: PHONETIC_TIER_GATE + STRICT_MODE_DELTA,
                llm_gate: LLM_CONFIDENCE_FLOOR + STRICT_MODE_DELTA,
                skip_to_llm: false,
            },
            Mode::LlmOnly => Self {
                rule_gate: RULE_TIER_GATE,
                learned_gate: LEARNED_TIER_GATE,
                phonetic_gate: PHONETIC_TIER_GATE,
                llm_gate: LLM_CONFIDENCE_FLOOR,
                skip_to_llm: true,
            },
        }
    }
}

/// Full runtime configuration, assembled from CLI flags (`main.rs`) or test
/// defaults. Passed once to construct the cascade and job runner; immutable
/// thereafter, same contract the teacher's `ProjectContext` gives its
/// per-project config.
#[derive(Clone, Debug)]
pub struct Config {
    pub mode: Mode,
    pub enable_llm: bool,
    pub batch_size: usize,
    pub row_parallelism: usize,
    pub llm_concurrency: usize,
    pub llm_timeout_s: f64,
    pub max_error_ratio: f64,
    pub min_pattern_support: u32,
    pub min_pattern_confidence: f64,
    pub db_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::CostOptimized,
            enable_llm: true,
            batch_size: DEFAULT_BATCH_SIZE,
            row_parallelism: DEFAULT_ROW_PARALLELISM,
            llm_concurrency: DEFAULT_LLM_CONCURRENCY,
            llm_timeout_s: DEFAULT_LLM_TIMEOUT_S,
            max_error_ratio: DEFAULT_MAX_ERROR_RATIO,
            min_pattern_support: MIN_SUPPORT,
            min_pattern_confidence: MIN_PATTERN_CONF,
            db_path: "./data/leadscout.db".to_string(),
        }
    }
}

/// Optional on-disk overrides for the handful of settings worth pinning per
/// deployment rather than passing as flags every run. Every field is
/// optional so a config file only needs to mention what it changes; CLI
/// flags still win when both are given (`main.rs` applies this first).
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub mode: Option<Mode>,
    pub enable_llm: Option<bool>,
    pub batch_size: Option<usize>,
    pub row_parallelism: Option<usize>,
    pub llm_concurrency: Option<usize>,
    pub llm_timeout_s: Option<f64>,
    pub max_error_ratio: Option<f64>,
    pub db_path: Option<String>,
}

impl ConfigFile {
    pub fn load(path: &str) -> Result<Self, ConfigFileError> {
        let raw = std::fs::read_to_string(path).map_err(ConfigFileError::Io)?;
        toml::from_str(&raw).map_err(ConfigFileError::Parse)
    }

    /// Apply this file's overrides onto a base `Config` (typically
    /// `Config::default()`), field by field.
    pub fn apply(self, mut base: Config) -> Config {
        if let Some(mode) = self.mode {
            base.mode = mode;
        }
        if let Some(enable_llm) = self.enable_llm {
            base.enable_llm = enable_llm;
        }
        if let Some(batch_size) = self.batch_size {
            base.batch_size = batch_size;
        }
        if let Some(row_parallelism) = self.row_parallelism {
            base.row_parallelism = row_parallelism;
        }
        if let Some(llm_concurrency) = self.llm_concurrency {
            base.llm_concurrency = llm_concurrency;
        }
        if let Some(llm_timeout_s) = self.llm_timeout_s {
            base.llm_timeout_s = llm_timeout_s;
        }
        if let Some(max_error_ratio) = self.max_error_ratio {
            base.max_error_ratio = max_error_ratio;
        }
        if let Some(db_path) = self.db_path {
            base.db_path = db_path;
        }
        base
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("could not read config file: {0}")]
    Io(std::io::Error),
    #[error("could not parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_file_overrides_only_the_fields_it_sets() {
        let file = ConfigFile {
            batch_size: Some(250),
            ..Default::default()
        };
        let config = file.apply(Config::default());
        assert_eq!(config.batch_size, 250);
        assert_eq!(config.row_parallelism, DEFAULT_ROW_PARALLELISM);
    }

    #[test]
    fn missing_config_file_reports_an_io_error() {
        let err = ConfigFile::load("/nonexistent/path/leadscout.toml").unwrap_err();
        assert!(matches!(err, ConfigFileError::Io(_)));
    }

    #[test]
    fn thresholds_strict_mode_raises_every_gate() {
        let base = Thresholds::for_mode(Mode::CostOptimized);
        let strict = Thresholds::for_mode(Mode::Strict);
        assert!(strict.rule_gate > base.rule_gate);
        assert!(strict.learned_gate > base.learned_gate);
        assert!(strict.phonetic_gate > base.phonetic_gate);
        assert!(strict.llm_gate > base.llm_gate);
    }

    #[test]
    fn llm_only_mode_skips_straight_to_llm() {
        let thresholds = Thresholds::for_mode(Mode::LlmOnly);
        assert!(thresholds.skip_to_llm);
    }
}
