//! Shared data model: the closed enums and record types every tier of the
//! cascade, the learning store, and the job runner pass around.

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Closed ethnicity classification enum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ethnicity {
    African,
    Indian,
    CapeMalay,
    Coloured,
    White,
    Unknown,
}

impl Ethnicity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ethnicity::African => "african",
            Ethnicity::Indian => "indian",
            Ethnicity::CapeMalay => "cape_malay",
            Ethnicity::Coloured => "coloured",
            Ethnicity::White => "white",
            Ethnicity::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "african" => Ethnicity::African,
            "indian" => Ethnicity::Indian,
            "cape_malay" => Ethnicity::CapeMalay,
            "coloured" => Ethnicity::Coloured,
            "white" => Ethnicity::White,
            _ => Ethnicity::Unknown,
        }
    }
}

impl std::fmt::Display for Ethnicity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which tier of the cascade produced a classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Rule,
    Phonetic,
    Learned,
    Llm,
    Cache,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Rule => "rule",
            Method::Phonetic => "phonetic",
            Method::Learned => "learned",
            Method::Llm => "llm",
            Method::Cache => "cache",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "rule" => Method::Rule,
            "phonetic" => Method::Phonetic,
            "learned" => Method::Learned,
            "cache" => Method::Cache,
            _ => Method::Llm,
        }
    }

    pub const ALL: [Method; 5] = [
        Method::Rule,
        Method::Phonetic,
        Method::Learned,
        Method::Llm,
        Method::Cache,
    ];
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single phonetic-algorithm vote, used to build consensus.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PhoneticMatch {
    pub algorithm: String,
    pub matched_name: String,
    pub matched_ethnicity: Ethnicity,
    pub similarity: f64,
}

/// Everything the phonetic tier found, kept on the `Classification` for
/// observability when `method == Method::Phonetic`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PhoneticDetails {
    pub matches: Vec<PhoneticMatch>,
    pub consensus_score: f64,
}

impl PhoneticDetails {
    /// The algorithm that contributed the strongest single vote, used for
    /// logging and the `top_algorithm` field the original tooling reported.
    pub fn top_algorithm(&self) -> Option<&str> {
        self.matches
            .iter()
            .max_by(|a, b| a.similarity.partial_cmp(&b.similarity).unwrap())
            .map(|m| m.algorithm.as_str())
    }
}

/// The result of classifying a single name, regardless of which tier
/// produced it. `method` is always set; the optional fields are populated
/// only by the tier that produces them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Classification {
    pub input_name: String,
    pub normalized_name: String,
    pub ethnicity: Ethnicity,
    pub confidence: f64,
    pub method: Method,
    pub processing_time_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phonetic_details: Option<PhoneticDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_cost_usd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Classification {
    pub fn unknown(method: Method, input_name: &str, normalized_name: &str, started: Instant) -> Self {
        Self {
            input_name: input_name.to_string(),
            normalized_name: normalized_name.to_string(),
            ethnicity: Ethnicity::Unknown,
            confidence: 0.0,
            method,
            processing_time_ms: started.elapsed().as_secs_f64() * 1000.0,
            phonetic_details: None,
            llm_cost_usd: None,
            llm_tokens: None,
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Row schemas (external interface contracts only — no spreadsheet binding)
// ---------------------------------------------------------------------------

/// Input row as consumed from the six documented spreadsheet columns.
/// Reading the actual file (xlsx/csv) is an external collaborator's job;
/// this crate only needs the fields once they're parsed.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InputRow {
    pub entity_name: String,
    pub director_name: String,
    pub keyword: String,
    pub contact_number: String,
    pub email_address: String,
    pub registered_address_province: String,
}

/// Output row: input columns plus the classification outcome.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputRow {
    pub entity_name: String,
    pub director_name: String,
    pub keyword: String,
    pub contact_number: String,
    pub email_address: String,
    pub registered_address_province: String,
    pub ethnicity: Ethnicity,
    pub confidence: f64,
    pub method: Method,
    pub processing_time_ms: f64,
    pub status: RowStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    Success,
    Error,
}

impl OutputRow {
    pub fn from_classification(input: InputRow, classification: Classification) -> Self {
        let status = if classification.error.is_some() {
            RowStatus::Error
        } else {
            RowStatus::Success
        };
        Self {
            entity_name: input.entity_name,
            director_name: input.director_name,
            keyword: input.keyword,
            contact_number: input.contact_number,
            email_address: input.email_address,
            registered_address_province: input.registered_address_province,
            ethnicity: classification.ethnicity,
            confidence: classification.confidence,
            method: classification.method,
            processing_time_ms: classification.processing_time_ms,
            status,
            error_message: classification.error,
        }
    }
}
