//! Classification cascade orchestrator (spec §4.6, component C6): the one
//! entry point every caller uses. Never returns an error — every tier's
//! failure collapses into an `unknown` classification with `error` set, so
//! a single bad row can never abort a batch (spec §7).

use crate::config::{Config, Thresholds};
use crate::dictionary::NameDictionary;
use crate::error::StoreError;
use crate::gateway::Gateway;
use crate::learning_store::LearningStore;
use crate::model::{Classification, Method};
use crate::normalize::normalize_name;
use crate::phonetic::PhoneticIndex;
use crate::rules;
use crate::stats::SessionStats;
use std::sync::Arc;
use std::time::Instant;

pub struct Cascade {
    dictionary: NameDictionary,
    phonetic_index: PhoneticIndex,
    learning_store: Arc<LearningStore>,
    gateway: Option<Gateway>,
    thresholds: Thresholds,
    enable_llm: bool,
    pub stats: SessionStats,
}

impl Cascade {
    pub fn new(config: &Config, learning_store: Arc<LearningStore>, gateway: Option<Gateway>) -> Self {
        let dictionary = NameDictionary::load_seed();
        let phonetic_index = PhoneticIndex::build(&dictionary);
        Self {
            dictionary,
            phonetic_index,
            learning_store,
            gateway,
            thresholds: Thresholds::for_mode(config.mode),
            enable_llm: config.enable_llm,
            stats: SessionStats::new(),
        }
    }

    /// Classify one name through the tiered cascade: rule → learned →
    /// phonetic (all three skipped entirely in `Mode::LlmOnly`) → LLM
    /// fallback. Every tier's confidence is checked against its
    /// mode-adjusted gate before the result short-circuits the remaining
    /// tiers (spec §4.6).
    pub async fn classify_name(&self, raw: &str) -> Classification {
        let started = Instant::now();
        let (normalized, _trace) = normalize_name(raw);

        if normalized.is_empty() {
            let result = Classification::unknown(Method::Rule, raw, "", started);
            self.stats.record(result.method, true, result.processing_time_ms, None);
            return result;
        }

        if !self.thresholds.skip_to_llm {
            if let Some(result) = rules::classify(&normalized, &self.dictionary, raw, started) {
                if result.confidence >= self.thresholds.rule_gate {
                    self.record(&result);
                    return result;
                }
            }

            match self.learning_store.lookup(&normalized, raw, started).await {
                Ok(Some(result))
                    if result.confidence >= self.thresholds.learned_gate =>
                {
                    self.record(&result);
                    return result;
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(error = %err, "learning store lookup failed");
                }
            }

            if let Some(result) = self.phonetic_index.classify(&normalized, raw, started) {
                if result.confidence >= self.thresholds.phonetic_gate {
                    self.record(&result);
                    return result;
                }
            }
        }

        if self.enable_llm {
            if let Some(gateway) = &self.gateway {
                match gateway.classify(&normalized.joined).await {
                    Ok(llm_result) if llm_result.confidence >= self.thresholds.llm_gate => {
                        let result = Classification {
                            input_name: raw.to_string(),
                            normalized_name: normalized.joined.clone(),
                            ethnicity: llm_result.ethnicity,
                            confidence: llm_result.confidence,
                            method: Method::Llm,
                            processing_time_ms: started.elapsed().as_secs_f64() * 1000.0,
                            phonetic_details: None,
                            llm_cost_usd: Some(llm_result.cost_usd),
                            llm_tokens: Some(llm_result.tokens),
                            error: None,
                        };
                        if let Err(err) = self.learning_store.store(&normalized, &result).await {
                            tracing::warn!(error = %err, "failed to persist llm classification");
                        } else {
                            self.stats.record_learning_store();
                        }
                        self.record(&result);
                        return result;
                    }
                    Ok(_) => {}
                    Err(err) => {
                        tracing::warn!(error = %err, "llm gateway call failed");
                        let result = Classification::unknown(Method::Llm, raw, &normalized.joined, started)
                            .with_error(err.to_string());
                        self.record(&result);
                        return result;
                    }
                }
            }
        }

        let result = Classification::unknown(Method::Llm, raw, &normalized.joined, started);
        self.record(&result);
        result
    }

    fn record(&self, result: &Classification) {
        self.stats.record(
            result.method,
            result.ethnicity == crate::model::Ethnicity::Unknown,
            result.processing_time_ms,
            result.llm_cost_usd,
        );
    }

    pub async fn learning_statistics(
        &self,
    ) -> Result<crate::learning_store::LearningStatistics, StoreError> {
        self.learning_store.get_learning_statistics().await
    }

    pub fn dictionary_coverage(&self) -> std::collections::HashMap<crate::model::Ethnicity, usize> {
        self.dictionary.coverage_stats()
    }
}
