//! Persistent learning store (spec §4.4, component C4).
//!
//! Two layers: an exact-match cache (`learned_classifications`) and a
//! pattern store (`learned_patterns`) of prefix/suffix n-grams and
//! phonetic-key/full-phonetic-family signals distilled from every
//! classification ever stored, the same "promote raw observations into a
//! reusable derived structure" shape the teacher's `jobs.rs` alias
//! proposer uses when it folds lexical signals into `Memory<T>` entries —
//! except durable in SQLite rather than the in-process snapshot the
//! teacher keeps.

use crate::config::{
    LEARNED_CONFIDENCE_BASE, LEARNED_CONFIDENCE_CAP, LEARNED_CONFIDENCE_CEILING,
    LEARNED_CONFIDENCE_SLOPE, LEARNED_SHARE_GATE, LEARNED_WEIGHT_GATE, MIN_PATTERN_CONF,
    MIN_SUPPORT, NGRAM_SIZES,
};
use crate::error::StoreError;
use crate::model::{Classification, Ethnicity, Method};
use crate::normalize::NormalizedName;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::time::Instant;
use unicode_segmentation::UnicodeSegmentation;

pub struct LearningStore {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct ExactHit {
    ethnicity: String,
    confidence: f64,
}

#[derive(sqlx::FromRow)]
struct PatternRow {
    ethnicity: String,
    support: i64,
    confidence: f64,
}

impl LearningStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Look up a previously classified name: exact cache hit first, then
    /// pattern-derived inference over phonetic-key/full-phonetic-family
    /// patterns and prefix/suffix n-grams together.
    pub async fn lookup(
        &self,
        normalized: &NormalizedName,
        input_name: &str,
        started: Instant,
    ) -> Result<Option<Classification>, StoreError> {
        if normalized.is_empty() {
            return Ok(None);
        }

        if let Some(hit) = self.lookup_exact(&normalized.joined).await? {
            let confidence = hit.confidence.min(LEARNED_CONFIDENCE_CAP);
            return Ok(Some(Classification {
                input_name: input_name.to_string(),
                normalized_name: normalized.joined.clone(),
                ethnicity: Ethnicity::parse(&hit.ethnicity),
                confidence,
                method: Method::Cache,
                processing_time_ms: started.elapsed().as_secs_f64() * 1000.0,
                phonetic_details: None,
                llm_cost_usd: None,
                llm_tokens: None,
                error: None,
            }));
        }

        self.lookup_patterns(normalized, input_name, started).await
    }

    async fn lookup_exact(&self, normalized: &str) -> Result<Option<ExactHit>, StoreError> {
        let row = sqlx::query_as::<_, ExactHit>(
            "SELECT ethnicity, confidence FROM learned_classifications WHERE normalized_name = ?",
        )
        .bind(normalized)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn lookup_patterns(
        &self,
        normalized: &NormalizedName,
        input_name: &str,
        started: Instant,
    ) -> Result<Option<Classification>, StoreError> {
        let mut weight_by_ethnicity: HashMap<String, f64> = HashMap::new();

        for (kind, value) in patterns_of(normalized) {
            let rows = sqlx::query_as::<_, PatternRow>(
                "SELECT ethnicity, support, confidence FROM learned_patterns \
                 WHERE pattern_kind = ? AND pattern_value = ? AND active = 1",
            )
            .bind(kind)
            .bind(&value)
            .fetch_all(&self.pool)
            .await?;

            for row in rows {
                let contribution = row.support as f64 * row.confidence;
                *weight_by_ethnicity.entry(row.ethnicity).or_insert(0.0) += contribution;
            }
        }

        if weight_by_ethnicity.is_empty() {
            return Ok(None);
        }

        let total: f64 = weight_by_ethnicity.values().sum();
        let (winner, winner_weight) = weight_by_ethnicity
            .into_iter()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
            .unwrap();

        let share = winner_weight / total;
        if share < LEARNED_SHARE_GATE || winner_weight < LEARNED_WEIGHT_GATE {
            return Ok(None);
        }

        let confidence = (LEARNED_CONFIDENCE_BASE + LEARNED_CONFIDENCE_SLOPE * share)
            .clamp(LEARNED_CONFIDENCE_BASE, LEARNED_CONFIDENCE_CEILING);

        Ok(Some(Classification {
            input_name: input_name.to_string(),
            normalized_name: normalized.joined.clone(),
            ethnicity: Ethnicity::parse(&winner),
            confidence,
            method: Method::Learned,
            processing_time_ms: started.elapsed().as_secs_f64() * 1000.0,
            phonetic_details: None,
            llm_cost_usd: None,
            llm_tokens: None,
            error: None,
        }))
    }

    /// Persist a classification: upsert the exact-match cache (higher
    /// confidence wins) and fold the name's n-grams into the pattern store.
    pub async fn store(
        &self,
        normalized: &NormalizedName,
        classification: &Classification,
    ) -> Result<(), StoreError> {
        if normalized.is_empty() || classification.ethnicity == Ethnicity::Unknown {
            return Ok(());
        }

        let now = chrono_now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO learned_classifications \
                (normalized_name, ethnicity, confidence, source_method, hit_count, updated_at) \
             VALUES (?, ?, ?, ?, 1, ?) \
             ON CONFLICT(normalized_name) DO UPDATE SET \
                ethnicity = CASE WHEN excluded.confidence >= learned_classifications.confidence \
                                 THEN excluded.ethnicity ELSE learned_classifications.ethnicity END, \
                confidence = MAX(excluded.confidence, learned_classifications.confidence), \
                hit_count = learned_classifications.hit_count + 1, \
                updated_at = excluded.updated_at",
        )
        .bind(&normalized.joined)
        .bind(classification.ethnicity.as_str())
        .bind(classification.confidence)
        .bind(classification.method.as_str())
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        for (kind, value) in patterns_of(normalized) {
            sqlx::query(
                "INSERT INTO learned_patterns \
                    (pattern_kind, pattern_value, ethnicity, support, confidence, active, updated_at) \
                 VALUES (?, ?, ?, 1, 1.0, 0, ?) \
                 ON CONFLICT(pattern_kind, pattern_value, ethnicity) DO UPDATE SET \
                    support = learned_patterns.support + 1, \
                    updated_at = excluded.updated_at",
            )
            .bind(kind)
            .bind(&value)
            .bind(classification.ethnicity.as_str())
            .bind(&now)
            .execute(&mut *tx)
            .await?;

            rebalance_pattern(&mut tx, kind, &value).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Session-spanning counters for observability, grounded in the
    /// original tool's `get_learning_statistics()`.
    pub async fn get_learning_statistics(&self) -> Result<LearningStatistics, StoreError> {
        let total_llm_classifications: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM learned_classifications WHERE source_method = 'llm'",
        )
        .fetch_one(&self.pool)
        .await?;

        let active_learned_patterns: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM learned_patterns WHERE active = 1")
                .fetch_one(&self.pool)
                .await?;

        let phonetic_families: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT pattern_value) FROM learned_patterns WHERE pattern_kind = 'full_phonetic_family'",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(LearningStatistics {
            total_llm_classifications: total_llm_classifications as u64,
            active_learned_patterns: active_learned_patterns as u64,
            phonetic_families: phonetic_families as u64,
        })
    }
}

pub struct LearningStatistics {
    pub total_llm_classifications: u64,
    pub active_learned_patterns: u64,
    pub phonetic_families: u64,
}

/// Recompute `confidence`/`active` for every ethnicity bucket of a single
/// `(kind, value)` pattern after a support increment, matching
/// `MIN_SUPPORT`/`MIN_PATTERN_CONF` (spec §4.4).
async fn rebalance_pattern(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    kind: &str,
    value: &str,
) -> Result<(), StoreError> {
    let rows = sqlx::query(
        "SELECT ethnicity, support FROM learned_patterns WHERE pattern_kind = ? AND pattern_value = ?",
    )
    .bind(kind)
    .bind(value)
    .fetch_all(&mut **tx)
    .await?;

    let total: i64 = rows.iter().map(|r| r.get::<i64, _>("support")).sum();
    if total == 0 {
        return Ok(());
    }

    for row in rows {
        let ethnicity: String = row.get("ethnicity");
        let support: i64 = row.get("support");
        let confidence = support as f64 / total as f64;
        let active = support as u32 >= MIN_SUPPORT && confidence >= MIN_PATTERN_CONF;

        sqlx::query(
            "UPDATE learned_patterns SET confidence = ?, active = ? \
             WHERE pattern_kind = ? AND pattern_value = ? AND ethnicity = ?",
        )
        .bind(confidence)
        .bind(active)
        .bind(kind)
        .bind(value)
        .bind(&ethnicity)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

/// Every derived pattern for a normalized name: prefix/suffix n-grams over
/// each token (sized per `NGRAM_SIZES`, skipping sizes larger than the
/// token itself, grapheme-cluster aware so a name carrying combining
/// diacritics doesn't get split mid-character) plus the phonetic-key and
/// full-phonetic-family patterns from `phonetic::phonetic_patterns` (spec
/// §4.4's four pattern kinds).
fn patterns_of(normalized: &NormalizedName) -> Vec<(&'static str, String)> {
    let mut out = Vec::new();
    for token in &normalized.tokens {
        let graphemes: Vec<&str> = token.graphemes(true).collect();
        for &n in &NGRAM_SIZES {
            if graphemes.len() < n {
                continue;
            }
            let prefix: String = graphemes[..n].concat();
            let suffix: String = graphemes[graphemes.len() - n..].concat();
            out.push(("prefix_ngram", prefix));
            out.push(("suffix_ngram", suffix));
        }
    }
    out.extend(crate::phonetic::phonetic_patterns(normalized));
    out
}

fn chrono_now() -> String {
    chrono::Utc::now().to_rfc3339()
}
