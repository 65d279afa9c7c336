//! Session statistics (spec §4.8, supplementing the distilled spec):
//! atomic counters the cascade updates on every classification, surfaced to
//! the CLI's end-of-run summary. Same shape as the teacher's
//! `MetricsCollector` — atomic counters plus a bounded latency window —
//! adapted from a single recall-path gauge to one counter per cascade tier.

use crate::model::Method;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

const LATENCY_WINDOW_SIZE: usize = 1000;

/// Session-spanning counters, grounded in the original tool's
/// `get_session_stats()` fields (`total_classifications`,
/// `llm_classifications`, `learned_hits`, `learning_stores`,
/// `llm_cost_usd`, `llm_usage_rate`, `learned_hit_rate`).
pub struct SessionStats {
    rule_count: AtomicU64,
    phonetic_count: AtomicU64,
    learned_count: AtomicU64,
    cache_count: AtomicU64,
    llm_count: AtomicU64,
    unknown_count: AtomicU64,
    learning_stores: AtomicU64,
    llm_cost_microcents: AtomicU64,
    latencies: RwLock<VecDeque<f64>>,
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStats {
    pub fn new() -> Self {
        Self {
            rule_count: AtomicU64::new(0),
            phonetic_count: AtomicU64::new(0),
            learned_count: AtomicU64::new(0),
            cache_count: AtomicU64::new(0),
            llm_count: AtomicU64::new(0),
            unknown_count: AtomicU64::new(0),
            learning_stores: AtomicU64::new(0),
            llm_cost_microcents: AtomicU64::new(0),
            latencies: RwLock::new(VecDeque::with_capacity(LATENCY_WINDOW_SIZE)),
        }
    }

    pub fn record(&self, method: Method, is_unknown: bool, latency_ms: f64, llm_cost_usd: Option<f64>) {
        if is_unknown {
            self.unknown_count.fetch_add(1, Ordering::Relaxed);
        } else {
            let counter = match method {
                Method::Rule => &self.rule_count,
                Method::Phonetic => &self.phonetic_count,
                Method::Learned => &self.learned_count,
                Method::Cache => &self.cache_count,
                Method::Llm => &self.llm_count,
            };
            counter.fetch_add(1, Ordering::Relaxed);
        }

        if let Some(cost) = llm_cost_usd {
            // Track cost as micro-cents (1e-8 USD) so the atomic stays integral.
            self.llm_cost_microcents
                .fetch_add((cost * 1e8) as u64, Ordering::Relaxed);
        }

        if let Ok(mut latencies) = self.latencies.write() {
            if latencies.len() >= LATENCY_WINDOW_SIZE {
                latencies.pop_front();
            }
            latencies.push_back(latency_ms);
        }
    }

    pub fn record_learning_store(&self) {
        self.learning_stores.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SessionStatsSnapshot {
        let rule = self.rule_count.load(Ordering::Relaxed);
        let phonetic = self.phonetic_count.load(Ordering::Relaxed);
        let learned = self.learned_count.load(Ordering::Relaxed);
        let cache = self.cache_count.load(Ordering::Relaxed);
        let llm = self.llm_count.load(Ordering::Relaxed);
        let unknown = self.unknown_count.load(Ordering::Relaxed);
        let total = rule + phonetic + learned + cache + llm + unknown;

        let llm_usage_rate = if total > 0 { llm as f64 / total as f64 } else { 0.0 };
        let learned_hit_rate = if total > 0 {
            (learned + cache) as f64 / total as f64
        } else {
            0.0
        };

        SessionStatsSnapshot {
            total_classifications: total,
            rule_classifications: rule,
            phonetic_classifications: phonetic,
            learned_classifications: learned,
            cache_classifications: cache,
            llm_classifications: llm,
            unknown_classifications: unknown,
            learning_stores: self.learning_stores.load(Ordering::Relaxed),
            llm_cost_usd: self.llm_cost_microcents.load(Ordering::Relaxed) as f64 / 1e8,
            llm_usage_rate,
            learned_hit_rate,
            avg_latency_ms: self.avg_latency(),
            p99_latency_ms: self.p99_latency(),
        }
    }

    fn avg_latency(&self) -> f64 {
        match self.latencies.read() {
            Ok(l) if !l.is_empty() => l.iter().sum::<f64>() / l.len() as f64,
            _ => 0.0,
        }
    }

    fn p99_latency(&self) -> f64 {
        let Ok(latencies) = self.latencies.read() else {
            return 0.0;
        };
        if latencies.is_empty() {
            return 0.0;
        }
        let mut sorted: Vec<f64> = latencies.iter().copied().collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let index = (((sorted.len() as f64) * 0.99).ceil() as usize)
            .saturating_sub(1)
            .min(sorted.len() - 1);
        sorted[index]
    }
}

#[derive(Debug, Clone)]
pub struct SessionStatsSnapshot {
    pub total_classifications: u64,
    pub rule_classifications: u64,
    pub phonetic_classifications: u64,
    pub learned_classifications: u64,
    pub cache_classifications: u64,
    pub llm_classifications: u64,
    pub unknown_classifications: u64,
    pub learning_stores: u64,
    pub llm_cost_usd: f64,
    pub llm_usage_rate: f64,
    pub learned_hit_rate: f64,
    pub avg_latency_ms: f64,
    pub p99_latency_ms: f64,
}
