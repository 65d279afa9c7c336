//! LLM gateway (spec §4.5, component C5): the fallback tier. Bounded
//! concurrency, a timeout-and-retry envelope around each call, and a
//! swappable backend behind `LlmClient` — same seam the teacher puts
//! around its own external HTTP calls (`agent::search`, `agent::ingester`),
//! except here the trait lets tests substitute a scripted client instead of
//! talking to `reqwest` at all.

use crate::config::LLM_RETRY_BACKOFFS_S;
use crate::error::GatewayError;
use crate::model::Ethnicity;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// One LLM classification: ethnicity, confidence, cost, and token count.
#[derive(Clone, Debug)]
pub struct LlmResult {
    pub ethnicity: Ethnicity,
    pub confidence: f64,
    pub cost_usd: f64,
    pub tokens: u32,
}

/// Backend abstraction so the cascade and job runner never depend on
/// `reqwest` directly; `HttpLlmClient` is the production implementation,
/// `ScriptedLlmClient` (test-only) drives deterministic unit tests.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn classify(&self, name: &str) -> Result<LlmResult, GatewayError>;
}

/// Wraps an `LlmClient` with the bounded-concurrency, timeout, and
/// exponential-backoff-retry envelope the spec requires around every call
/// (§4.5, §5).
pub struct Gateway {
    client: Arc<dyn LlmClient>,
    semaphore: Arc<Semaphore>,
    timeout: Duration,
}

impl Gateway {
    pub fn new(client: Arc<dyn LlmClient>, concurrency: usize, timeout_s: f64) -> Self {
        Self {
            client,
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
            timeout: Duration::from_secs_f64(timeout_s),
        }
    }

    /// Classify `name`, retrying transient failures with the documented
    /// backoff schedule (1s, 4s) before giving up. Permanent errors
    /// (`GatewayError::Auth`, malformed responses) are not retried.
    pub async fn classify(&self, name: &str) -> Result<LlmResult, GatewayError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .expect("gateway semaphore closed unexpectedly");

        let mut last_err = None;
        for (attempt, backoff) in std::iter::once(0.0)
            .chain(LLM_RETRY_BACKOFFS_S.iter().copied())
            .enumerate()
        {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_secs_f64(backoff)).await;
            }

            let call = self.client.classify(name);
            match tokio::time::timeout(self.timeout, call).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(err)) => {
                    let transient = err.is_transient();
                    last_err = Some(err);
                    if !transient {
                        break;
                    }
                }
                Err(_) => {
                    last_err = Some(GatewayError::Timeout(self.timeout.as_secs_f64()));
                }
            }
        }

        Err(last_err.unwrap_or(GatewayError::Transport("no attempts made".to_string())))
    }
}

/// Production backend: a single JSON-in/JSON-out chat-style HTTP call.
/// Prompt construction and the exact endpoint/model are left to the
/// deployment's configuration — this struct only owns the request/response
/// envelope and error mapping.
pub struct HttpLlmClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl HttpLlmClient {
    pub fn new(endpoint: String, api_key: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
            api_key,
            model,
        }
    }
}

#[derive(Deserialize)]
struct ClassifyResponse {
    ethnicity: String,
    confidence: f64,
    cost_usd: f64,
    tokens: u32,
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn classify(&self, name: &str) -> Result<LlmResult, GatewayError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "model": self.model,
                "name": name,
            }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout(0.0)
                } else {
                    GatewayError::Transport(e.to_string())
                }
            })?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(GatewayError::Auth);
        }
        if !response.status().is_success() {
            return Err(GatewayError::Transport(format!(
                "http status {}",
                response.status()
            )));
        }

        let parsed: ClassifyResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;

        Ok(LlmResult {
            ethnicity: Ethnicity::parse(&parsed.ethnicity),
            confidence: parsed.confidence,
            cost_usd: parsed.cost_usd,
            tokens: parsed.tokens,
        })
    }
}

#[cfg(test)]
pub mod test_support {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Deterministic stand-in for `HttpLlmClient`, scripted with a fixed
    /// sequence of outcomes consumed in order; the last outcome repeats
    /// once the script is exhausted.
    pub struct ScriptedLlmClient {
        script: Mutex<Vec<Result<LlmResult, GatewayError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedLlmClient {
        pub fn new(script: Vec<Result<LlmResult, GatewayError>>) -> Self {
            Self {
                script: Mutex::new(script),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn clone_result(r: &Result<LlmResult, GatewayError>) -> Result<LlmResult, GatewayError> {
            match r {
                Ok(v) => Ok(v.clone()),
                Err(GatewayError::Timeout(t)) => Err(GatewayError::Timeout(*t)),
                Err(GatewayError::Transport(s)) => Err(GatewayError::Transport(s.clone())),
                Err(GatewayError::MalformedResponse(s)) => {
                    Err(GatewayError::MalformedResponse(s.clone()))
                }
                Err(GatewayError::Auth) => Err(GatewayError::Auth),
            }
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlmClient {
        async fn classify(&self, _name: &str) -> Result<LlmResult, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                Self::clone_result(&script.remove(0))
            } else {
                Self::clone_result(&script[0])
            }
        }
    }
}
