//! Error taxonomy (spec §7). The cascade orchestrator never propagates an
//! error to its caller — every failure collapses into an `unknown`
//! `Classification` with `error` set. Only the job runner's commit path and
//! store/gateway construction can fail outward.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("LLM call timed out after {0}s")]
    Timeout(f64),
    #[error("LLM transport error: {0}")]
    Transport(String),
    #[error("LLM returned a malformed response: {0}")]
    MalformedResponse(String),
    #[error("LLM authentication failed")]
    Auth,
}

impl GatewayError {
    /// TransientLLMError vs PermanentLLMError (spec §7): transient errors
    /// are worth retrying, permanent ones are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, GatewayError::Timeout(_) | GatewayError::Transport(_))
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("learning store database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("learning store write timed out after {0}s")]
    WriteTimeout(f64),
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error("input file could not be read: {0}")]
    UnreadableInput(String),
    #[error("learning store is unavailable: {0}")]
    Store(#[from] StoreError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("batch {batch_id} exceeded max error ratio ({observed:.2} > {limit:.2})")]
    ErrorRatioExceeded {
        batch_id: i64,
        observed: f64,
        limit: f64,
    },
    #[error("batch commit failed twice for batch {0}, job marked failed")]
    CommitRetryExhausted(i64),
}
