//! Resumable batch job runner (spec §4.7, §5, component C7).
//!
//! Streams input rows through the cascade with bounded per-row parallelism,
//! commits each batch durably before moving on, and enforces the error
//! ratio ceiling. Grounded in the teacher's `jobs.rs` dispatch loop, but
//! replacing its in-process mpsc queue with a straight `buffer_unordered`
//! stream: row classification is CPU-light and I/O-bound on the LLM
//! gateway, so there is no consumer task to hand work off to — every row is
//! already an independent future.

use crate::cascade::Cascade;
use crate::config::Config;
use crate::error::JobError;
use crate::job_store::{JobStatus, JobStore};
use crate::model::{Classification, InputRow, OutputRow};
use futures::stream::{self, StreamExt};
use sha2::{Digest, Sha256};

pub struct JobRunner {
    cascade: Cascade,
    job_store: JobStore,
    batch_size: usize,
    row_parallelism: usize,
    max_error_ratio: f64,
}

impl JobRunner {
    pub fn new(cascade: Cascade, job_store: JobStore, config: &Config) -> Self {
        Self {
            cascade,
            job_store,
            batch_size: config.batch_size.max(1),
            row_parallelism: config.row_parallelism.max(1),
            max_error_ratio: config.max_error_ratio,
        }
    }

    /// Run (or resume) a job over `rows`, parsed upstream from whatever
    /// spreadsheet format the caller reads. `input_bytes` is the raw file
    /// content, hashed to identify the job for resumption — the same
    /// "identity by content hash" approach the teacher's ingester uses for
    /// files (spec §4.7).
    pub async fn run(
        &self,
        input_bytes: &[u8],
        rows: Vec<InputRow>,
    ) -> Result<Vec<OutputRow>, JobError> {
        let input_hash = hex::encode(Sha256::digest(input_bytes));
        let job = self
            .job_store
            .get_or_create_job(&input_hash, rows.len() as i64)
            .await?;

        if job.status == JobStatus::Completed {
            tracing::info!(job_id = %job.job_id, "job already completed, nothing to resume");
        }

        let resume_from = (job.last_committed_row + 1) as usize;
        let mut outputs: Vec<OutputRow> = Vec::with_capacity(rows.len());
        let mut error_count = job.error_count;
        let mut last_committed_row = job.last_committed_row;

        let pending: Vec<(usize, InputRow)> = rows
            .iter()
            .cloned()
            .enumerate()
            .skip(resume_from)
            .collect();

        for batch in pending.chunks(self.batch_size) {
            let classified: Vec<(usize, InputRow, Classification)> = stream::iter(batch.to_vec())
                .map(|(index, row)| {
                    let cascade = &self.cascade;
                    async move {
                        let classification = cascade.classify_name(&row.director_name).await;
                        (index, row, classification)
                    }
                })
                .buffer_unordered(self.row_parallelism)
                .collect()
                .await;

            let mut ordered = classified;
            ordered.sort_by_key(|(index, _, _)| *index);

            let batch_errors = ordered
                .iter()
                .filter(|(_, _, c)| c.error.is_some())
                .count() as i64;
            error_count += batch_errors;

            let commit_rows: Vec<(i64, String, Classification)> = ordered
                .iter()
                .map(|(index, row, c)| (*index as i64, row.director_name.clone(), c.clone()))
                .collect();

            let batch_max_row = ordered
                .iter()
                .map(|(i, _, _)| *i as i64)
                .max()
                .unwrap_or(last_committed_row);

            // A failed commit is retried once before the job is given up on
            // and marked failed (spec §7): a single transient database
            // hiccup shouldn't abort an otherwise-healthy job.
            let first_attempt = self
                .job_store
                .commit_batch(&job.job_id, &commit_rows, batch_max_row, error_count)
                .await;
            let commit_result = match first_attempt {
                Ok(batch_id) => Ok(batch_id),
                Err(first_err) => {
                    tracing::warn!(error = %first_err, batch_row = batch_max_row, "batch commit failed, retrying once");
                    self.job_store
                        .commit_batch(&job.job_id, &commit_rows, batch_max_row, error_count)
                        .await
                }
            };

            if commit_result.is_err() {
                self.job_store.mark_status(&job.job_id, JobStatus::Failed).await?;
                return Err(JobError::CommitRetryExhausted(batch_max_row));
            }
            last_committed_row = batch_max_row;

            let observed_ratio = if job.total_rows > 0 {
                error_count as f64 / job.total_rows as f64
            } else {
                0.0
            };
            if observed_ratio > self.max_error_ratio {
                self.job_store.mark_status(&job.job_id, JobStatus::Failed).await?;
                return Err(JobError::ErrorRatioExceeded {
                    batch_id: last_committed_row,
                    observed: observed_ratio,
                    limit: self.max_error_ratio,
                });
            }

            for (_, row, classification) in ordered {
                outputs.push(OutputRow::from_classification(row, classification));
            }
        }

        self.job_store.mark_status(&job.job_id, JobStatus::Completed).await?;
        Ok(outputs)
    }

    pub fn job_store(&self) -> &JobStore {
        &self.job_store
    }

    pub fn cascade(&self) -> &Cascade {
        &self.cascade
    }
}
