//! Resumable job bookkeeping (spec §4.7, §6): job identity by input-file
//! hash, row-level outcomes, and the `last_committed_row` watermark that
//! makes a killed-and-restarted job pick up where it left off.

use crate::model::{Classification, Ethnicity, Method};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    fn parse(s: &str) -> Self {
        match s {
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Running,
        }
    }
}

pub struct JobRecord {
    pub job_id: String,
    pub status: JobStatus,
    pub total_rows: i64,
    pub last_committed_row: i64,
    pub last_committed_batch: i64,
    pub error_count: i64,
}

pub struct JobStatistics {
    pub job_id: String,
    pub status: JobStatus,
    pub total_rows: i64,
    pub rows_committed: i64,
    pub error_count: i64,
    pub method_breakdown: Vec<(Method, i64)>,
}

pub struct JobStore {
    pool: SqlitePool,
}

impl JobStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find an existing job for `input_file_hash`, or create a fresh one.
    /// The hash is the resumption key: the same input file run twice
    /// resumes instead of duplicating work (spec §4.7).
    pub async fn get_or_create_job(
        &self,
        input_file_hash: &str,
        total_rows: i64,
    ) -> Result<JobRecord, sqlx::Error> {
        if let Some(row) = sqlx::query(
            "SELECT job_id, status, total_rows, last_committed_row, last_committed_batch, error_count \
             FROM jobs WHERE input_file_hash = ?",
        )
        .bind(input_file_hash)
        .fetch_optional(&self.pool)
        .await?
        {
            return Ok(JobRecord {
                job_id: row.get("job_id"),
                status: JobStatus::parse(row.get("status")),
                total_rows: row.get("total_rows"),
                last_committed_row: row.get("last_committed_row"),
                last_committed_batch: row.get("last_committed_batch"),
                error_count: row.get("error_count"),
            });
        }

        let job_id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO jobs (job_id, input_file_hash, status, total_rows, last_committed_row, last_committed_batch, error_count, created_at, updated_at) \
             VALUES (?, ?, 'running', ?, -1, 0, 0, ?, ?)",
        )
        .bind(&job_id)
        .bind(input_file_hash)
        .bind(total_rows)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(JobRecord {
            job_id,
            status: JobStatus::Running,
            total_rows,
            last_committed_row: -1,
            last_committed_batch: 0,
            error_count: 0,
        })
    }

    /// Durably commit one batch's outcomes: every row result, tagged with
    /// the job's next `committed_batch_id`, plus the advanced watermark, in
    /// a single transaction (spec §4.7, §5 "a batch either commits in full
    /// or not at all"; spec §3 `JobRow` invariant: `committed_batch_id`
    /// monotonically increases). Returns the batch id just committed.
    pub async fn commit_batch(
        &self,
        job_id: &str,
        rows: &[(i64, String, Classification)],
        new_watermark: i64,
        new_error_count: i64,
    ) -> Result<i64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let current_batch: i64 =
            sqlx::query_scalar("SELECT last_committed_batch FROM jobs WHERE job_id = ?")
                .bind(job_id)
                .fetch_one(&mut *tx)
                .await?;
        let next_batch = current_batch + 1;

        for (row_index, input_name, classification) in rows {
            let ethnicity = if classification.ethnicity == Ethnicity::Unknown
                && classification.error.is_some()
            {
                None
            } else {
                Some(classification.ethnicity.as_str())
            };
            sqlx::query(
                "INSERT INTO job_rows (job_id, row_index, input_name, ethnicity, confidence, method, error_message, committed_batch_id) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
                 ON CONFLICT(job_id, row_index) DO UPDATE SET \
                    ethnicity = excluded.ethnicity, confidence = excluded.confidence, \
                    method = excluded.method, error_message = excluded.error_message, \
                    committed_batch_id = excluded.committed_batch_id",
            )
            .bind(job_id)
            .bind(row_index)
            .bind(input_name)
            .bind(ethnicity)
            .bind(classification.confidence)
            .bind(classification.method.as_str())
            .bind(&classification.error)
            .bind(next_batch)
            .execute(&mut *tx)
            .await?;
        }

        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query(
            "UPDATE jobs SET last_committed_row = ?, last_committed_batch = ?, error_count = ?, updated_at = ? WHERE job_id = ?",
        )
        .bind(new_watermark)
        .bind(next_batch)
        .bind(new_error_count)
        .bind(&now)
        .bind(job_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(next_batch)
    }

    pub async fn mark_status(&self, job_id: &str, status: JobStatus) -> Result<(), sqlx::Error> {
        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query("UPDATE jobs SET status = ?, updated_at = ? WHERE job_id = ?")
            .bind(status.as_str())
            .bind(&now)
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Aggregate statistics for a job, grounded in the original tool's
    /// `get_job_statistics()`.
    pub async fn get_job_statistics(&self, job_id: &str) -> Result<JobStatistics, sqlx::Error> {
        let job = sqlx::query(
            "SELECT status, total_rows, last_committed_row, error_count FROM jobs WHERE job_id = ?",
        )
        .bind(job_id)
        .fetch_one(&self.pool)
        .await?;

        let method_rows = sqlx::query(
            "SELECT method, COUNT(*) as n FROM job_rows WHERE job_id = ? AND method IS NOT NULL GROUP BY method",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;

        let method_breakdown = method_rows
            .into_iter()
            .map(|r| {
                let method: String = r.get("method");
                (Method::parse(&method), r.get::<i64, _>("n"))
            })
            .collect();

        Ok(JobStatistics {
            job_id: job_id.to_string(),
            status: JobStatus::parse(job.get("status")),
            total_rows: job.get("total_rows"),
            rows_committed: job.get::<i64, _>("last_committed_row") + 1,
            error_count: job.get("error_count"),
            method_breakdown,
        })
    }
}
