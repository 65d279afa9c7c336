//! SQLite pool setup and schema (spec §6). A single embedded migration run
//! on every startup — same "own the schema, apply it idempotently" approach
//! the teacher takes with its snapshot file format, just backed by `sqlx`
//! instead of hand-rolled `bincode`.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;

/// Open (creating if absent) the SQLite database at `path`, enable WAL
/// journaling for concurrent-safe writes under the job runner's bounded
/// parallelism, and apply the schema.
pub async fn connect(path: &str) -> Result<SqlitePool, sqlx::Error> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                sqlx::Error::Io(std::io::Error::new(e.kind(), e.to_string()))
            })?;
        }
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite://{path}"))?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await?;

    migrate(&pool).await?;
    Ok(pool)
}

async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS learned_classifications (
            normalized_name TEXT PRIMARY KEY,
            ethnicity       TEXT NOT NULL,
            confidence      REAL NOT NULL,
            source_method   TEXT NOT NULL,
            hit_count       INTEGER NOT NULL DEFAULT 1,
            updated_at      TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS learned_patterns (
            pattern_kind  TEXT NOT NULL,
            pattern_value TEXT NOT NULL,
            ethnicity     TEXT NOT NULL,
            support       INTEGER NOT NULL DEFAULT 0,
            confidence    REAL NOT NULL DEFAULT 0,
            active        INTEGER NOT NULL DEFAULT 0,
            updated_at    TEXT NOT NULL,
            PRIMARY KEY (pattern_kind, pattern_value, ethnicity)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS jobs (
            job_id               TEXT PRIMARY KEY,
            input_file_hash      TEXT NOT NULL UNIQUE,
            status               TEXT NOT NULL,
            total_rows           INTEGER NOT NULL,
            last_committed_row   INTEGER NOT NULL DEFAULT -1,
            last_committed_batch INTEGER NOT NULL DEFAULT 0,
            error_count          INTEGER NOT NULL DEFAULT 0,
            created_at           TEXT NOT NULL,
            updated_at           TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS job_rows (
            job_id             TEXT NOT NULL,
            row_index          INTEGER NOT NULL,
            input_name         TEXT NOT NULL,
            ethnicity          TEXT,
            confidence         REAL,
            method             TEXT,
            error_message      TEXT,
            committed_batch_id INTEGER NOT NULL,
            PRIMARY KEY (job_id, row_index)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
