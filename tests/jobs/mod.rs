use leadscout_core::cascade::Cascade;
use leadscout_core::config::Config;
use leadscout_core::db;
use leadscout_core::job_store::JobStore;
use leadscout_core::jobs::JobRunner;
use leadscout_core::learning_store::LearningStore;
use leadscout_core::model::InputRow;
use std::sync::Arc;

async fn runner(config: &Config, db_path: &std::path::Path) -> JobRunner {
    let pool = db::connect(db_path.to_str().unwrap()).await.unwrap();
    let store = Arc::new(LearningStore::new(pool.clone()));
    let cascade = Cascade::new(config, store, None);
    let job_store = JobStore::new(pool);
    JobRunner::new(cascade, job_store, config)
}

fn row(name: &str) -> InputRow {
    InputRow {
        director_name: name.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn a_clean_run_classifies_every_row_and_records_output() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.enable_llm = false;
    let runner = runner(&config, &dir.path().join("jobs.db")).await;

    let rows: Vec<InputRow> = (0..20)
        .map(|i| row(&format!("Bongani Mthembu {i}")))
        .collect();
    let outputs = runner.run(b"clean-run-fixture", rows).await.unwrap();
    assert_eq!(outputs.len(), 20);
}

#[tokio::test]
async fn killing_and_resuming_a_job_skips_already_committed_rows() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("resume.db");
    let input_bytes = b"kill-and-resume-fixture";

    let rows: Vec<InputRow> = (0..9).map(|i| row(&format!("Priya Pillay {i}"))).collect();

    // First "run" only processes the first batch, simulating a crash after
    // the initial commit: batch_size = 3 means three rows are durably
    // committed before we stop driving this runner instance.
    {
        let mut config = Config::default();
        config.enable_llm = false;
        config.batch_size = 3;
        let first_runner = runner(&config, &db_path).await;
        let _ = first_runner
            .run(input_bytes, rows[..3].to_vec())
            .await
            .unwrap();
    }

    // A fresh runner instance against the same database and the FULL row
    // set, keyed by the same input hash, should resume from row 3 onward
    // rather than reprocessing the first batch.
    {
        let mut config = Config::default();
        config.enable_llm = false;
        config.batch_size = 3;
        let second_runner = runner(&config, &db_path).await;
        let outputs = second_runner.run(input_bytes, rows.clone()).await.unwrap();
        assert_eq!(outputs.len(), 6, "only the remaining 6 rows should be (re)classified");
    }
}

#[tokio::test]
async fn different_input_bytes_create_independent_jobs() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("independent.db");
    let mut config = Config::default();
    config.enable_llm = false;
    let runner = runner(&config, &db_path).await;

    let rows_a = vec![row("Anita Reddy")];
    let rows_b = vec![row("Johannes Botha"), row("Sarah Wilson")];

    let out_a = runner.run(b"fixture-a", rows_a).await.unwrap();
    let out_b = runner.run(b"fixture-b", rows_b).await.unwrap();
    assert_eq!(out_a.len(), 1);
    assert_eq!(out_b.len(), 2);
}
