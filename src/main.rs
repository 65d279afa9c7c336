use clap::Parser;
use leadscout_core::cascade::Cascade;
use leadscout_core::config::{Config, ConfigFile, Mode};
use leadscout_core::gateway::{Gateway, HttpLlmClient};
use leadscout_core::job_store::JobStore;
use leadscout_core::jobs::JobRunner;
use leadscout_core::learning_store::LearningStore;
use leadscout_core::model::InputRow;
use std::sync::Arc;
use tracing::{error, info, warn, Level};

#[derive(Parser, Debug)]
#[command(name = "leadscout-core")]
#[command(about = "Batch ethnicity classification for director name lists")]
struct Args {
    /// Directory holding the learning-store database
    #[arg(short, long, default_value = "./data")]
    data_dir: String,

    /// Path to the input spreadsheet (xlsx/csv row parsing is an external
    /// concern; this binary expects already-parsed JSON rows for now)
    #[arg(short, long)]
    input_file: Option<String>,

    /// TOML file of config overrides, applied before the flags below
    #[arg(long)]
    config_file: Option<String>,

    /// Threshold preset
    #[arg(long, value_enum, env = "LEADSCOUT_MODE")]
    mode: Option<Mode>,

    /// Rows committed per durable batch
    #[arg(long, env = "LEADSCOUT_BATCH_SIZE")]
    batch_size: Option<usize>,

    /// Concurrent row classifications in flight
    #[arg(long, env = "LEADSCOUT_ROW_PARALLELISM")]
    row_parallelism: Option<usize>,

    /// Concurrent LLM calls in flight
    #[arg(long, env = "LEADSCOUT_LLM_CONCURRENCY")]
    llm_concurrency: Option<usize>,

    /// LLM call timeout in seconds
    #[arg(long, env = "LEADSCOUT_LLM_TIMEOUT_S")]
    llm_timeout_s: Option<f64>,

    /// Abort the job once this fraction of rows have errored
    #[arg(long, env = "LEADSCOUT_MAX_ERROR_RATIO")]
    max_error_ratio: Option<f64>,

    /// Disable the LLM fallback tier entirely (rule/phonetic/learned only)
    #[arg(long)]
    no_llm: bool,

    /// LLM endpoint URL, required unless --no-llm is set
    #[arg(long)]
    llm_endpoint: Option<String>,

    /// LLM API key, required unless --no-llm is set
    #[arg(long, env = "LEADSCOUT_LLM_API_KEY")]
    llm_api_key: Option<String>,

    /// LLM model identifier
    #[arg(long, default_value = "gpt-4o-mini")]
    llm_model: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = Config {
        db_path: format!("{}/leadscout.db", args.data_dir),
        ..Config::default()
    };

    if let Some(path) = &args.config_file {
        match ConfigFile::load(path) {
            Ok(file) => config = file.apply(config),
            Err(err) => {
                error!(path = %path, error = %err, "failed to load config file");
                std::process::exit(1);
            }
        }
    }

    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    if args.no_llm {
        config.enable_llm = false;
    }
    if let Some(v) = args.batch_size {
        config.batch_size = v;
    }
    if let Some(v) = args.row_parallelism {
        config.row_parallelism = v;
    }
    if let Some(v) = args.llm_concurrency {
        config.llm_concurrency = v;
    }
    if let Some(v) = args.llm_timeout_s {
        config.llm_timeout_s = v;
    }
    if let Some(v) = args.max_error_ratio {
        config.max_error_ratio = v;
    }

    info!(mode = ?config.mode, "starting leadscout-core");

    let pool = match leadscout_core::db::connect(&config.db_path).await {
        Ok(pool) => pool,
        Err(err) => {
            error!(error = %err, "failed to open learning store database");
            std::process::exit(1);
        }
    };

    let learning_store = Arc::new(LearningStore::new(pool.clone()));

    let gateway = if config.enable_llm {
        match (&args.llm_endpoint, &args.llm_api_key) {
            (Some(endpoint), Some(api_key)) => {
                let client = Arc::new(HttpLlmClient::new(
                    endpoint.clone(),
                    api_key.clone(),
                    args.llm_model.clone(),
                ));
                Some(Gateway::new(client, config.llm_concurrency, config.llm_timeout_s))
            }
            _ => {
                warn!("LLM enabled but --llm-endpoint/--llm-api-key not set, disabling LLM tier");
                None
            }
        }
    } else {
        None
    };

    let cascade = Cascade::new(&config, learning_store, gateway);
    let job_store = JobStore::new(pool);
    let runner = JobRunner::new(cascade, job_store, &config);

    let Some(input_path) = args.input_file else {
        info!("no --input-file given, exiting after startup checks");
        return;
    };

    let bytes = match std::fs::read(&input_path) {
        Ok(bytes) => bytes,
        Err(err) => {
            error!(path = %input_path, error = %err, "could not read input file");
            std::process::exit(1);
        }
    };

    let rows: Vec<InputRow> = match serde_json::from_slice(&bytes) {
        Ok(rows) => rows,
        Err(err) => {
            error!(error = %err, "input file is not a JSON array of rows");
            std::process::exit(1);
        }
    };

    match runner.run(&bytes, rows).await {
        Ok(outputs) => {
            let snapshot = runner.cascade().stats.snapshot();
            info!(
                total = snapshot.total_classifications,
                llm_usage_rate = snapshot.llm_usage_rate,
                learned_hit_rate = snapshot.learned_hit_rate,
                llm_cost_usd = snapshot.llm_cost_usd,
                "job complete"
            );
            match serde_json::to_string_pretty(&outputs) {
                Ok(json) => println!("{json}"),
                Err(err) => error!(error = %err, "failed to serialize output rows"),
            }
        }
        Err(err) => {
            error!(error = %err, "job failed");
            std::process::exit(1);
        }
    }
}
