//! CLI entry point for the transit lake pipeline.
//!
//! Each stage is its own subcommand and is run by hand, in order:
//! `ingest` → `clean` → `aggregate` → `train`, then `predict` (or `routes`)
//! against the trained artifact.

use anyhow::{Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use transit_lake::config::{ColumnMapping, LakeConfig};
use transit_lake::error::PipelineError;
use transit_lake::infra::FileSource;
use transit_lake::infra::socrata::{DEFAULT_ENDPOINT, DEFAULT_ROW_LIMIT, SocrataClient};
use transit_lake::model::artifact::DEFAULT_MODEL_PATH;
use transit_lake::model::crowd::crowd_level;
use transit_lake::model::split::SplitConfig;
use transit_lake::model::{ModelArtifact, TrainOptions, run_training};
use transit_lake::output::{DEFAULT_RUN_LOG, TrainingRun, append_record};
use transit_lake::pipeline::stages::{run_aggregation, run_cleaning, run_ingestion};
use transit_lake::services::transit_api::{DateRange, TransitApi};
use transit_lake::storage::{self, Container, ObjectStore, objects};

#[derive(Parser)]
#[command(name = "transit_lake")]
#[command(about = "Bronze/Silver/Gold ETL and ridership model for transit data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch raw ridership for a date range into Bronze
    Ingest {
        /// First service date (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,

        /// Last service date, inclusive (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,

        /// Socrata dataset endpoint
        #[arg(long, default_value = DEFAULT_ENDPOINT)]
        endpoint: String,

        /// Maximum number of rows requested
        #[arg(short, long, default_value_t = DEFAULT_ROW_LIMIT)]
        limit: usize,

        /// Stop reading after this many bytes (cut at a line boundary)
        #[arg(long)]
        max_bytes: Option<usize>,

        /// Load a local export instead of calling the API
        #[arg(long, value_name = "FILE")]
        from_file: Option<PathBuf>,

        /// JSON column mapping override
        #[arg(long, value_name = "FILE")]
        columns: Option<String>,
    },
    /// Clean Bronze into Silver
    Clean {
        /// JSON column mapping override
        #[arg(long, value_name = "FILE")]
        columns: Option<String>,
    },
    /// Aggregate Silver into Gold
    Aggregate,
    /// Clean then aggregate in one run
    Process {
        /// JSON column mapping override
        #[arg(long, value_name = "FILE")]
        columns: Option<String>,
    },
    /// Train the ridership model on Gold
    Train {
        /// Where to write the model artifact
        #[arg(short, long, default_value = DEFAULT_MODEL_PATH)]
        output: PathBuf,

        /// CSV file that receives one row per training run
        #[arg(long, default_value = DEFAULT_RUN_LOG)]
        run_log: PathBuf,

        /// Fraction of Gold used for fitting
        #[arg(long, default_value_t = 0.8)]
        train_ratio: f64,

        /// Seed for the training/holdout split
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Ridge penalty
        #[arg(long, default_value_t = 1.0)]
        lambda: f64,

        /// Also upload the artifact to the gold container
        #[arg(long, default_value_t = false)]
        publish: bool,
    },
    /// Predict ridership for a route from a trained artifact
    Predict {
        /// Route (station complex) to predict for
        #[arg(short, long)]
        route: String,

        /// Service date (defaults to today)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Hour of day
        #[arg(long, default_value_t = 12, value_parser = clap::value_parser!(u32).range(0..24))]
        hour: u32,

        /// Print every hour of the day
        #[arg(long, default_value_t = false)]
        forecast: bool,

        /// Model artifact to load
        #[arg(short, long, default_value = DEFAULT_MODEL_PATH)]
        model: PathBuf,
    },
    /// List the routes a trained artifact can predict for
    Routes {
        /// Model artifact to load
        #[arg(short, long, default_value = DEFAULT_MODEL_PATH)]
        model: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok(); // Load .env file

    let _file_guard = match init_logging() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("failed to initialise logging: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let cli = Cli::parse();

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err
                .downcast_ref::<PipelineError>()
                .map(|e| e.category().exit_code())
                .unwrap_or(1);
            error!(error = %format!("{err:#}"), exit_code = code, "Run failed");
            ExitCode::from(code as u8)
        }
    }
}

/// Logging setup: colored stderr + JSON rolling log file.
fn init_logging() -> Result<WorkerGuard> {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/transit_lake.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("transit_lake.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .try_init()?;

    Ok(guard)
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Ingest {
            start,
            end,
            endpoint,
            limit,
            max_bytes,
            from_file,
            columns,
        } => {
            let config = LakeConfig::from_env()?;
            let columns = load_columns(columns.as_deref())?;
            let range = DateRange::new(start, end)?;

            let api: Box<dyn TransitApi> = match from_file {
                Some(path) => Box::new(FileSource::new(path)),
                None => Box::new(
                    SocrataClient::new(&endpoint, &columns.timestamp, config.app_token.as_deref())?
                        .with_row_limit(limit)
                        .with_max_bytes(max_bytes),
                ),
            };

            let store = storage::connect(&config.storage).await?;
            let report = run_ingestion(api.as_ref(), store.as_ref(), &range)
                .await
                .context("ingestion failed")?;
            info!(bytes = report.bytes, days = range.days(), "Ingestion complete");
        }
        Commands::Clean { columns } => {
            let config = LakeConfig::from_env()?;
            let columns = load_columns(columns.as_deref())?;
            let store = storage::connect(&config.storage).await?;
            run_cleaning(store.as_ref(), &columns, config.gzip)
                .await
                .context("cleaning failed")?;
        }
        Commands::Aggregate => {
            let config = LakeConfig::from_env()?;
            let store = storage::connect(&config.storage).await?;
            run_aggregation(store.as_ref(), config.gzip)
                .await
                .context("aggregation failed")?;
        }
        Commands::Process { columns } => {
            let config = LakeConfig::from_env()?;
            let columns = load_columns(columns.as_deref())?;
            let store = storage::connect(&config.storage).await?;
            run_cleaning(store.as_ref(), &columns, config.gzip)
                .await
                .context("cleaning failed")?;
            run_aggregation(store.as_ref(), config.gzip)
                .await
                .context("aggregation failed")?;
            info!("ETL complete");
        }
        Commands::Train {
            output,
            run_log,
            train_ratio,
            seed,
            lambda,
            publish,
        } => {
            let config = LakeConfig::from_env()?;
            let store = storage::connect(&config.storage).await?;
            let options = TrainOptions {
                split: SplitConfig { train_ratio, seed },
                lambda,
            };

            let artifact = run_training(store.as_ref(), config.gzip, &options)
                .await
                .context("training failed")?;

            persist_model(&artifact, &output, publish.then_some(store.as_ref())).await?;
            append_record(&run_log, &TrainingRun::from_artifact(&artifact, &output))
                .with_context(|| format!("failed to append to {}", run_log.display()))?;

            info!(
                path = %output.display(),
                holdout_mae = ?artifact.metrics.holdout_mae,
                "Model saved"
            );
        }
        Commands::Predict {
            route,
            date,
            hour,
            forecast,
            model,
        } => {
            let artifact = ModelArtifact::load(&model)
                .with_context(|| format!("could not load model from {}", model.display()))?;
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let day_of_week = date.weekday().num_days_from_monday();

            let predicted = artifact.predict(&route, day_of_week, hour)?;
            info!(
                route = %route,
                date = %date,
                hour,
                predicted_ridership = predicted.round() as i64,
                crowd_level = %crowd_level(predicted),
                "Prediction"
            );

            if forecast {
                for (h, value) in artifact.forecast_day(&route, day_of_week)? {
                    info!(
                        hour = h,
                        ridership = value.round() as i64,
                        crowd_level = %crowd_level(value),
                        "Forecast"
                    );
                }
            }
        }
        Commands::Routes { model } => {
            let artifact = ModelArtifact::load(&model)
                .with_context(|| format!("could not load model from {}", model.display()))?;
            for route in artifact.routes() {
                info!(
                    route = %route.id,
                    borough = route.borough.as_deref().unwrap_or("-"),
                    latitude = ?route.latitude,
                    longitude = ?route.longitude,
                    "Route"
                );
            }
            info!(routes = artifact.routes().len(), "Known routes");
        }
    }

    Ok(())
}

fn load_columns(path: Option<&str>) -> Result<ColumnMapping> {
    match path {
        Some(p) => Ok(ColumnMapping::load(p)
            .with_context(|| format!("could not read column mapping {p}"))?),
        None => Ok(ColumnMapping::default()),
    }
}

/// Writes the artifact locally and, when a store is given, to the gold
/// container as well.
async fn persist_model(
    artifact: &ModelArtifact,
    path: &Path,
    publish_to: Option<&dyn ObjectStore>,
) -> Result<()> {
    artifact
        .save(path)
        .with_context(|| format!("failed to write model to {}", path.display()))?;

    if let Some(store) = publish_to {
        storage::write_json(store, Container::Gold, objects::MODEL, artifact)
            .await
            .context("failed to publish model")?;
        info!(container = %Container::Gold, object = objects::MODEL, "Model published");
    }
    Ok(())
}
