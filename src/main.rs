use longevity_score::config::{LoggingSettings, Settings};
use longevity_score::models::{ErrorResponse, ScoreResponse, ScoringRequest};
use longevity_score::{Catalog, DatasetError, LongevityScorer, ScoringError};
use std::io::Read;
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Failures that stop the binary
#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("catalog error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("failed to read request: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid request document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("request rejected: {0}")]
    Scoring(#[from] ScoringError),
}

impl CliError {
    fn kind(&self) -> &'static str {
        match self {
            CliError::Config(_) => "invalid_config",
            CliError::Dataset(_) => "invalid_catalog",
            CliError::Io(_) => "io_error",
            CliError::Json(_) => "invalid_json",
            CliError::Scoring(_) => "invalid_request",
        }
    }
}

fn init_logging(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    // stdout carries the response document
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

/// Read the request from the first argument, or stdin when absent
fn read_request() -> Result<ScoringRequest, CliError> {
    let text = match std::env::args().nth(1) {
        Some(path) if path != "-" => std::fs::read_to_string(path)?,
        _ => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    Ok(serde_json::from_str(&text)?)
}

fn run(settings: Settings) -> Result<ScoreResponse, CliError> {
    info!("Configuration loaded successfully");

    let params = settings.params();
    let catalog = Arc::new(Catalog::load_from_path(&settings.catalog.path, &params)?);
    info!("Catalog loaded from {} ({} biomarkers)", settings.catalog.path, catalog.len());

    let scorer = LongevityScorer::new(catalog, params, settings.thresholds());

    let request = read_request()?;
    info!("Scoring {} measurements", request.measurements.len());

    let report = scorer.score_request(&request)?;

    let biological_age = match scorer.biological_age(&request.measurements, request.age) {
        Ok(biological_age) => biological_age,
        Err(e) => {
            warn!("Skipping biological age: {}", e);
            None
        }
    };

    Ok(ScoreResponse::from(&report).with_biological_age(biological_age.as_ref()))
}

fn main() -> ExitCode {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Logging settings come from the config files unless LOG_* is set
    let settings = Settings::load();
    let logging = settings
        .as_ref()
        .map(|s| s.logging.clone())
        .unwrap_or_default()
        .with_overrides(std::env::var("LOG_LEVEL").ok(), std::env::var("LOG_FORMAT").ok());
    init_logging(&logging);

    match settings.map_err(CliError::from).and_then(run) {
        Ok(response) => match serde_json::to_string_pretty(&response) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("Failed to serialize response: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            error!("{}", e);
            let body = ErrorResponse {
                error: e.kind().to_string(),
                message: e.to_string(),
            };
            if let Ok(json) = serde_json::to_string(&body) {
                println!("{}", json);
            }
            ExitCode::FAILURE
        }
    }
}
