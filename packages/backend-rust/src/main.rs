use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

use nsm_backend::config::Config;
use nsm_backend::prediction::{init_prediction_service, ServingError};
use nsm_backend::response::{PredictionResponse, TrainingResponse};
use nsm_backend::{logging, training};

#[derive(Parser)]
#[command(name = "nsm")]
#[command(about = "Neural Spaced Mastery interval model", long_about = None)]
struct Cli {
    /// Directory holding the model bundles
    #[arg(long, global = true, value_name = "PATH")]
    model_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report whether a trained model is available
    Status,

    /// Predict the next interval for one JSON feature object read from stdin
    Predict,

    /// Train a new model from the training data store
    Train {
        /// Minimum number of usable examples required
        #[arg(long)]
        min_samples: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let config = Config::from_env();
    let _log_guard = logging::init_tracing(&config.log);

    let model_dir = cli.model_dir.unwrap_or(config.model_dir);

    match cli.command {
        Commands::Status => {
            let service = init_prediction_service(model_dir);
            exit_code(emit(&service.status()))
        }
        Commands::Predict => {
            let service = init_prediction_service(model_dir);
            let response = match read_stdin_json() {
                Ok(features) => service.predict_json(&features),
                Err(message) => {
                    let err = ServingError::InferenceFailure(message);
                    tracing::warn!(reason = err.kind(), error = %err, "rejected prediction input");
                    PredictionResponse::fallback(&err)
                }
            };
            exit_code(emit(&response))
        }
        Commands::Train { min_samples } => {
            let result =
                training::run_configured(|key| std::env::var(key).ok(), model_dir, min_samples)
                    .await;
            if let Err(err) = &result {
                tracing::error!(error = %err, "training failed");
            }
            let response = TrainingResponse::from(&result);
            exit_code(emit(&response) && response.is_success())
        }
    }
}

fn read_stdin_json() -> Result<serde_json::Value, String> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .map_err(|err| format!("failed to read input: {err}"))?;
    serde_json::from_str(&input).map_err(|err| format!("Invalid JSON input: {err}"))
}

fn emit<T: Serialize>(value: &T) -> bool {
    match serde_json::to_string(value) {
        Ok(json) => {
            println!("{json}");
            true
        }
        Err(err) => {
            tracing::error!(error = %err, "failed to encode response");
            false
        }
    }
}

fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
