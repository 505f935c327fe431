use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use weather_predictor::{
    GsodDatasetLoader, GsodModelSource, PersistentCache, PredictionService, PredictorConfig,
    PredictorError, logging, web,
};

#[derive(Debug, Parser)]
#[command(name = "weather-predictor", version, about = "Weather type prediction service")]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging for this crate
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Train on startup if needed, then serve the HTTP API (default)
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
    /// Retrain the model once and print its accuracy
    Train,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<PredictorError>() {
                Some(e) => eprintln!("{}", e.user_message()),
                None => eprintln!("Error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = PredictorConfig::load_from_path(cli.config)?;
    logging::init(&config.logging, cli.verbose)?;

    let cache = PersistentCache::open(&config.cache.location)?;
    let loader = GsodDatasetLoader::new(config.dataset.clone(), config.model.seed, cache.clone())?;
    let source = GsodModelSource::new(loader, cache, config.model.clone());
    let service = Arc::new(PredictionService::new(Arc::new(source)));

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            service.warm_up().await?;
            web::run(&config.server, service).await
        }
        Command::Train => {
            let accuracy = service.retrain().await?;
            info!("Training finished");
            println!("Model successfully trained (accuracy {accuracy:.4})");
            Ok(())
        }
    }
}
