mod config;
mod records_cmd;
mod scan_cmd;
mod status_cmd;
mod terminal_output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use shelfcount_config::{config_dir, config_file_path, load_and_prepare, redacted_snapshot};
use shelfcount_gateway::{start_server, GatewayState};
use shelfcount_logging::init_logger;
use shelfcount_media::ImagePreprocessor;
use shelfcount_pipeline::UploadPipeline;
use shelfcount_store::SqliteTallyStore;
use shelfcount_understanding::OpenAiVisionClient;

use config::Settings;

#[derive(Parser)]
#[command(name = "shelfcount")]
#[command(about = "Count grocery items in photos and keep running tallies")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.shelfcount/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Check whether a server is running
    Status,
    /// Print all tallies
    Records {
        /// SQLite database path
        #[arg(long)]
        db: Option<String>,
    },
    /// Count the items in one local image and record them
    Scan {
        file: PathBuf,
        /// Use this answer instead of calling the vision model
        #[arg(long)]
        answer: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run(Cli::parse()).await {
        terminal_output::note_error(&format!("{err:#}"));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli
        .config
        .unwrap_or_else(|| config_file_path(&config_dir()));
    let (file_config, report) = load_and_prepare(&config_path).await?;
    let settings = Settings::from_config(&file_config)?;

    init_logger(settings.log_dir.as_deref(), &settings.log_level);
    for warning in &report.warnings {
        warn!(path = %warning.path, message = %warning.message, "Config warning");
    }

    match cli.command {
        Commands::Serve { port } => {
            let settings = Settings {
                port: port.unwrap_or(settings.port),
                ..settings
            };
            info!(config = %redacted_snapshot(&file_config), "Effective config");
            run_server(settings).await?;
        }
        Commands::Status => status_cmd::run(&settings).await?,
        Commands::Records { db } => {
            records_cmd::run(db.as_deref().unwrap_or(&settings.db_path)).await?;
        }
        Commands::Scan { file, answer } => {
            let outcome = scan_cmd::run(&settings, &file, answer).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    Ok(())
}

async fn run_server(settings: Settings) -> Result<()> {
    info!(
        port = settings.port,
        bind = %settings.bind_address,
        db = %settings.db_path,
        model = %settings.model,
        "Starting shelfcount"
    );

    let store = Arc::new(SqliteTallyStore::open(&settings.db_path)?);
    let recognizer = Arc::new(OpenAiVisionClient::new(settings.recognition_config()?)?);
    let pipeline = UploadPipeline::new(
        ImagePreprocessor::new(settings.preprocess_config()),
        recognizer,
        store,
    );

    start_server(
        settings.addr()?,
        GatewayState::new(Arc::new(pipeline)),
        settings.max_upload_bytes,
    )
    .await
}
