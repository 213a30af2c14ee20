use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use receipt_ingest::client::{PredictionApi, ReceiptServiceClient};
use receipt_ingest::config::Config;
use receipt_ingest::logging::init_logging;
use receipt_ingest::pipeline::ReceiptPipeline;

#[derive(Parser)]
#[command(name = "receipt_ingest")]
#[command(about = "Parses receipt images into validated expense records")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a receipt image to the prediction service and build the record
    Parse {
        /// Path to the receipt image (jpg or png)
        image: PathBuf,
    },
    /// Re-run the pipeline over a stored raw prediction, no network needed
    Replay {
        /// Path to a JSON file holding a raw prediction payload
        prediction: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    let config = Config::load_or_default();
    let pipeline = ReceiptPipeline::with_config(config.pipeline.clone());

    let payload = match cli.command {
        Commands::Parse { image } => {
            let bytes = std::fs::read(&image)?;
            info!(path = %image.display(), bytes = bytes.len(), "loaded receipt image");
            let client = ReceiptServiceClient::new(&config.service)?;
            client.submit(&bytes).await?
        }
        Commands::Replay { prediction } => {
            let text = std::fs::read_to_string(&prediction)?;
            serde_json::from_str(&text)?
        }
    };

    match pipeline.process(&payload) {
        Ok(record) => {
            if !record.is_clean() {
                info!(
                    warnings = record.warnings.len(),
                    "record built with warnings, route to manual review"
                );
            }
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        Err(failure) => {
            error!(reason = %failure, "structural parse failure");
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "error": failure.reason,
                    "fragment": failure.fragment,
                }))?
            );
            std::process::exit(1);
        }
    }
}
