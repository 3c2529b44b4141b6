//! Transmitter CLI - Main entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use transmitter_core::ScopeKey;
use transmitter_dispatch::App;

#[derive(Parser)]
#[command(name = "transmitter")]
#[command(about = "Transmitter - serialized study record event processing", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "./transmitter.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dispatch recorded notifications concurrently
    Replay {
        /// JSONL file with one inbound request per line
        requests: PathBuf,
    },

    /// Show the ledger history of a record
    Facts {
        #[arg(long)]
        tenant: String,
        #[arg(long)]
        project: String,
        #[arg(long)]
        record: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let app = App::from_file(&cli.config)?;

    match cli.command {
        Commands::Replay { requests } => {
            let requests = App::read_requests(&requests)?;
            let summary: Vec<(String, String)> = requests
                .iter()
                .map(|r| (r.route.clone(), record_label(&r.payload)))
                .collect();

            let responses = app.dispatcher.dispatch_all(requests).await;

            for ((route, record), response) in summary.iter().zip(&responses) {
                println!("{}\t{}\t{}", route, record, response.status);
            }
            let failed = responses.iter().filter(|r| !r.is_success()).count();
            println!("Replayed {} requests ({} not successful)", responses.len(), failed);
        }

        Commands::Facts {
            tenant,
            project,
            record,
        } => {
            let scope = ScopeKey::new(tenant, project, record)?;
            let facts = app.facts(&scope)?;

            if facts.is_empty() {
                println!("No facts for {}", scope);
            }
            for fact in facts {
                println!(
                    "{}\t#{}\t{}\t{}",
                    fact.recorded_at.to_rfc3339(),
                    fact.sequence,
                    fact.attribute,
                    fact.value
                );
            }
        }
    }

    Ok(())
}

fn record_label(payload: &serde_json::Value) -> String {
    match payload.get("record") {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "-".to_string(),
    }
}
