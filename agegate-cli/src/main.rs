//! Agegate Command Line Interface
//!
//! Configuration is loaded from environment variables (via .env file).
//! Command-line arguments override environment variables.
//!
//! Usage:
//!   agegate serve     - Start the verification API server
//!   agegate status    - Show server health and store statistics

use agegate_api::{create_push_gateway, run_server, ApiConfig, PushConfig, WebhookCredentials};
use agegate_store::{MemoryStore, SledStore, StoreConfig, VerificationStore};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "agegate")]
#[command(about = "Age verification webhook service CLI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the verification API server
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "0.0.0.0", env = "AGEGATE_HOST")]
        host: String,
        /// Port to listen on
        #[arg(short, long, default_value = "8080", env = "AGEGATE_PORT")]
        port: u16,
        /// Data directory for the persistent store
        #[arg(short, long, default_value = "./agegate_data", env = "AGEGATE_DATA_DIR")]
        data_dir: String,
        /// Use the in-memory store instead of sled
        #[arg(long)]
        memory: bool,
        /// Disable permissive CORS
        #[arg(long)]
        no_cors: bool,
    },

    /// Show server status
    Status {
        /// API server URL
        #[arg(
            short,
            long,
            default_value = "http://localhost:8080",
            env = "AGEGATE_API_URL"
        )]
        api_url: String,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(cli.verbose);

    if let Err(e) = run_command(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run_command(cli: Cli) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    match cli.command {
        Commands::Serve {
            host,
            port,
            data_dir,
            memory,
            no_cors,
        } => {
            let store: Arc<dyn VerificationStore> = if memory {
                println!("Using in-memory store (data is lost on shutdown)");
                Arc::new(MemoryStore::new())
            } else {
                println!("Opening store at {}...", data_dir);
                Arc::new(SledStore::new(&StoreConfig { data_dir })?)
            };

            let push = create_push_gateway(&PushConfig::from_env());

            let credentials = WebhookCredentials::from_env();
            if credentials.username.is_empty() && credentials.password.is_empty() {
                tracing::warn!(
                    "AGEGATE_WEBHOOK_USERNAME/AGEGATE_WEBHOOK_PASSWORD are unset; \
                     all webhook deliveries will be rejected"
                );
            }

            let config = ApiConfig {
                host,
                port,
                enable_cors: !no_cors,
            };

            println!(
                "Starting agegate API server on {}:{}...",
                config.host, config.port
            );
            run_server(&config, store, push, credentials).await?;
            Ok(())
        }

        Commands::Status { api_url } => {
            println!("Checking agegate server at {}...", api_url);

            let client = reqwest::Client::new();

            let health = client
                .get(format!("{}/health", api_url))
                .send()
                .await?
                .json::<serde_json::Value>()
                .await?;
            println!("Health: {}", serde_json::to_string_pretty(&health)?);

            let stats = client
                .get(format!("{}/api/v1/stats", api_url))
                .send()
                .await?
                .json::<serde_json::Value>()
                .await?;
            println!("Stats: {}", serde_json::to_string_pretty(&stats)?);

            Ok(())
        }
    }
}

/// Initialize logging with tracing
fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "agegate=debug,agegate_api=debug,agegate_store=debug,tower_http=debug"
    } else {
        "agegate=info,agegate_api=info,agegate_store=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
