use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info};

use docverify_config::Config;
use docverify_gateway::{CookieSigner, GatewayOptions, GatewayState, SessionStore};
use docverify_understanding::GeminiProvider;

/// How often idle sessions are swept.
const REAP_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Parser)]
#[command(name = "docverify")]
#[command(about = "docverify — document extraction and handwritten form validation server")]
#[command(version)]
struct Cli {
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
    /// Query a running server's health endpoint
    Status {
        #[arg(short, long, env = "PORT", default_value_t = 3000)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            let config = match docverify_config::load() {
                Ok(config) => config,
                Err(e) => {
                    docverify_logging::init_logger(None, "info");
                    error!(error = %e, "FATAL: invalid configuration");
                    return Err(e).context("Refusing to start");
                }
            };
            docverify_logging::init_logger(config.log_dir.as_deref(), &config.log_level);

            let config = Config {
                port: port.unwrap_or(config.port),
                ..config
            };
            run_server(config).await?;
        }
        Commands::Status { port } => {
            let client = reqwest::Client::new();
            match client
                .get(format!("http://localhost:{}/api/health", port))
                .send()
                .await
            {
                Ok(resp) => {
                    let body: serde_json::Value = resp.json().await?;
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                Err(_) => {
                    println!("docverify is not running on port {}", port);
                }
            }
        }
    }

    Ok(())
}

async fn run_server(config: Config) -> Result<()> {
    info!(config = ?config, "Starting docverify");

    let provider = GeminiProvider::new(config.gemini_api_key.clone())
        .with_model(config.gemini_model.clone())
        .with_base_url(config.gemini_base_url.clone());

    let sessions = SessionStore::new(config.session_idle);
    sessions.spawn_reaper(REAP_INTERVAL);

    let state = GatewayState {
        sessions,
        cookies: CookieSigner::new(&config.session_secret, config.session_idle)?,
        provider: Arc::new(provider),
    };
    let options = GatewayOptions {
        max_upload_bytes: config.max_upload_bytes,
        static_dir: Some(config.static_dir.clone()),
    };
    let app = docverify_gateway::build_router(state, &options);

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %addr, "HTTP API listening");

    docverify_gateway::start_server(listener, app).await
}
