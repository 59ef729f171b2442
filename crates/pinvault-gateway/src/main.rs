//! Pinvault Gateway - PIN-locked access to one Google Drive folder

use clap::Parser;
use pinvault_gateway::{config::DEFAULT_CREDENTIALS_PATH, run_server, GatewayConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "pinvault-gateway")]
#[command(about = "PIN-locked HTTP gateway for a single Google Drive folder")]
#[command(version)]
struct Args {
    /// Host to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0", env = "HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "3000", env = "PORT")]
    port: u16,

    /// Shared PIN required by the data routes
    #[arg(long, env = "LOCK_PIN", hide_env_values = true)]
    pin: Option<String>,

    /// ID of the Drive folder to expose
    #[arg(long, env = "LOCKED_FOLDER_ID")]
    folder_id: Option<String>,

    /// Service-account key file
    #[arg(long, default_value = DEFAULT_CREDENTIALS_PATH, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    credentials: PathBuf,

    /// Requests per second per client IP (0 disables limiting)
    #[arg(long, default_value = "10", env = "PINVAULT_RATE_LIMIT_RPS")]
    rate_limit_rps: u32,

    /// Maximum request body size in bytes
    #[arg(long, default_value = "536870912", env = "PINVAULT_MAX_BODY_SIZE")]
    max_body_size: usize,

    /// Seconds to wait for the next chunk of a download
    #[arg(long, default_value = "60", env = "PINVAULT_STREAM_IDLE_TIMEOUT")]
    stream_idle_timeout: u64,

    /// Disable CORS headers
    #[arg(long, env = "PINVAULT_NO_CORS")]
    no_cors: bool,

    /// Enable debug logging
    #[arg(short, long, env = "PINVAULT_DEBUG")]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "pinvault_gateway={0},pinvault_drive={0},tower_http={0}",
                    log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = GatewayConfig {
        host: args.host,
        port: args.port,
        folder_id: args.folder_id.unwrap_or_default(),
        pin: args.pin.unwrap_or_default(),
        credentials_path: args.credentials,
        rate_limit_rps: args.rate_limit_rps,
        max_body_size: args.max_body_size,
        stream_idle_timeout_secs: args.stream_idle_timeout,
        cors_enabled: !args.no_cors,
    };

    if let Err(e) = config.validate() {
        tracing::error!("{}", e);
        std::process::exit(1);
    }

    if config.rate_limit_rps == 0 {
        tracing::warn!("Rate limiting is DISABLED");
    }

    tracing::info!("Starting Pinvault gateway on {}", config.bind_addr());

    run_server(config).await
}
