//! Minimal LTI 1.3 Tool - Entry Point

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use lti_tool::{config::Config, server::ToolServer};

#[derive(Parser, Debug)]
#[command(name = "lti-tool")]
#[command(about = "Minimal LTI 1.3 tool: OIDC launch, JWKS and AGS grade passback")]
#[command(version)]
struct Cli {
    /// HTTP server port
    #[arg(long, default_value = "5000", env = "PORT")]
    port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        subscriber.with(tracing_subscriber::fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is normal outside development.
    let dotenv_path = dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs);

    if let Some(path) = dotenv_path {
        tracing::debug!(path = %path.display(), "Loaded .env");
    }

    let config = Config::from_env()?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = ?config.environment,
        base_url = %config.tool_base_url,
        "Starting LTI tool"
    );

    if config.secret_key == lti_tool::config::defaults::SECRET_KEY {
        tracing::warn!("SECRET_KEY is not set; cookies are signed with the development key");
    }

    let server = ToolServer::new(config)?;
    server.run_http(cli.port).await
}
