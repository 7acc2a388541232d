use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fund_tracker::cli::{self, Cli};
use fund_tracker::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so `cargo run` picks up DATABASE_URL, ADMIN_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fund_tracker=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = AppConfig::from_env()?;
    tracing::info!(
        "Starting fund tracker in {} mode (database: {})",
        config.environment.as_str(),
        fund_tracker::database::manager::redact_url(&config.database.url)
    );

    cli::run(cli, config).await
}
