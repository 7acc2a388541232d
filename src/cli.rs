use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::database::{migrations, seed, Database};

#[derive(Parser)]
#[command(name = "fund-tracker")]
#[command(about = "Fund tracker - donation tracking API for a single fundraising fund")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve,

    #[command(about = "Apply pending schema migrations and exit")]
    Migrate,

    #[command(about = "Migrate, then insert the seed fund and account if absent")]
    Seed,
}

pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => crate::server::serve(config).await,
        Commands::Migrate => {
            let db = Database::connect_lazy(&config.database)?;
            let applied = db.migrate().await?;
            println!(
                "Applied {} migration(s); schema at version {}",
                applied,
                migrations::latest_version()
            );
            db.close().await;
            Ok(())
        }
        Commands::Seed => {
            let db = Database::connect_lazy(&config.database)?;
            db.migrate().await?;
            let report = seed::seed(&db, config.fund.active_fund_id).await?;
            println!(
                "Seed fund {}: {}, seed account: {}",
                config.fund.active_fund_id,
                if report.fund_created { "created" } else { "already present" },
                if report.account_created { "created" } else { "already present" },
            );
            db.close().await;
            Ok(())
        }
    }
}
