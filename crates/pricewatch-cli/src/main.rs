use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod acquire;
mod license;

#[derive(Debug, Parser)]
#[command(name = "pricewatch")]
#[command(about = "Multi-source product price tracker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Acquire products by identifier, with source fallback
    Acquire(acquire::AcquireArgs),
    /// Acquire search-result candidates for a keyword
    AcquireCategory {
        /// Search keyword
        #[arg(long)]
        keyword: String,
    },
    /// Run pending database migrations
    Migrate,
    /// License administration
    License {
        #[command(subcommand)]
        command: license::LicenseCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = pricewatch_core::load_app_config().context("loading configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    let cli = Cli::parse();

    let pool = pricewatch_db::connect_pool(
        &config.database_url,
        pricewatch_db::PoolConfig::from_app_config(&config),
    )
    .await
    .context("connecting to database")?;

    match cli.command {
        Commands::Acquire(args) => acquire::run_acquire(&pool, &config, args).await,
        Commands::AcquireCategory { keyword } => {
            acquire::run_acquire_category(&pool, &config, &keyword).await
        }
        Commands::Migrate => {
            let applied = pricewatch_db::run_migrations(&pool)
                .await
                .context("running migrations")?;
            println!("applied {applied} migrations");
            Ok(())
        }
        Commands::License { command } => license::run(&pool, command).await,
    }
}
