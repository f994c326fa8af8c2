//! # Workledger CLI
//!
//! ```bash
//! workledger serve       # Start the API server (runs migrations first)
//! workledger migrate     # Apply pending migrations
//! workledger validate    # Check configuration
//! ```

mod commands;
mod config;
mod server;

use clap::{CommandFactory as _, Parser};

use crate::{commands::Commands, config::AppConfig};

/// Workledger - worklog analytics and billing
#[derive(Parser, Debug)]
#[command(name = "workledger")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level or filter directive (debug, info, warn, error)
    #[arg(short = 'L', long, global = true, env = "RUST_LOG", default_value = "info")]
    log_level: String,

    /// Output format (json, pretty, compact)
    #[arg(long, global = true, env = "WORKLEDGER_LOG_FORMAT", default_value = "pretty")]
    log_format: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if let Commands::Completions(args) = &cli.command {
        commands::completions::completions(args.shell, &mut Cli::command());
        return Ok(());
    }

    let _guard = logging::init(&cli.log_level, &cli.log_format, None)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    match cli.command {
        Commands::Serve(args) => server::serve(AppConfig::from_env()?, &args).await,
        Commands::Migrate(args) => {
            let database_url =
                std::env::var("DATABASE_URL").unwrap_or_else(|_| config::DEFAULT_DATABASE_URL.to_string());
            commands::migrate::migrate(&database_url, &args).await
        },
        Commands::Validate => commands::validate::validate(&AppConfig::from_env()?).await,
        Commands::Completions(_) => Ok(()),
    }
}
