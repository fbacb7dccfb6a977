// ABOUTME: CLI entry point for mysql-sqlite-sync
// ABOUTME: Parses commands and routes to appropriate handlers

use clap::{Parser, Subcommand};
use mysql_sqlite_sync::commands::{self, StatusOptions, SyncOptions};

#[derive(Parser)]
#[command(name = "mysql-sqlite-sync")]
#[command(about = "One-way MySQL-to-SQLite replication CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// Set the log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy every MySQL table into the SQLite database
    Sync {
        /// MySQL connection string (mysql:// URL or user:pass@tcp(host:port)/db)
        #[arg(long, env = "MYSQL_DSN", hide_env_values = true)]
        source: String,
        /// Path to the SQLite database file
        #[arg(long, env = "DB_PATH")]
        destination: String,
        /// Print the sync report as JSON
        #[arg(long)]
        json: bool,
        /// Do not generate API keys for members after syncing
        #[arg(long)]
        skip_api_keys: bool,
    },
    /// Show when each table was last synced
    Status {
        /// Path to the SQLite database file
        #[arg(long, env = "DB_PATH")]
        destination: String,
        /// Print the status as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // 1. RUST_LOG environment variable has highest precedence
    // 2. --log flag is used if RUST_LOG is not set
    // 3. Default to "info" if neither are provided
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log.clone()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Sync {
            source,
            destination,
            json,
            skip_api_keys,
        } => {
            commands::sync::run(SyncOptions {
                source,
                destination,
                json,
                skip_api_keys,
            })
            .await
        }
        Commands::Status { destination, json } => {
            commands::status::run(StatusOptions { destination, json })
        }
    }
}
