mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ladder_core::LadderError;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ladder")]
#[command(about = "Versioned SQL schema migrations for PostgreSQL", version)]
struct Cli {
    /// Directory containing the migration scripts
    #[arg(long, global = true, default_value = "migrations")]
    dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate the database to a target version
    Migrate {
        /// Target version; defaults to the latest available up-migration
        target: Option<i64>,
    },

    /// Show applied/pending state of every migration
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a new up/down migration pair
    New {
        /// Migration name
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), LadderError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Migrate { target } => {
            commands::migrate::run(&cli.dir, target).await?;
        }
        Commands::Status { json } => {
            commands::migrate::status(&cli.dir, json).await?;
        }
        Commands::New { name } => {
            commands::migrate::create(&cli.dir, &name).await?;
        }
    }

    Ok(())
}
