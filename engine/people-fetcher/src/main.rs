//! `populate-people` - load TMDb popular people into the `people` table
//!
//! Exit codes: 0 success, 1 configuration error, 2 TMDb fetch error,
//! 3 database error.

use clap::{Parser, Subcommand, ValueEnum};
use people_fetcher::{check_api, populate, CommitMode, FetcherConfig, FetcherError};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "populate-people")]
#[command(about = "Fetch popular people from TMDb and insert them into the people table")]
#[command(version)]
struct Cli {
    /// TOML configuration file; skipped if it does not exist
    #[arg(short, long, default_value = "people-fetcher.toml")]
    config: PathBuf,

    /// Override the configured commit policy
    #[arg(long, value_enum)]
    commit_mode: Option<CommitModeArg>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Fetch, transform and insert popular people (default)
    Run,

    /// Verify the API key by fetching the popular listing; the database is not touched
    CheckApi,
}

#[derive(ValueEnum, Clone, Copy)]
enum CommitModeArg {
    AtEnd,
    PerItem,
}

impl From<CommitModeArg> for CommitMode {
    fn from(arg: CommitModeArg) -> Self {
        match arg {
            CommitModeArg::AtEnd => CommitMode::AtEnd,
            CommitModeArg::PerItem => CommitMode::PerItem,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    dotenv::dotenv().ok();

    if let Err(e) = initialize_logging() {
        eprintln!("Failed to initialize logging: {e}");
    }

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn initialize_logging() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_target(false);

    tracing_subscriber::registry().with(env_filter).with(fmt_layer).try_init()?;
    Ok(())
}

async fn execute(cli: Cli) -> Result<(), FetcherError> {
    let mut config = FetcherConfig::load(&cli.config)?;
    if let Some(mode) = cli.commit_mode {
        config.pipeline.commit_mode = mode.into();
    }
    info!("Loaded configuration: {:?}", config);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let summary = populate(&config).await?;
            info!(
                "Done: {} listed, {} inserted, {} already present, {} skipped",
                summary.listed, summary.inserted, summary.already_present, summary.skipped
            );
        }
        Commands::CheckApi => {
            let people = check_api(&config).await?;
            info!("TMDb API key works, {} popular people listed", people.len());
            for (i, person) in people.iter().take(3).enumerate() {
                info!(
                    "  {}. {} ({})",
                    i + 1,
                    person.name.as_deref().unwrap_or("<unnamed>"),
                    person.known_for_department.as_deref().unwrap_or("unknown")
                );
            }
        }
    }

    Ok(())
}
