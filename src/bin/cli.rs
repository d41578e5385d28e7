//! animesync CLI
//!
//! Local execution entry point.

use std::path::PathBuf;

use animesync::{
    error::Result,
    models::Config,
    pipeline::{self, SyncClients},
    storage::LocalStorage,
};
use clap::{Parser, Subcommand};

/// animesync - Annict to AniList library sync
#[derive(Parser, Debug)]
#[command(
    name = "animesync",
    version,
    about = "Sync Annict watch history into AniList"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one sync pass
    Sync {
        /// Compute and log updates without writing to AniList
        #[arg(long)]
        dry_run: bool,

        /// Where to write the untethered report (default: sync.report_path)
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Validate the configuration file
    Validate,

    /// Show the authenticated users of both services
    Info,
}

/// Initialize logging; `RUST_LOG` overrides the given default level.
fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = Config::load(&cli.config);
    let level = match (&loaded, cli.verbose) {
        (_, true) => "debug",
        (Ok(config), false) => config.logging.level.as_str(),
        (Err(_), false) => "info",
    };
    init_logging(level);

    let mut config = loaded.unwrap_or_else(|e| {
        log::warn!(
            "Config load failed from {}: {}. Using defaults.",
            cli.config.display(),
            e
        );
        Config::default()
    });

    match cli.command {
        Command::Sync { dry_run, report } => {
            config.sync.dry_run |= dry_run;
            if let Some(report) = report {
                config.sync.report_path = report;
            }
            config.validate()?;

            let clients = SyncClients::from_config(&config)?;
            let storage = LocalStorage::new(&config.sync.report_path);
            let summary = pipeline::run_sync(&config, &clients, &storage).await?;

            if summary.failed > 0 {
                log::warn!("{} updates failed; see the log above", summary.failed);
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
        }

        Command::Info => {
            let clients = SyncClients::from_config(&config)?;
            let (annict, anilist) = tokio::try_join!(
                clients.annict.fetch_viewer(),
                clients.anilist.fetch_viewer(),
            )?;

            log::info!("Annict user: {} (@{})", annict.name, annict.username);
            log::info!("AniList user: {} ({})", anilist.name, anilist.id);
            log::info!("Report path: {}", config.sync.report_path.display());
        }
    }

    Ok(())
}
