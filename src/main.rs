use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

mod app;
mod ui;

use app::{App, AppEvent};
use stormwatch::config::Config;
use stormwatch::dashboard::DashboardBuilder;
use stormwatch::feed::{HttpTextSource, TextSource};
use stormwatch::storage::{Database, DatabaseError, ToggleStore, TOGGLES_KEY};

/// Get the config directory path (~/.config/stormwatch/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let config_dir = PathBuf::from(home).join(".config").join("stormwatch");
    Ok(config_dir)
}

#[derive(Parser, Debug)]
#[command(
    name = "stormwatch",
    about = "Terminal dashboard of SPC storm reports, maps, RSS and report tables"
)]
struct Args {
    /// Configuration file (default: ~/.config/stormwatch/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// State database holding widget toggles (default: ~/.config/stormwatch/state.db)
    #[arg(long, value_name = "FILE")]
    state: Option<PathBuf>,

    /// Forget every saved widget and group toggle before starting
    #[arg(long)]
    reset_state: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; set RUST_LOG=stormwatch=debug and redirect 2> to keep
    // them off the dashboard.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        println!("Created config directory: {}", config_dir.display());
    }

    // SEC-007: Set directory permissions on Unix (user-only access)
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(&config_dir) {
            Ok(metadata) => {
                let mut perms = metadata.permissions();
                perms.set_mode(0o700);
                if let Err(e) = std::fs::set_permissions(&config_dir, perms) {
                    tracing::warn!(
                        path = %config_dir.display(),
                        error = %e,
                        "Failed to set config directory permissions to 0700"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = %config_dir.display(),
                    error = %e,
                    "Failed to read config directory metadata"
                );
            }
        }
    }

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    // Open database
    let db_path = args.state.clone().unwrap_or_else(|| config_dir.join("state.db"));
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: Another instance of stormwatch appears to be running. Please close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) => {
            return Err(anyhow::anyhow!("Failed to open database: {}", e));
        }
    };

    // Handle --reset-state flag
    if args.reset_state {
        let removed = db
            .delete_preference(TOGGLES_KEY)
            .await
            .context("Failed to reset saved toggles")?;
        tracing::info!(removed, "Reset saved toggle state");
        println!("Saved toggles reset.");
    }

    let source: Arc<dyn TextSource> =
        Arc::new(HttpTextSource::from_config(&config).context("Failed to create HTTP client")?);

    let (dashboard, initial_jobs) = DashboardBuilder::from_config(&config)
        .build(ToggleStore::new(db))
        .await;

    let mut app = App::new(dashboard, source);

    // Create event channel for background tasks
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);

    // Run the TUI
    ui::run(&mut app, initial_jobs, event_tx, event_rx).await?;

    Ok(())
}
