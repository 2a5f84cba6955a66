use clap::Parser;
use medrem_core::{JsonlIntakeLog, ReminderEngine, ScheduleDocument, ScheduleSource, TomlScheduleSource};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod auth;
mod error;
mod routes;
mod state;

use state::AppState;

#[derive(Parser)]
#[command(name = "medremd")]
#[command(about = "Medication reminder API server", long_about = None)]
struct Cli {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1:5001")]
    bind: SocketAddr,

    /// Override data directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Override schedule file path (default: <data-dir>/reminder.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Bearer token required on protected routes; falls back to
    /// MEDREM_AUTH_TOKEN. Unset runs the API open.
    #[arg(long)]
    auth_token: Option<String>,

    /// Default log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Write an example schedule to the config path and exit
    #[arg(long)]
    write_example_config: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    medrem_core::logging::init_with_level(&cli.log_level);

    let data_dir = cli.data_dir.unwrap_or_else(default_data_dir);
    let config_path = cli
        .config
        .unwrap_or_else(|| data_dir.join("reminder.toml"));

    if cli.write_example_config {
        return write_example_config(&config_path);
    }

    let schedule = TomlScheduleSource::new(&config_path);
    // Fail fast on an unusable schedule. It is still re-read on every
    // request, so later edits take effect without a restart.
    schedule.load().map_err(|e| {
        format!("{e} (hint: bootstrap a schedule with --write-example-config)")
    })?;

    let log = JsonlIntakeLog::new(data_dir.join("intake_log.jsonl"));
    let engine = ReminderEngine::new(schedule, log);

    let auth_token = cli
        .auth_token
        .or_else(|| std::env::var("MEDREM_AUTH_TOKEN").ok());
    if auth_token.is_none() {
        tracing::warn!("no auth token configured; the API is open to anyone who can reach it");
    }

    let state = Arc::new(AppState { engine, auth_token });
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(cli.bind).await?;
    tracing::info!("medremd listening on {}", listener.local_addr()?);
    tracing::info!("schedule: {}", config_path.display());
    axum::serve(listener, app).await?;

    Ok(())
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("medrem")
}

fn write_example_config(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        return Err(format!(
            "refusing to overwrite existing schedule at {}",
            path.display()
        )
        .into());
    }
    let source = TomlScheduleSource::new(path);
    source.write_document(&ScheduleDocument::example())?;
    println!("Wrote example schedule to {}", path.display());
    Ok(())
}
