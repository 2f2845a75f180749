//! Template Museum CLI entry point.
//!
//! Provides `serve` and `init-db` subcommands for running the web app or
//! creating the credential store without starting the server.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use template_museum::auth::SessionStore;
use template_museum::config::MuseumConfig;
use template_museum::db::UserStore;
use template_museum::logging;
use template_museum::sandbox::SandboxedRenderer;
use template_museum::web::{self, AppState};

/// Template Museum — a deliberately vulnerable SSTI teaching app.
#[derive(Parser)]
#[command(name = "template-museum", version, about)]
struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Run the museum web server.
    Serve,
    /// Create the credential store database and exit.
    InitDb,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => handle_serve().await,
        Command::InitDb => handle_init_db().await,
    }
}

/// Run the museum web server.
async fn handle_serve() -> anyhow::Result<()> {
    let config = MuseumConfig::load().context("failed to load configuration")?;

    let _logging_guard = logging::init_production(&config.paths.logs_dir, &config.server.log_level)
        .context("failed to initialise logging")?;

    info!("Template Museum starting");
    info!("educational SSTI demo — every shell is simulated, flags are per-account practice targets");

    let store = UserStore::open(&config.paths.database)
        .await
        .context("failed to open credential store")?;
    info!(path = %config.paths.database.display(), "credential store opened");

    let sessions =
        SessionStore::new(config.session.ttl_minutes).context("invalid session configuration")?;

    let state = Arc::new(AppState {
        store,
        sessions,
        renderer: SandboxedRenderer::new(),
    });

    web::serve(state, &config.server.bind).await
}

/// Create the credential store database and exit.
async fn handle_init_db() -> anyhow::Result<()> {
    logging::init_cli();

    let config = MuseumConfig::load().context("failed to load configuration")?;
    UserStore::open(&config.paths.database)
        .await
        .context("failed to create credential store")?;

    info!(path = %config.paths.database.display(), "credential store initialised");
    Ok(())
}
