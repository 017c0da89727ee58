pub mod config;
pub mod safety; // Input/output guardrails
pub mod triage; // Dialogue state machine + session stores
pub mod service;
pub mod console;

use std::io;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::AppSettings;
use crate::console::ConsoleError;
use crate::service::TriageService;
use crate::triage::{InMemorySessionStore, SessionStore, SqliteSessionStore, TriageError};

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(io::stderr)
        .init();
}

/// Open the session store the settings ask for.
pub fn open_store(settings: &AppSettings) -> Result<Arc<dyn SessionStore>, TriageError> {
    match &settings.session_db {
        Some(path) => {
            tracing::info!(path = %path.display(), "Using SQLite session store");
            Ok(Arc::new(SqliteSessionStore::open(path)?))
        }
        None => Ok(Arc::new(InMemorySessionStore::new())),
    }
}

pub fn run() -> Result<(), ConsoleError> {
    init_tracing();
    tracing::info!("MediMind starting v{}", config::APP_VERSION);

    let settings = AppSettings::from_env();
    let store = open_store(&settings)?;
    let service = TriageService::from_settings(&settings, store);

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    console::run(&service, stdin.lock(), &mut stdout)
}
