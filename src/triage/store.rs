//! Session storage behind a narrow get/put seam.
//!
//! Two backends: an in-memory map for tests and single-process use, and a
//! SQLite table holding each context as one JSON document.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use super::types::TriageContext;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session store lock poisoned")]
    LockPoisoned,
}

/// Keyed storage for triage contexts.
///
/// `get` returns an owned snapshot; changes are visible only after `put`.
/// Callers guarantee at most one writer per session at a time.
pub trait SessionStore: Send + Sync {
    fn get(&self, session_id: &str) -> Result<Option<TriageContext>, StoreError>;
    fn put(&self, ctx: &TriageContext) -> Result<(), StoreError>;
    fn remove(&self, session_id: &str) -> Result<bool, StoreError>;
    fn len(&self) -> Result<usize, StoreError>;

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl<S: SessionStore + ?Sized> SessionStore for std::sync::Arc<S> {
    fn get(&self, session_id: &str) -> Result<Option<TriageContext>, StoreError> {
        (**self).get(session_id)
    }

    fn put(&self, ctx: &TriageContext) -> Result<(), StoreError> {
        (**self).put(ctx)
    }

    fn remove(&self, session_id: &str) -> Result<bool, StoreError> {
        (**self).remove(session_id)
    }

    fn len(&self) -> Result<usize, StoreError> {
        (**self).len()
    }
}

// ═══════════════════════════════════════════
// In-memory
// ═══════════════════════════════════════════

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, TriageContext>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sessions(&self) -> Result<MutexGuard<'_, HashMap<String, TriageContext>>, StoreError> {
        self.sessions.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, session_id: &str) -> Result<Option<TriageContext>, StoreError> {
        Ok(self.sessions()?.get(session_id).cloned())
    }

    fn put(&self, ctx: &TriageContext) -> Result<(), StoreError> {
        self.sessions()?.insert(ctx.session_id.clone(), ctx.clone());
        Ok(())
    }

    fn remove(&self, session_id: &str) -> Result<bool, StoreError> {
        Ok(self.sessions()?.remove(session_id).is_some())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.sessions()?.len())
    }
}

// ═══════════════════════════════════════════
// SQLite
// ═══════════════════════════════════════════

pub struct SqliteSessionStore {
    conn: Mutex<Connection>,
}

impl SqliteSessionStore {
    /// Open (or create) the session database at `path` and run migrations.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// In-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        configure_pragmas(&conn)?;
        run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl SessionStore for SqliteSessionStore {
    fn get(&self, session_id: &str) -> Result<Option<TriageContext>, StoreError> {
        let conn = self.conn()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT context FROM triage_sessions WHERE session_id = ?1",
                params![session_id],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn put(&self, ctx: &TriageContext) -> Result<(), StoreError> {
        let json = serde_json::to_string(ctx)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO triage_sessions (session_id, state, context, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(session_id) DO UPDATE SET
                state = excluded.state,
                context = excluded.context,
                updated_at = excluded.updated_at",
            params![
                ctx.session_id,
                ctx.state.as_str(),
                json,
                ctx.created_at.to_rfc3339(),
                ctx.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn remove(&self, session_id: &str) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM triage_sessions WHERE session_id = ?1",
            params![session_id],
        )?;
        Ok(removed > 0)
    }

    fn len(&self) -> Result<usize, StoreError> {
        let conn = self.conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM triage_sessions", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

fn configure_pragmas(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "PRAGMA journal_mode=DELETE;
         PRAGMA foreign_keys=ON;",
    )?;
    Ok(())
}

/// Run all pending migrations
fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
    let current_version = get_current_version(conn);

    let migrations: Vec<(i64, &str)> = vec![(
        1,
        include_str!("../../resources/migrations/001_triage_sessions.sql"),
    )];

    for (version, sql) in migrations {
        if version > current_version {
            tracing::info!("Running session store migration v{version}");
            conn.execute_batch(sql)
                .map_err(|e| StoreError::MigrationFailed {
                    version,
                    reason: e.to_string(),
                })?;
        }
    }

    Ok(())
}

/// Current schema version (0 if no schema exists yet)
fn get_current_version(conn: &Connection) -> i64 {
    conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
        row.get::<_, Option<i64>>(0)
    })
    .ok()
    .flatten()
    .unwrap_or(0)
}
