//! Contract around the migration engine that applies SQL files to the database.

mod mysql;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub use mysql::{Dsn, MySqlEngineFactory, MySqlMigrationEngine};

#[derive(Debug, Error)]
pub enum EngineError {
    /// Every migration is already applied. Not a failure.
    #[error("no change")]
    NoChange,

    /// No migration has ever been recorded.
    #[error("no migration")]
    NilVersion,

    /// A previous migration started but never completed.
    #[error("dirty database version {0}, fix and force version")]
    Dirty(i64),

    #[error("unsupported migration source {0:?}, expected a file:// URI")]
    UnsupportedSource(String),

    #[error("invalid database URI: {0}")]
    InvalidDatabaseUrl(String),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Currently applied schema version, as reported by the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchemaVersion {
    pub version: i64,
    pub dirty: bool,
}

/// A migration engine bound to one migration source and one database.
///
/// Implementations must tolerate concurrent `current_version` calls.
#[async_trait]
pub trait MigrationEngine: Send + Sync {
    /// Apply every pending migration. [`EngineError::NoChange`] when there is nothing to do.
    async fn apply_all(&self) -> Result<(), EngineError>;

    /// [`EngineError::NilVersion`] when nothing has been applied yet.
    async fn current_version(&self) -> Result<SchemaVersion, EngineError>;
}

/// Builds a [`MigrationEngine`] from a migration source URI and a database URI.
#[async_trait]
pub trait EngineFactory: Send + Sync {
    async fn open(
        &self,
        source_url: &str,
        database_url: &str,
    ) -> Result<Arc<dyn MigrationEngine>, EngineError>;
}
