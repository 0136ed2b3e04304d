//! Startup sequence: render templates, open the engine, apply migrations.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::{Config, ConfigError};
use crate::engine::{EngineError, EngineFactory, MigrationEngine};
use crate::env_snapshot::EnvSnapshot;
use crate::render::{self, TemplateError};

/// A fatal startup failure. Each kind maps to its own process exit code.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to read config: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to render the templates: {0}")]
    Render(#[from] TemplateError),

    #[error("Failed to instantiate migrations: {0}")]
    EngineInit(#[source] EngineError),

    #[error("Failed to migrate: {0}")]
    Apply(#[source] EngineError),
}

impl StartupError {
    pub fn exit_code(&self) -> u8 {
        match self {
            StartupError::Config(_) | StartupError::Render(_) => 1,
            StartupError::EngineInit(_) => 2,
            StartupError::Apply(_) => 3,
        }
    }

    /// Fixed log message for this failure.
    pub fn message(&self) -> &'static str {
        match self {
            StartupError::Config(_) => "Failed to read config",
            StartupError::Render(_) => "Failed to render the templates",
            StartupError::EngineInit(_) => "Failed to instantiate migrations",
            StartupError::Apply(_) => "Failed to migrate",
        }
    }

    /// Log the failure with its underlying error attached.
    pub fn log(&self) {
        match self {
            StartupError::Config(e) => error!(error = %e, var = e.var(), "{}", self.message()),
            StartupError::Render(e) => {
                error!(error = %e, template = e.template(), "{}", self.message())
            }
            StartupError::EngineInit(e) | StartupError::Apply(e) => {
                error!(error = %e, "{}", self.message())
            }
        }
    }
}

/// Render templates, open the migration engine and bring the schema up to date.
///
/// Returns the live engine handle for the status service.
pub async fn prepare(
    config: &Config,
    env: &EnvSnapshot,
    factory: &dyn EngineFactory,
) -> Result<Arc<dyn MigrationEngine>, StartupError> {
    let templates = Path::new(&config.templates);
    let migrations = Path::new(&config.migrations);

    list_directory(templates);
    debug!(vars = env.len(), "Rendering templates against environment");
    let written = render::render(templates, migrations, env)?;
    debug!(rendered = written.len(), "Templates rendered");
    list_directory(migrations);

    debug!(
        migrations_path = %config.migrations_source(),
        db_url = %config.redacted_database_url(),
        "Starting migration"
    );
    let engine = factory
        .open(&config.migrations_source(), &config.database_url())
        .await
        .map_err(StartupError::EngineInit)?;

    match engine.apply_all().await {
        Ok(()) => info!("Migrations complete"),
        Err(EngineError::NoChange) => info!("Already up-to-date"),
        Err(e) => return Err(StartupError::Apply(e)),
    }

    Ok(engine)
}

/// Log every entry of `dir`. Listing failures are logged and otherwise ignored.
pub fn list_directory(dir: &Path) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            error!(error = %e, basedir = %dir.display(), "Cannot list directory");
            return;
        }
    };

    let mut names: Vec<_> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    for filename in names {
        info!(basedir = %dir.display(), filename = %filename, "Entry");
    }
}
