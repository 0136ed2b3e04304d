//! Startup-time schema migration runner.
//!
//! Renders `*.sql.tmpl` templates from the process environment into the
//! migrations directory, applies pending migrations, then serves the current
//! schema version over HTTP.

pub mod config;
pub mod engine;
pub mod env_snapshot;
pub mod orchestrator;
pub mod render;
pub mod status;
pub mod telemetry;

pub use config::{Config, ConfigError};
pub use engine::{EngineError, EngineFactory, MigrationEngine, SchemaVersion};
pub use env_snapshot::EnvSnapshot;
pub use orchestrator::StartupError;
pub use render::TemplateError;
