use std::num::ParseIntError;

use thiserror::Error;

/// Scheme of the database driver the migration engine speaks.
pub const DRIVER_SCHEME: &str = "mysql";

const DEFAULT_DB_PORT: u16 = 3306;
const DEFAULT_DB_NAME: &str = "mysql";
const DEFAULT_MIGRATIONS: &str = "/migrations";
const DEFAULT_TEMPLATES: &str = "/templates";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing {var}")]
    Missing { var: &'static str },

    #[error("{var} must be a port number, got {value:?}: {source}")]
    InvalidPort {
        var: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

impl ConfigError {
    /// Name of the environment variable that failed validation.
    pub fn var(&self) -> &'static str {
        match self {
            ConfigError::Missing { var } | ConfigError::InvalidPort { var, .. } => *var,
        }
    }
}

/// Service configuration loaded once from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    // Database
    pub db_user: String,
    pub db_pass: String,
    pub db_host: String,
    pub db_port: u16,
    pub db_name: String,

    // Filesystem
    pub migrations: String,
    pub templates: String,

    // Status server
    pub port: u16,
    pub debug: bool,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Variables are read in a fixed order and the first failure is returned.
    /// An empty value is treated the same as an unset one.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing { var: key });
        let port = |key: &'static str, default: u16| match get(key) {
            None => Ok(default),
            Some(value) => parse_port(&value).map_err(|source| ConfigError::InvalidPort {
                var: key,
                value,
                source,
            }),
        };

        let config = Self {
            db_user: required("DB_USER")?,
            db_pass: required("DB_PASS")?,
            db_host: required("DB_HOST")?,
            db_port: port("DB_PORT", DEFAULT_DB_PORT)?,
            db_name: get("DB_NAME").unwrap_or_else(|| DEFAULT_DB_NAME.to_string()),
            migrations: get("MIGRATIONS").unwrap_or_else(|| DEFAULT_MIGRATIONS.to_string()),
            templates: get("TEMPLATES").unwrap_or_else(|| DEFAULT_TEMPLATES.to_string()),
            port: port("PORT", DEFAULT_PORT)?,
            debug: get("DEBUG").is_some(),
        };

        config.log_settings();
        Ok(config)
    }

    /// Connection URI handed to the migration engine.
    pub fn database_url(&self) -> String {
        self.format_url(&urlencoding::encode(&self.db_pass))
    }

    /// [`Config::database_url`] with the password masked, safe for logs.
    pub fn redacted_database_url(&self) -> String {
        self.format_url("***")
    }

    /// Migration source URI pointing at the migrations directory.
    pub fn migrations_source(&self) -> String {
        format!("file://{}", self.migrations)
    }

    fn format_url(&self, password: &str) -> String {
        format!(
            "{DRIVER_SCHEME}://{}:{}@tcp({}:{})/{}",
            urlencoding::encode(&self.db_user),
            password,
            urlencoding::encode(&self.db_host),
            self.db_port,
            urlencoding::encode(&self.db_name),
        )
    }

    fn log_settings(&self) {
        tracing::info!(
            db_user = %self.db_user,
            db_host = %self.db_host,
            db_port = self.db_port,
            db_name = %self.db_name,
            migrations = %self.migrations,
            templates = %self.templates,
            port = self.port,
            debug = self.debug,
            "Config loaded"
        );
    }
}

/// Unsigned decimal only: `str::parse` would also accept a leading `+`.
fn parse_port(value: &str) -> Result<u16, ParseIntError> {
    if value.starts_with('+') {
        // A bare sign fails with the same invalid-digit error.
        return "+".parse();
    }
    value.parse()
}
