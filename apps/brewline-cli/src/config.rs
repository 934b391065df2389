//! # Configuration
//!
//! Settings are layered, later sources winning:
//!
//! 1. Built-in defaults (this file)
//! 2. `brewline.toml` in the working directory, or the file given with
//!    `--config` (which must then exist)
//! 3. Environment variables `BREWLINE__SECTION__KEY`, e.g.
//!    `BREWLINE__STORAGE__BACKEND=postgres`
//!
//! ```toml
//! [storage]
//! backend = "sqlite"
//! sqlite_path = "./brewline.db"
//! max_connections = 5
//!
//! [admin]
//! id = "123"
//! password = "456"
//!
//! [log]
//! level = "info"
//! ```

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::warn;

use brewline_core::admin::{AdminCredentials, AdminGate, DEFAULT_ADMIN_ID, DEFAULT_ADMIN_PASSWORD};

const DEFAULT_CONFIG_FILE: &str = "brewline";
const ENV_PREFIX: &str = "BREWLINE";

/// Which store the workflows run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Embedded file store.
    Sqlite,
    /// Hosted relational server.
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    pub backend: Backend,
    pub sqlite_path: PathBuf,
    pub postgres_url: Option<String>,
    pub max_connections: u32,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AdminSettings {
    pub id: String,
    pub password: String,
}

impl std::fmt::Debug for AdminSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSettings")
            .field("id", &self.id)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    /// Default `EnvFilter` directive; `RUST_LOG` overrides it.
    pub level: String,
}

/// Everything the binary reads at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub storage: StorageSettings,
    pub admin: AdminSettings,
    pub log: LogSettings,
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),

    #[error("storage.backend is postgres but storage.postgres_url is not set")]
    MissingPostgresUrl,

    #[error("Invalid value for {0}")]
    InvalidValue(&'static str),
}

impl Settings {
    /// Loads defaults, the config file, then `BREWLINE__*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        let config = defaults()?
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;
        Self::from_config(config)
    }

    /// Defaults overlaid with an inline TOML document.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let config = defaults()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        Self::from_config(config)
    }

    fn from_config(config: Config) -> Result<Self, ConfigError> {
        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.backend == Backend::Postgres
            && self
                .storage
                .postgres_url
                .as_deref()
                .map_or(true, |url| url.trim().is_empty())
        {
            return Err(ConfigError::MissingPostgresUrl);
        }
        if self.storage.max_connections == 0 {
            return Err(ConfigError::InvalidValue("storage.max_connections"));
        }
        if self.admin.id.trim().is_empty() {
            return Err(ConfigError::InvalidValue("admin.id"));
        }
        Ok(())
    }

    /// The admin gate for this configuration. Warns while the built-in
    /// placeholder pair is still in use.
    pub fn admin_gate(&self) -> AdminGate {
        let gate = AdminGate::new(AdminCredentials::new(
            self.admin.id.clone(),
            self.admin.password.clone(),
        ));
        if gate.uses_default_credentials() {
            warn!(
                "Using the default admin id/password; set admin.id and admin.password \
                 (or BREWLINE__ADMIN__ID / BREWLINE__ADMIN__PASSWORD)"
            );
        }
        gate
    }
}

fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
    Ok(Config::builder()
        .set_default("storage.backend", "sqlite")?
        .set_default("storage.sqlite_path", "./brewline.db")?
        .set_default("storage.max_connections", 5)?
        .set_default("admin.id", DEFAULT_ADMIN_ID)?
        .set_default("admin.password", DEFAULT_ADMIN_PASSWORD)?
        .set_default("log.level", "info,brewline=debug,sqlx=warn")?)
}
