//! Bootstrap configuration loading
//!
//! Resolution priority for every setting:
//! 1. Command-line argument or environment variable (handled by the binary)
//! 2. TOML config file
//! 3. Compiled default
//!
//! A missing TOML file is not an error: a warning is logged and defaults
//! apply. A TOML file that exists but cannot be parsed is an error.

use crate::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// Default HTTP port for the semestre service
pub const DEFAULT_PORT: u16 = 5810;

/// Default bind address (loopback only)
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";

/// Which Filiere/Professeur/Element records get relinked after a semestre update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelinkScope {
    /// Every record of the three collections receives the semestre id
    #[default]
    All,
    /// Only the records named by the update patch receive the semestre id
    Referenced,
}

impl FromStr for RelinkScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(RelinkScope::All),
            "referenced" => Ok(RelinkScope::Referenced),
            other => Err(Error::Config(format!(
                "Invalid relink scope '{}' (expected 'all' or 'referenced')",
                other
            ))),
        }
    }
}

impl fmt::Display for RelinkScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelinkScope::All => write!(f, "all"),
            RelinkScope::Referenced => write!(f, "referenced"),
        }
    }
}

/// Configuration loaded from the TOML file
///
/// Every field is optional so that a partial file only overrides what it names.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Path to the SQLite database file
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Address the HTTP server binds to
    #[serde(default)]
    pub bind_address: Option<String>,

    /// HTTP server port
    #[serde(default)]
    pub port: Option<u16>,

    /// Relink behavior of the update operation
    #[serde(default)]
    pub relink_scope: Option<RelinkScope>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default)]
    pub level: Option<String>,
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
    }

    /// Load the config file, falling back to defaults when it does not exist
    ///
    /// `explicit` is the path given on the command line; without it the
    /// per-user default location for `module_name` is tried.
    pub fn load_or_default(explicit: Option<&Path>, module_name: &str) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match default_config_path(module_name) {
                Some(path) => path,
                None => {
                    warn!("Could not determine config directory, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        if !path.exists() {
            warn!("Config file not found: {} (using defaults)", path.display());
            return Ok(Self::default());
        }

        let config = Self::load(&path)?;
        info!("Loaded config file: {}", path.display());
        Ok(config)
    }
}

/// Per-user config file location: `<config_dir>/scolaris/<module_name>.toml`
pub fn default_config_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("scolaris").join(format!("{}.toml", module_name)))
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("scolaris"))
        .unwrap_or_else(|| PathBuf::from("./scolaris_data"))
        .join("scolaris.db")
}

/// Values supplied on the command line (or through their environment variables)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database_path: Option<PathBuf>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub relink_scope: Option<RelinkScope>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub database_path: PathBuf,
    pub bind_address: String,
    pub port: u16,
    pub log_level: String,
    pub relink_scope: RelinkScope,
}

impl ServiceConfig {
    /// Merge overrides over the TOML file over compiled defaults
    pub fn resolve(overrides: ConfigOverrides, toml: TomlConfig) -> Self {
        Self {
            database_path: overrides
                .database_path
                .or(toml.database_path)
                .unwrap_or_else(default_database_path),
            bind_address: overrides
                .bind_address
                .or(toml.bind_address)
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            port: overrides.port.or(toml.port).unwrap_or(DEFAULT_PORT),
            log_level: overrides
                .log_level
                .or(toml.logging.level)
                .unwrap_or_else(|| "info".to_string()),
            relink_scope: overrides
                .relink_scope
                .or(toml.relink_scope)
                .unwrap_or_default(),
        }
    }

    /// Socket address built from bind address and port
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .map_err(|e| {
                Error::Config(format!(
                    "Invalid bind address {}:{}: {}",
                    self.bind_address, self.port, e
                ))
            })
    }
}
