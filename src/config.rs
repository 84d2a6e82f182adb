//! Service configuration.
//!
//! Read from the TOML file named by `PROOFSHEET_CONFIG` (defaults when
//! unset), then individual fields may be overridden from the environment.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Path of the TOML configuration file
pub const ENV_CONFIG: &str = "PROOFSHEET_CONFIG";

/// Overrides `listen_addr`
pub const ENV_ADDR: &str = "PROOFSHEET_ADDR";

/// Overrides `media_root`
pub const ENV_MEDIA_ROOT: &str = "PROOFSHEET_MEDIA_ROOT";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid listen address {0:?}")]
    InvalidAddr(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub listen_addr: String,
    /// Root for media references that are plain paths.
    pub media_root: PathBuf,
    pub allow_remote_media: bool,
    /// Where exported reports are saved.
    pub output_dir: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            listen_addr: "127.0.0.1:3001".to_string(),
            media_root: PathBuf::from("."),
            allow_remote_media: true,
            output_dir: PathBuf::from("./reports"),
        }
    }
}

impl ServiceConfig {
    /// Loads the file named by `PROOFSHEET_CONFIG`, if any, and applies
    /// environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os(ENV_CONFIG) {
            Some(path) => Self::load(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Applies overrides looked up by variable name.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(addr) = lookup(ENV_ADDR).filter(|a| !a.trim().is_empty()) {
            self.listen_addr = addr;
        }
        if let Some(root) = lookup(ENV_MEDIA_ROOT).filter(|r| !r.trim().is_empty()) {
            self.media_root = PathBuf::from(root);
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen_addr
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidAddr(self.listen_addr.clone()))
    }
}
