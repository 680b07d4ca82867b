//! Pool configuration (layered: code > env > file).

use std::path::{Path, PathBuf};

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::error::{PoolError, Result};
use crate::session::SessionSpec;

/// Default ceiling on concurrent sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 10;

/// Default endpoint workers are pointed at.
pub const DEFAULT_API_URL: &str = "http://localhost:8082";

fn default_max_sessions() -> usize {
    DEFAULT_MAX_SESSIONS
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

/// Construction-time settings for a [`SessionPool`](crate::pool::SessionPool).
///
/// Immutable once the pool is built.
///
/// ```
/// use clipool::config::PoolConfig;
///
/// let config = PoolConfig::builder()
///     .workspace("/srv/agent")
///     .api_url("http://localhost:8082")
///     .max_sessions(4)
///     .build();
/// assert_eq!(config.max_sessions, 4);
/// assert!(config.allowed_dirs.is_empty());
/// ```
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq, Eq)]
pub struct PoolConfig {
    /// Working directory for worker processes.
    #[builder(into)]
    pub workspace: PathBuf,
    /// API endpoint workers talk to.
    #[builder(into, default = default_api_url())]
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Directories workers may access besides the workspace.
    #[builder(default)]
    #[serde(default)]
    pub allowed_dirs: Vec<PathBuf>,
    /// Maximum number of pending plus active sessions.
    #[builder(default = DEFAULT_MAX_SESSIONS)]
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl PoolConfig {
    /// Load from environment variables.
    ///
    /// Reads `CLAUDE_WORKSPACE` (defaults to the current directory),
    /// `PROXY_API_URL`, `ALLOWED_DIR` (comma separated) and
    /// `MAX_CLI_SESSIONS`. A `.env` file is loaded first if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error

        let workspace = match std::env::var("CLAUDE_WORKSPACE") {
            Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => std::env::current_dir()?,
        };

        let api_url = std::env::var("PROXY_API_URL").unwrap_or_else(|_| default_api_url());

        let allowed_dirs = std::env::var("ALLOWED_DIR")
            .map(|raw| parse_dir_list(&raw))
            .unwrap_or_default();

        let max_sessions = match std::env::var("MAX_CLI_SESSIONS") {
            Ok(raw) => raw.trim().parse::<usize>().map_err(|e| {
                PoolError::Configuration(format!("MAX_CLI_SESSIONS={raw:?}: {e}"))
            })?,
            Err(_) => DEFAULT_MAX_SESSIONS,
        };

        let config = Self {
            workspace,
            api_url,
            allowed_dirs,
            max_sessions,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(raw).map_err(|e| PoolError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&raw)
    }

    /// Reject settings a pool cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_sessions == 0 {
            return Err(PoolError::Configuration(
                "max_sessions must be at least 1".into(),
            ));
        }
        if self.api_url.trim().is_empty() {
            return Err(PoolError::Configuration("api_url must not be empty".into()));
        }
        Ok(())
    }

    /// What every new session is constructed with.
    pub fn session_spec(&self) -> SessionSpec {
        SessionSpec {
            workspace: self.workspace.clone(),
            api_url: self.api_url.clone(),
            allowed_dirs: self.allowed_dirs.clone(),
        }
    }
}

fn parse_dir_list(raw: &str) -> Vec<PathBuf> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(PathBuf::from)
        .collect()
}
