//! Console configuration: optional TOML file, then CLI flags and environment
//! variables on top.

use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::list_actor::ListSettings;

fn default_api_base_url() -> String {
    "https://reqres.in/api".to_string()
}

fn default_api_key() -> String {
    "reqres-free-v1".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_page_size() -> usize {
    6
}

fn default_remote_page() -> u32 {
    1
}

fn default_remote_per_page() -> u32 {
    6
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from(".user-console")
}

fn default_log_filter() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsoleConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_remote_page")]
    pub remote_page: u32,
    #[serde(default = "default_remote_per_page")]
    pub remote_per_page: u32,
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_key: default_api_key(),
            request_timeout_ms: default_request_timeout_ms(),
            page_size: default_page_size(),
            remote_page: default_remote_page(),
            remote_per_page: default_remote_per_page(),
            storage_dir: default_storage_dir(),
            log_filter: default_log_filter(),
        }
    }
}

impl ConsoleConfig {
    /// Reads `path`, or returns the defaults when no file was given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn apply_overrides(&mut self, overrides: &CliOverrides) {
        if let Some(url) = &overrides.api_base_url {
            self.api_base_url = url.clone();
        }
        if let Some(key) = &overrides.api_key {
            self.api_key = key.clone();
        }
        if let Some(ms) = overrides.request_timeout_ms {
            self.request_timeout_ms = ms;
        }
        if let Some(size) = overrides.page_size {
            self.page_size = size;
        }
        if let Some(dir) = &overrides.storage_dir {
            self.storage_dir = dir.clone();
        }
        if let Some(filter) = &overrides.log_filter {
            self.log_filter = filter.clone();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api_base_url is empty".into()));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid("request_timeout_ms must be > 0".into()));
        }
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be > 0".into()));
        }
        if self.remote_page == 0 || self.remote_per_page == 0 {
            return Err(ConfigError::Invalid(
                "remote_page and remote_per_page must be > 0".into(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn list_settings(&self) -> Result<ListSettings, ConfigError> {
        let page_size = NonZeroUsize::new(self.page_size)
            .ok_or_else(|| ConfigError::Invalid("page_size must be > 0".into()))?;
        Ok(ListSettings {
            page_size,
            remote_page: self.remote_page,
            remote_per_page: self.remote_per_page,
            request_timeout: self.request_timeout(),
        })
    }
}

#[derive(Debug, Parser)]
#[command(name = "user_console", about = "Manage users of a reqres-compatible API")]
pub struct Cli {
    /// TOML config file
    #[arg(long, short, env = "USER_CONSOLE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: CliOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Default, Args)]
pub struct CliOverrides {
    /// Override the API base URL
    #[arg(long, env = "USER_CONSOLE_API_URL")]
    pub api_base_url: Option<String>,
    /// Override the API key sent in `x-api-key`
    #[arg(long, env = "USER_CONSOLE_API_KEY")]
    pub api_key: Option<String>,
    /// Override the per-request timeout (milliseconds)
    #[arg(long)]
    pub request_timeout_ms: Option<u64>,
    /// Override the number of users per page
    #[arg(long)]
    pub page_size: Option<usize>,
    /// Override the directory holding the token and the created users
    #[arg(long, env = "USER_CONSOLE_STORAGE_DIR")]
    pub storage_dir: Option<PathBuf>,
    /// Override the log filter (falls back to RUST_LOG, then the config)
    #[arg(long)]
    pub log_filter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Log in and store the session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "USER_CONSOLE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Show one page of the user listing
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Create a user
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        job: String,
    },
    /// Delete a user by id
    Delete {
        #[arg(long)]
        id: i64,
    },
}
