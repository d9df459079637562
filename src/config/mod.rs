//! Channel constants and file-backed settings.
//!
//! Settings resolve in three layers: built-in defaults, then the optional TOML
//! file (`$XDG_CONFIG_HOME/vier/config.toml` or `$HOME/.config/vier/config.toml`),
//! then command-line flags applied by the binary.

mod channel;

pub use channel::{Channel, ChannelConfig};

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::auth::{DEFAULT_CLIENT_ID, DEFAULT_USER_POOL_ID};
use crate::stream::DEFAULT_CONTENT_API_BASE;
use crate::transport::{ProxyConfig, TransportOptions};

const APP_DIR_NAME: &str = "vier";
const CONFIG_FILE_NAME: &str = "config.toml";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_PAGES: u32 = 1;

/// Errors for configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config file '{path}': {source}")]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`FileConfig`].
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range or unrecognized.
    #[error("invalid config value for `{field}`: {value}. Expected {expected}")]
    InvalidValue {
        /// Config field name.
        field: String,
        /// Offending value.
        value: String,
        /// Accepted values.
        expected: String,
    },
}

impl ConfigError {
    /// Creates an `InvalidValue` error.
    #[must_use]
    pub fn invalid_value(field: &str, value: impl ToString, expected: &str) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            expected: expected.to_string(),
        }
    }
}

/// TOML-backed file configuration. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Default channel.
    pub channel: Option<Channel>,
    /// Override of the channel site origin.
    pub site_base_url: Option<String>,
    /// Proxy URL for all requests.
    pub proxy: Option<String>,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// Whole-request timeout in seconds.
    pub read_timeout_secs: Option<u64>,
    /// Identity provider user pool id.
    pub user_pool_id: Option<String>,
    /// Identity provider app client id.
    pub client_id: Option<String>,
    /// Base URL of the content lookup API.
    pub content_api_base: Option<String>,
    /// Default number of listing pages to walk.
    pub max_pages: Option<u32>,
}

impl FileConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on syntax errors, unknown keys or invalid values.
    pub fn parse_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or is invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_str(&raw)
    }

    /// Validates config values against runtime constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for the first out-of-range value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        if let Some(max_pages) = self.max_pages
            && !(1..=100).contains(&max_pages)
        {
            return Err(ConfigError::invalid_value(
                "max_pages",
                max_pages,
                "range 1..=100",
            ));
        }
        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<(), ConfigError> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        return Err(ConfigError::invalid_value(field, value, "range 1..=3600"));
    }
    Ok(())
}

/// Effective runtime settings for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Channel to browse.
    pub channel: Channel,
    /// Override of the channel site origin.
    pub site_base_url: Option<String>,
    /// Proxy URL for all requests.
    pub proxy: Option<String>,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds.
    pub read_timeout_secs: u64,
    /// Identity provider user pool id.
    pub user_pool_id: String,
    /// Identity provider app client id.
    pub client_id: String,
    /// Base URL of the content lookup API.
    pub content_api_base: String,
    /// Number of listing pages to walk.
    pub max_pages: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            channel: Channel::default(),
            site_base_url: None,
            proxy: None,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
            user_pool_id: DEFAULT_USER_POOL_ID.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            content_api_base: DEFAULT_CONTENT_API_BASE.to_string(),
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

impl Settings {
    /// Applies file values over the built-in defaults.
    #[must_use]
    pub fn from_file(file: Option<&FileConfig>) -> Self {
        let mut settings = Self::default();
        let Some(file) = file else {
            return settings;
        };

        if let Some(channel) = file.channel {
            settings.channel = channel;
        }
        settings.site_base_url.clone_from(&file.site_base_url);
        settings.proxy.clone_from(&file.proxy);
        if let Some(secs) = file.connect_timeout_secs {
            settings.connect_timeout_secs = secs;
        }
        if let Some(secs) = file.read_timeout_secs {
            settings.read_timeout_secs = secs;
        }
        if let Some(pool) = &file.user_pool_id {
            settings.user_pool_id.clone_from(pool);
        }
        if let Some(client) = &file.client_id {
            settings.client_id.clone_from(client);
        }
        if let Some(base) = &file.content_api_base {
            settings.content_api_base.clone_from(base);
        }
        if let Some(max_pages) = file.max_pages {
            settings.max_pages = max_pages;
        }
        settings
    }

    /// Returns the site constants, honoring a base URL override.
    #[must_use]
    pub fn channel_config(&self) -> ChannelConfig {
        let config = self.channel.config();
        match &self.site_base_url {
            Some(base_url) => config.with_base_url(base_url.clone()),
            None => config,
        }
    }

    /// Returns the transport options for these settings.
    #[must_use]
    pub fn transport_options(&self) -> TransportOptions {
        TransportOptions {
            connect_timeout_secs: self.connect_timeout_secs,
            read_timeout_secs: self.read_timeout_secs,
            proxy: self.proxy.clone().map(ProxyConfig::new),
        }
    }
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists.
    pub config: Option<FileConfig>,
}

/// Returns the per-user application directory (`$XDG_CONFIG_HOME/vier`,
/// `$HOME/.config/vier` or `%APPDATA%/vier`).
#[must_use]
pub fn default_config_dir() -> Option<PathBuf> {
    resolve_config_dir(
        sanitize_env_path(env::var_os("XDG_CONFIG_HOME")),
        sanitize_env_path(env::var_os("HOME")),
        sanitize_env_path(env::var_os("APPDATA")),
    )
}

/// Returns the default config file path.
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Loads config from the default path if present.
///
/// # Errors
///
/// Returns [`ConfigError`] when an existing file cannot be read or is invalid.
pub fn load_default_file_config() -> Result<LoadedConfig, ConfigError> {
    let path = resolve_default_config_path();
    let config = match path.as_deref() {
        Some(path_ref) if path_ref.exists() => Some(FileConfig::load(path_ref)?),
        _ => None,
    };
    Ok(LoadedConfig { path, config })
}

fn sanitize_env_path(value: Option<OsString>) -> Option<PathBuf> {
    let value = value?;
    if value.to_string_lossy().trim().is_empty() {
        return None;
    }

    Some(PathBuf::from(value))
}

fn resolve_config_dir(
    xdg_config_home: Option<PathBuf>,
    home: Option<PathBuf>,
    app_data: Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(xdg) = xdg_config_home {
        return Some(xdg.join(APP_DIR_NAME));
    }
    if let Some(home) = home {
        return Some(home.join(".config").join(APP_DIR_NAME));
    }
    app_data.map(|app_data| app_data.join(APP_DIR_NAME))
}
