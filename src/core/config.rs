//! Configuration constants and settings
//!
//! Bucket location and timing are explicit values passed into every store,
//! never process-wide globals.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

// Remote defaults
pub const DEFAULT_BASE_URL: &str = "https://kvdb.io";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

// Local layout
pub const APP_DIR_NAME: &str = "kvsync";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const FALLBACK_CACHE_DIR: &str = ".kvsync";

// Environment variables
pub const ENV_BASE_URL: &str = "KVSYNC_BASE_URL";
pub const ENV_BUCKET: &str = "KVSYNC_BUCKET";
pub const ENV_KEY_PREFIX: &str = "KVSYNC_KEY_PREFIX";
pub const ENV_POLL_SECS: &str = "KVSYNC_POLL_SECS";
pub const ENV_TIMEOUT_SECS: &str = "KVSYNC_TIMEOUT_SECS";
pub const ENV_CACHE_DIR: &str = "KVSYNC_CACHE_DIR";

/// Settings shared by every store opened against one bucket
#[derive(Clone, Debug, PartialEq)]
pub struct SyncConfig {
    /// Scheme and host of the key-value service, without trailing slash
    pub base_url: String,
    /// Bucket identifier, first path segment after the base URL
    pub bucket: String,
    /// Prepended to every key, for sharing one bucket between applications
    pub key_prefix: String,
    /// Pull cadence. `Duration::ZERO` disables the recurring pull; the
    /// initial pull at open still happens.
    pub poll_interval: Duration,
    /// Upper bound for each remote GET or POST
    pub request_timeout: Duration,
    /// Directory of the durable local cache
    pub cache_dir: PathBuf,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            bucket: String::new(),
            key_prefix: String::new(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            cache_dir: default_cache_dir(),
        }
    }
}

impl SyncConfig {
    /// Full resource URL for a document key
    pub fn document_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{}{}",
            self.base_url.trim_end_matches('/'),
            self.bucket,
            self.key_prefix,
            key
        )
    }

    /// Checks the fields the HTTP bucket depends on
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            anyhow::bail!("base URL is empty");
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            anyhow::bail!("base URL must start with http:// or https://: {}", self.base_url);
        }
        if self.bucket.trim().is_empty() {
            anyhow::bail!("bucket is not configured (use --bucket or {ENV_BUCKET})");
        }
        if self.bucket.contains('/') {
            anyhow::bail!("bucket must not contain '/': {}", self.bucket);
        }
        if self.request_timeout.is_zero() {
            anyhow::bail!("request timeout must be greater than zero");
        }
        Ok(())
    }
}

/// Values given explicitly on the command line
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub bucket: Option<String>,
    pub key_prefix: Option<String>,
    pub poll_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub cache_dir: Option<PathBuf>,
}

/// Contents of `config.toml`. Every field is optional.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct FileConfig {
    pub base_url: Option<String>,
    pub bucket: Option<String>,
    pub key_prefix: Option<String>,
    pub poll_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub cache_dir: Option<PathBuf>,
}

impl FileConfig {
    /// Reads a config file. A missing file is `Ok(None)`.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()))
            }
        };
        let parsed = toml::from_str(&text)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(Some(parsed))
    }
}

/// Location of the user config file, if the platform has a config dir
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Default durable cache directory
pub fn default_cache_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(FALLBACK_CACHE_DIR))
}

/// Resolves the effective configuration from process environment and the
/// user config file
///
/// Priority order:
/// 1. command line flags
/// 2. KVSYNC_* environment variables
/// 3. config.toml in the user config dir
/// 4. built-in defaults
pub fn resolve_config(overrides: &ConfigOverrides) -> Result<SyncConfig> {
    let file = match default_config_path() {
        Some(path) => FileConfig::load(&path)?,
        None => None,
    };
    resolve_config_with(overrides, |name| std::env::var(name).ok(), file)
}

/// Same as [`resolve_config`] with the environment and file injected
pub fn resolve_config_with<E>(
    overrides: &ConfigOverrides,
    env: E,
    file: Option<FileConfig>,
) -> Result<SyncConfig>
where
    E: Fn(&str) -> Option<String>,
{
    let file = file.unwrap_or_default();
    let defaults = SyncConfig::default();

    let base_url = overrides
        .base_url
        .clone()
        .or_else(|| env(ENV_BASE_URL))
        .or(file.base_url)
        .unwrap_or(defaults.base_url);
    let bucket = overrides
        .bucket
        .clone()
        .or_else(|| env(ENV_BUCKET))
        .or(file.bucket)
        .unwrap_or(defaults.bucket);
    let key_prefix = overrides
        .key_prefix
        .clone()
        .or_else(|| env(ENV_KEY_PREFIX))
        .or(file.key_prefix)
        .unwrap_or(defaults.key_prefix);

    let poll_secs = match overrides.poll_secs {
        Some(n) => Some(n),
        None => parse_env_secs(&env, ENV_POLL_SECS)?,
    }
    .or(file.poll_secs);
    let timeout_secs = match overrides.timeout_secs {
        Some(n) => Some(n),
        None => parse_env_secs(&env, ENV_TIMEOUT_SECS)?,
    }
    .or(file.timeout_secs);

    let cache_dir = overrides
        .cache_dir
        .clone()
        .or_else(|| env(ENV_CACHE_DIR).map(PathBuf::from))
        .or(file.cache_dir)
        .unwrap_or(defaults.cache_dir);

    Ok(SyncConfig {
        base_url,
        bucket,
        key_prefix,
        poll_interval: poll_secs
            .map(Duration::from_secs)
            .unwrap_or(defaults.poll_interval),
        request_timeout: timeout_secs
            .map(|n| Duration::from_secs(n.max(1)))
            .unwrap_or(defaults.request_timeout),
        cache_dir,
    })
}

fn parse_env_secs<E>(env: &E, name: &str) -> Result<Option<u64>>
where
    E: Fn(&str) -> Option<String>,
{
    match env(name) {
        Some(raw) => {
            let secs = raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{name} must be a whole number of seconds, got {raw:?}"))?;
            Ok(Some(secs))
        }
        None => Ok(None),
    }
}
