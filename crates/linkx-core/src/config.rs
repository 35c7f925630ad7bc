use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::extract::ExtractOptions;
use crate::retry::RetryPolicy;
use crate::sandbox::RealmLimits;

/// Caller-side retry parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of extraction attempts (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.5 = 500ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 0.5,
            max_delay_secs: 10,
        }
    }
}

impl RetryConfig {
    /// Fails when `base_delay_secs` is infinite or too large for a `Duration`.
    /// Negative and NaN delays clamp to zero.
    pub fn policy(&self) -> Result<RetryPolicy> {
        let base_delay = Duration::try_from_secs_f64(self.base_delay_secs.max(0.0))
            .with_context(|| format!("retry.base_delay_secs = {}", self.base_delay_secs))?;
        Ok(RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay,
            max_delay: Duration::from_secs(self.max_delay_secs),
        })
    }
}

fn default_watchdog_grace_ms() -> u64 {
    500
}

/// Global configuration loaded from `~/.config/linkx/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkxConfig {
    /// Id of the element whose `href` the page scripts compute.
    pub target_id: String,
    /// Substring a script must contain to be executed. Defaults to `target_id`.
    #[serde(default)]
    pub marker: Option<String>,
    /// Wall-clock budget for each page script (and the document boot step).
    pub script_timeout_ms: u64,
    /// Wall-clock budget for reading the result out of the realm.
    pub read_timeout_ms: u64,
    /// How long past a deadline a realm call may run before it is abandoned.
    #[serde(default = "default_watchdog_grace_ms")]
    pub watchdog_grace_ms: u64,
    /// Heap cap for one sandbox realm.
    pub memory_limit_bytes: usize,
    /// Native stack cap for one sandbox realm.
    pub max_stack_bytes: usize,
    /// User-Agent sent by the default transport.
    pub user_agent: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for LinkxConfig {
    fn default() -> Self {
        Self {
            target_id: "dlbutton".to_string(),
            marker: None,
            script_timeout_ms: 1000,
            read_timeout_ms: 1000,
            watchdog_grace_ms: default_watchdog_grace_ms(),
            memory_limit_bytes: 64 * 1024 * 1024,
            max_stack_bytes: 1024 * 1024,
            user_agent: "-".to_string(),
            connect_timeout_secs: 15,
            request_timeout_secs: 60,
            retry: None,
        }
    }
}

impl LinkxConfig {
    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            target_id: self.target_id.clone(),
            marker: self.marker.clone().unwrap_or_else(|| self.target_id.clone()),
            script_timeout: Duration::from_millis(self.script_timeout_ms),
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            watchdog_grace: Duration::from_millis(self.watchdog_grace_ms),
            limits: RealmLimits {
                memory_limit_bytes: self.memory_limit_bytes,
                max_stack_bytes: self.max_stack_bytes,
            },
        }
    }

    pub fn retry_policy(&self) -> Result<RetryPolicy> {
        self.retry.clone().unwrap_or_default().policy()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("linkx")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<LinkxConfig> {
    load_or_init_at(&config_path()?)
}

/// Like [`load_or_init`] but with an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<LinkxConfig> {
    if !path.exists() {
        let default_cfg = LinkxConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml).with_context(|| format!("write {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: LinkxConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    cfg.retry_policy()
        .with_context(|| format!("invalid [retry] section in {}", path.display()))?;
    Ok(cfg)
}
