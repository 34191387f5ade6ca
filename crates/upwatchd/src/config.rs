//! upwatch.toml configuration.
//!
//! Every field has a default, so an absent file or an empty table is a
//! valid configuration.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub check: CheckConfig,
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/var/lib/upwatch/upwatch.redb"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Per-service fetch timeout, e.g. "20s".
    pub timeout: String,
    /// Time between scheduled cycles. "0" turns the scheduler off.
    pub interval: String,
    pub max_concurrency: usize,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            timeout: "20s".to_string(),
            interval: "5m".to_string(),
            max_concurrency: upwatch_health::DEFAULT_MAX_CONCURRENCY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Log,
    Webhook,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub enabled: bool,
    pub sender: String,
    pub subject_prefix: String,
    pub transport: TransportKind,
    pub webhook_url: Option<String>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        let defaults = upwatch_health::NotifyConfig::default();
        Self {
            enabled: true,
            sender: defaults.sender,
            subject_prefix: defaults.subject_prefix,
            transport: TransportKind::Log,
            webhook_url: None,
        }
    }
}

impl Config {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn check_timeout(&self) -> anyhow::Result<Duration> {
        parse_duration(&self.check.timeout)
            .with_context(|| format!("invalid check.timeout {:?}", self.check.timeout))
    }

    /// `None` when the built-in scheduler is disabled.
    pub fn check_interval(&self) -> anyhow::Result<Option<Duration>> {
        let interval = parse_duration(&self.check.interval)
            .with_context(|| format!("invalid check.interval {:?}", self.check.interval))?;
        Ok((!interval.is_zero()).then_some(interval))
    }

    /// Reject configurations the daemon cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.check_timeout()?.is_zero() {
            bail!("check.timeout must be greater than zero");
        }
        self.check_interval()?;
        if self.check.max_concurrency == 0 {
            bail!("check.max_concurrency must be at least 1");
        }
        if self.notify.enabled {
            if self.notify.sender.trim().is_empty() {
                bail!("notify.sender must not be empty");
            }
            if self.notify.transport == TransportKind::Webhook
                && self.notify.webhook_url.as_deref().is_none_or(str::is_empty)
            {
                bail!("notify.transport = \"webhook\" requires notify.webhook_url");
            }
        }
        Ok(())
    }
}

/// Parse a duration string like "500ms", "20s", "5m" or bare seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        ms.trim().parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.trim().parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.trim()
            .parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
