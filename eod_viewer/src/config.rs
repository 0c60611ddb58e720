//! Viewer configuration: TOML parsing, defaults, and normalisation.
//!
//! Every section is optional, so an empty file (or no file at all, via
//! [`ViewerConfig::default`]) gives a working setup against a local backend.
//! Credentials are never read from here; providers take them from the
//! environment.
//!
//! ```toml
//! [provider]
//! kind = "http"                 # or "alpha_vantage"
//! base_url = "http://localhost:8080"
//! timeout_secs = 30
//! requests_per_minute = 5       # alpha_vantage only
//!
//! [cache]
//! enabled = true
//! ttl_secs = 300
//!
//! [chart]
//! palette = ["#8B5CF6", "#F59E0B"]
//! ```
//!
//! Entrypoints: [`load_config_str`] and [`load_config_path`].

use std::{num::NonZeroU32, time::Duration};

use anyhow::{Context, bail};
use eod_client::providers::alpha_vantage;
use serde::{Deserialize, Serialize};

/// Base URL used by the `http` provider when none is configured.
pub const DEFAULT_HTTP_BASE_URL: &str = "http://localhost:8080";

/// Line colours used when `[chart]` is absent.
pub const DEFAULT_PALETTE: [&str; 6] = [
    "#8B5CF6", "#F59E0B", "#10B981", "#EF4444", "#3B82F6", "#EC4899",
];

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ViewerConfig {
    /// Which retrieval provider to use and how to reach it.
    #[serde(default)]
    pub provider: ProviderCfg,
    /// Response cache in front of the provider.
    #[serde(default)]
    pub cache: CacheCfg,
    /// Chart presentation.
    #[serde(default)]
    pub chart: ChartCfg,
}

/// Retrieval provider selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// The `/api/stocks/eod` backend.
    #[default]
    Http,
    /// Alpha Vantage, called directly.
    AlphaVantage,
}

/// `[provider]` section.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderCfg {
    /// Provider kind.
    #[serde(default)]
    pub kind: ProviderKind,
    /// Overrides the provider's default base URL.
    pub base_url: Option<String>,
    /// Per-request timeout. No timeout when absent.
    pub timeout_secs: Option<u64>,
    /// Outgoing call budget for `alpha_vantage`.
    pub requests_per_minute: Option<u32>,
}

impl ProviderCfg {
    /// Configured base URL, or the default for [`ProviderCfg::kind`].
    pub fn resolved_base_url(&self) -> &str {
        match (&self.base_url, self.kind) {
            (Some(url), _) => url,
            (None, ProviderKind::Http) => DEFAULT_HTTP_BASE_URL,
            (None, ProviderKind::AlphaVantage) => alpha_vantage::DEFAULT_BASE_URL,
        }
    }

    /// Timeout as a `Duration`.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Alpha Vantage call budget, defaulting to the free-tier quota.
    pub fn requests_per_minute(&self) -> NonZeroU32 {
        self.requests_per_minute
            .and_then(NonZeroU32::new)
            .unwrap_or(alpha_vantage::DEFAULT_REQUESTS_PER_MINUTE)
    }
}

/// `[cache]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheCfg {
    /// Whether to cache successful responses.
    #[serde(default)]
    pub enabled: bool,
    /// Entry lifetime in seconds.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_ttl_secs() -> u64 {
    300
}

impl Default for CacheCfg {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl CacheCfg {
    /// TTL as a `Duration`.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// `[chart]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChartCfg {
    /// Series colours, cycled in column order.
    #[serde(default = "default_palette")]
    pub palette: Vec<String>,
}

fn default_palette() -> Vec<String> {
    DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect()
}

impl Default for ChartCfg {
    fn default() -> Self {
        Self {
            palette: default_palette(),
        }
    }
}

/// Normalise a config in place.
///
/// - `provider.base_url`: trimmed, trailing `/` removed, must be non-empty
///   and start with `http://` or `https://`
/// - `provider.timeout_secs` and `provider.requests_per_minute`: must be > 0
///   when present
/// - `cache.ttl_secs`: must be > 0 when the cache is enabled
/// - `chart.palette`: entries trimmed, blanks dropped, must not end up empty
pub fn normalize_config(cfg: &mut ViewerConfig) -> anyhow::Result<()> {
    if let Some(url) = cfg.provider.base_url.take() {
        let url = url.trim().trim_end_matches('/').to_string();
        if url.is_empty() {
            bail!("provider.base_url cannot be empty");
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            bail!("provider.base_url must start with http:// or https://: {url}");
        }
        cfg.provider.base_url = Some(url);
    }
    if cfg.provider.timeout_secs == Some(0) {
        bail!("provider.timeout_secs must be positive");
    }
    if cfg.provider.requests_per_minute == Some(0) {
        bail!("provider.requests_per_minute must be positive");
    }
    if cfg.cache.enabled && cfg.cache.ttl_secs == 0 {
        bail!("cache.ttl_secs must be positive when the cache is enabled");
    }

    cfg.chart.palette = std::mem::take(&mut cfg.chart.palette)
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    if cfg.chart.palette.is_empty() {
        bail!("chart.palette needs at least one colour");
    }

    Ok(())
}

/// Parse and normalise a config from a TOML string.
pub fn load_config_str(toml_str: &str) -> anyhow::Result<ViewerConfig> {
    let mut cfg: ViewerConfig = toml::from_str(toml_str).context("failed to parse config TOML")?;
    normalize_config(&mut cfg).context("invalid config")?;
    Ok(cfg)
}

/// Read a config file from disk, parse, and normalise it.
pub fn load_config_path(path: impl AsRef<std::path::Path>) -> anyhow::Result<ViewerConfig> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read config file {}", path.as_ref().display()))?;
    load_config_str(&text)
}
