//! Builds the retrieval provider described by a [`ViewerConfig`].

use std::sync::Arc;

use eod_client::providers::{
    EodProvider, ProviderInitError, alpha_vantage::AlphaVantageProvider, cached::CachingProvider,
    http::HttpEodProvider,
};
use tracing::info;

use crate::config::{ProviderKind, ViewerConfig};

/// Instantiate the configured provider, wrapped in a cache when enabled.
///
/// Credentials come from the environment (`EOD_API_USERNAME` /
/// `EOD_API_PASSWORD` or `ALPHAVANTAGE_API_KEY`).
pub fn build_provider(cfg: &ViewerConfig) -> Result<Arc<dyn EodProvider>, ProviderInitError> {
    let provider_cfg = &cfg.provider;
    let base_url = provider_cfg.resolved_base_url();
    let timeout = provider_cfg.timeout();

    let provider: Arc<dyn EodProvider> = match provider_cfg.kind {
        ProviderKind::Http => Arc::new(HttpEodProvider::new(base_url, timeout)?),
        ProviderKind::AlphaVantage => Arc::new(AlphaVantageProvider::new(
            base_url,
            timeout,
            provider_cfg.requests_per_minute(),
        )?),
    };
    info!(kind = ?provider_cfg.kind, base_url, "provider ready");

    if !cfg.cache.enabled {
        return Ok(provider);
    }
    info!(ttl_secs = cfg.cache.ttl_secs, "response cache enabled");
    Ok(Arc::new(CachingProvider::new(provider, cfg.cache.ttl())))
}
