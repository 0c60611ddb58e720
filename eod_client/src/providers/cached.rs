//! TTL cache in front of another [`EodProvider`].
//!
//! Entries are keyed by the exact symbol string passed to `fetch_eod`, which
//! the viewer has already normalised. Only successful responses are stored.
//! Timing uses `tokio::time::Instant` so paused-clock tests can step over
//! the TTL.

use std::{collections::HashMap, sync::Mutex, time::Duration};

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::{
    models::EodResponse,
    providers::{EodProvider, ProviderError},
};

struct CacheEntry {
    stored_at: Instant,
    response: EodResponse,
}

pub struct CachingProvider<P> {
    inner: P,
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl<P: EodProvider> CachingProvider<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lookup(&self, symbols: &str) -> Option<EodResponse> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(symbols) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.response.clone()),
            Some(_) => {
                entries.remove(symbols);
                None
            }
            None => None,
        }
    }

    fn store(&self, symbols: &str, response: &EodResponse) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
        if entries.len() < before {
            debug!(pruned = before - entries.len(), "pruned expired cache entries");
        }
        entries.insert(
            symbols.to_string(),
            CacheEntry {
                stored_at: Instant::now(),
                response: response.clone(),
            },
        );
    }
}

#[cfg(test)]
impl<P> CachingProvider<P> {
    fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl<P: EodProvider> EodProvider for CachingProvider<P> {
    async fn fetch_eod(&self, symbols: &str) -> Result<EodResponse, ProviderError> {
        let started = Instant::now();

        if let Some(hit) = self.lookup(symbols) {
            info!(
                symbols,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "cache hit"
            );
            return Ok(hit);
        }

        let response = self.inner.fetch_eod(symbols).await?;
        self.store(symbols, &response);
        info!(
            symbols,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "cache miss"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;
    use crate::providers::ApiSnafu;

    #[derive(Clone, Default)]
    struct CountingProvider {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl EodProvider for CountingProvider {
        async fn fetch_eod(&self, _symbols: &str) -> Result<EodResponse, ProviderError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail {
                return ApiSnafu {
                    status: 500u16,
                    message: "down",
                }
                .fail();
            }
            let mut resp = EodResponse::default();
            resp.pagination.total = n as u64;
            Ok(resp)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn serves_from_cache_until_ttl_expires() {
        let inner = CountingProvider::default();
        let calls = Arc::clone(&inner.calls);
        let cache = CachingProvider::new(inner, Duration::from_secs(60));

        assert_eq!(cache.fetch_eod("AAPL").await.unwrap().pagination.total, 1);
        assert_eq!(cache.fetch_eod("AAPL").await.unwrap().pagination.total, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // different key is a separate entry
        cache.fetch_eod("MSFT").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(cache.fetch_eod("AAPL").await.unwrap().pagination.total, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let inner = CountingProvider {
            fail: true,
            ..Default::default()
        };
        let calls = Arc::clone(&inner.calls);
        let cache = CachingProvider::new(inner, Duration::from_secs(60));

        assert!(cache.fetch_eod("AAPL").await.is_err());
        assert!(cache.fetch_eod("AAPL").await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entries_are_pruned_on_store() {
        let cache = CachingProvider::new(CountingProvider::default(), Duration::from_secs(60));

        for symbols in ["AAPL", "MSFT", "IBM"] {
            cache.fetch_eod(symbols).await.unwrap();
        }
        assert_eq!(cache.len(), 3);

        tokio::time::advance(Duration::from_secs(30)).await;
        cache.fetch_eod("TSLA").await.unwrap();
        assert_eq!(cache.len(), 4);

        // The first three are past their TTL; TSLA is not.
        tokio::time::advance(Duration::from_secs(31)).await;
        cache.fetch_eod("NVDA").await.unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.lookup("TSLA").map(|r| r.pagination.total), Some(4));
    }
}
