//! Provider abstraction for end-of-day price sources.
//!
//! [`EodProvider`] is the single seam between the viewer core and whatever
//! actually retrieves data. Concrete providers:
//!
//! - [`http::HttpEodProvider`]: the `/api/stocks/eod` JSON endpoint.
//! - [`alpha_vantage::AlphaVantageProvider`]: talks to Alpha Vantage directly,
//!   one monthly series per symbol.
//! - [`cached::CachingProvider`]: TTL cache in front of any other provider.
//!
//! The trait is object safe, so the viewer can pick a provider at runtime and
//! hold it as `Arc<dyn EodProvider>`.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use eod_client::models::EodResponse;
//! use eod_client::providers::{EodProvider, ProviderError};
//!
//! struct EmptyProvider;
//!
//! #[async_trait]
//! impl EodProvider for EmptyProvider {
//!     async fn fetch_eod(&self, _symbols: &str) -> Result<EodResponse, ProviderError> {
//!         Ok(EodResponse::default())
//!     }
//! }
//! ```

pub mod alpha_vantage;
pub mod cached;
pub mod http;

use std::sync::Arc;

use async_trait::async_trait;
use shared_utils::env::MissingEnvVarError;
use snafu::{Backtrace, Snafu};

use crate::models::EodResponse;

/// Fallback reason when a failed response has no readable body.
pub const UNKNOWN_API_ERROR: &str = "Unknown API error";

/// Trait for fetching end-of-day records for a list of symbols.
#[async_trait]
pub trait EodProvider: Send + Sync {
    /// Fetches EOD records for `symbols`, a comma-separated, upper-cased
    /// ticker list such as `"AAPL, MSFT"`.
    ///
    /// # Returns
    ///
    /// * `Ok(EodResponse)` - pagination plus the flat record list.
    /// * `Err(ProviderError)` - transport failure, non-success status, or
    ///   [`ProviderError::Cancelled`] when the request was deliberately aborted.
    async fn fetch_eod(&self, symbols: &str) -> Result<EodResponse, ProviderError>;
}

#[async_trait]
impl<P: EodProvider + ?Sized> EodProvider for Box<P> {
    async fn fetch_eod(&self, symbols: &str) -> Result<EodResponse, ProviderError> {
        (**self).fetch_eod(symbols).await
    }
}

#[async_trait]
impl<P: EodProvider + ?Sized> EodProvider for Arc<P> {
    async fn fetch_eod(&self, symbols: &str) -> Result<EodResponse, ProviderError> {
        (**self).fetch_eod(symbols).await
    }
}

/// Errors that can occur during the creation of a provider instance.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// missed environment variable.
    #[snafu(display("Missing environment variable: {source}"))]
    MissingEnvVar {
        source: MissingEnvVarError,
        backtrace: Backtrace,
    },

    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },
}

/// Errors that can occur within an `EodProvider` implementation.
///
/// The `Display` text is what ends up in front of the user, so it is phrased
/// for them rather than for a log file.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// Network failure, timeout, or an undecodable body.
    #[snafu(display("Failed to fetch stock data. Please try again."))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The endpoint answered with a non-success status.
    #[snafu(display("Failed to fetch stock data: {message}"))]
    Api {
        status: u16,
        message: String,
        backtrace: Backtrace,
    },

    /// The upstream refused the call because its quota is exhausted.
    #[snafu(display("API rate limit reached: {message}"))]
    RateLimited {
        message: String,
        backtrace: Backtrace,
    },

    /// The request was aborted because a newer one superseded it.
    #[snafu(display("Request cancelled"))]
    Cancelled { backtrace: Backtrace },

    /// An internal error occurred while processing data within the provider.
    #[snafu(display("Internal provider error: {message}"))]
    Internal {
        message: String,
        backtrace: Backtrace,
    },
}

impl ProviderError {
    /// True for the deliberate-abort case, which callers drop silently.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ProviderError::Cancelled { .. })
    }
}

/// Read a failed response's body for use as an error reason.
///
/// Falls back to [`UNKNOWN_API_ERROR`] when the body cannot be read or is blank.
pub(crate) async fn error_reason(response: reqwest::Response) -> String {
    match response.text().await {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        _ => UNKNOWN_API_ERROR.to_string(),
    }
}
