//! Direct Alpha Vantage access.
//!
//! The EOD endpoint is normally served by a backend that fans out to Alpha
//! Vantage one symbol at a time. This provider does the same fan-out in
//! process: one `TIME_SERIES_MONTHLY` call per symbol, results concatenated in
//! request order. A symbol that fails (quota, unknown ticker, bad payload) is
//! logged and skipped so the remaining symbols still come back. When no symbol
//! succeeds the last error is returned instead of an empty page.

pub mod response;

use std::{num::NonZeroU32, time::Duration};

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use shared_utils::env::get_secret_env_var;
use snafu::ResultExt;
use tracing::{debug, warn};

use crate::{
    models::{EodResponse, Pagination, PriceRecord},
    providers::{
        ApiSnafu, ClientBuildSnafu, EodProvider, InternalSnafu, MissingEnvVarSnafu,
        ProviderError, ProviderInitError, RateLimitedSnafu, ReqwestSnafu, error_reason,
        alpha_vantage::response::{MonthlyBar, MonthlyResponse},
    },
};

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co";

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "ALPHAVANTAGE_API_KEY";

/// Free-tier request quota.
pub const DEFAULT_REQUESTS_PER_MINUTE: NonZeroU32 = nonzero!(5u32);

pub struct AlphaVantageProvider {
    client: Client,
    query_url: String,
    api_key: SecretString,
    limiter: DefaultDirectRateLimiter,
}

impl AlphaVantageProvider {
    /// Creates a provider reading the key from `ALPHAVANTAGE_API_KEY`.
    pub fn new(
        base_url: &str,
        timeout: Option<Duration>,
        requests_per_minute: NonZeroU32,
    ) -> Result<Self, ProviderInitError> {
        let api_key = get_secret_env_var(API_KEY_VAR).context(MissingEnvVarSnafu)?;
        Self::with_api_key(base_url, api_key, timeout, requests_per_minute)
    }

    pub fn with_api_key(
        base_url: &str,
        api_key: SecretString,
        timeout: Option<Duration>,
        requests_per_minute: NonZeroU32,
    ) -> Result<Self, ProviderInitError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context(ClientBuildSnafu)?;

        Ok(Self {
            client,
            query_url: format!("{}/query", base_url.trim_end_matches('/')),
            api_key,
            limiter: RateLimiter::direct(Quota::per_minute(requests_per_minute)),
        })
    }

    async fn fetch_symbol(&self, symbol: &str) -> Result<Vec<PriceRecord>, ProviderError> {
        self.limiter.until_ready().await;
        debug!(symbol, "calling alpha vantage");

        let response = self
            .client
            .get(&self.query_url)
            .query(&[
                ("function", "TIME_SERIES_MONTHLY"),
                ("symbol", symbol),
                ("apikey", self.api_key.expose_secret()),
            ])
            .send()
            .await
            .context(ReqwestSnafu)?;

        let status = response.status();
        if !status.is_success() {
            let message = error_reason(response).await;
            return ApiSnafu {
                status: status.as_u16(),
                message,
            }
            .fail();
        }

        let body = response.json::<MonthlyResponse>().await.context(ReqwestSnafu)?;

        if let Some(info) = body.information.as_deref().or(body.note.as_deref()) {
            if info.contains("rate limit") || info.contains("call frequency") {
                return RateLimitedSnafu { message: info }.fail();
            }
        }
        if let Some(message) = body.error_message {
            return ApiSnafu {
                status: status.as_u16(),
                message,
            }
            .fail();
        }

        body.monthly_time_series
            .into_iter()
            .map(|(date, bar)| to_record(symbol, date, bar))
            .collect()
    }
}

fn parse_number(symbol: &str, field: &str, raw: &str) -> Result<f64, ProviderError> {
    raw.trim().parse::<f64>().map_err(|_| {
        InternalSnafu {
            message: format!("{symbol}: unparseable {field} value {raw:?}"),
        }
        .build()
    })
}

fn to_record(symbol: &str, date: String, bar: MonthlyBar) -> Result<PriceRecord, ProviderError> {
    let volume = match bar.volume.trim().parse::<u64>() {
        Ok(v) => v,
        Err(_) => parse_number(symbol, "volume", &bar.volume)?.max(0.0).round() as u64,
    };

    Ok(PriceRecord {
        symbol: symbol.to_string(),
        exchange: String::new(),
        date,
        open: parse_number(symbol, "open", &bar.open)?,
        high: parse_number(symbol, "high", &bar.high)?,
        low: parse_number(symbol, "low", &bar.low)?,
        close: parse_number(symbol, "close", &bar.close)?,
        volume,
    })
}

#[async_trait]
impl EodProvider for AlphaVantageProvider {
    async fn fetch_eod(&self, symbols: &str) -> Result<EodResponse, ProviderError> {
        let mut data = Vec::new();
        let mut any_succeeded = false;
        let mut last_error = None;

        for symbol in symbols.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match self.fetch_symbol(symbol).await {
                Ok(records) => {
                    debug!(symbol, records = records.len(), "symbol fetched");
                    any_succeeded = true;
                    data.extend(records);
                }
                Err(err) => {
                    warn!(symbol, error = %err, "skipping symbol");
                    last_error = Some(err);
                }
            }
        }

        if let (false, Some(err)) = (any_succeeded, last_error) {
            return Err(err);
        }

        Ok(EodResponse {
            pagination: Pagination::single_page(data.len()),
            data,
        })
    }
}
