//! Retrieval side of the EOD viewer: wire models for end-of-day price data and
//! the providers that fetch it.

pub mod models;
pub mod providers;
