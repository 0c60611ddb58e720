//! Envelope returned by the `/api/stocks/eod` endpoint.

use serde::{Deserialize, Serialize};

use crate::models::price_record::PriceRecord;

/// Paging metadata. Passed through untouched for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub total: u64,
}

impl Pagination {
    /// Pagination for a single, complete page of `len` records.
    pub fn single_page(len: usize) -> Self {
        Self {
            limit: 0,
            offset: 0,
            count: len as u64,
            total: len as u64,
        }
    }
}

/// A successful EOD response: paging metadata plus the flat record list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EodResponse {
    #[serde(default)]
    pub pagination: Pagination,
    #[serde(default)]
    pub data: Vec<PriceRecord>,
}
