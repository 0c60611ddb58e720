//! Fetch lifecycle state.
//!
//! [`FetchState`] replaces a loose set of loading/error/data flags with one
//! value whose fields only move together. Its transition methods are
//! crate-private: the [`Controller`](crate::controller::Controller) is the
//! only writer.

use std::fmt;

use eod_client::models::{EodResponse, Pagination, PriceRecord};
use serde::Serialize;

/// Discrete stage of the fetch lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Nothing submitted yet.
    #[default]
    Idle,
    /// A request is in flight.
    Loading,
    /// The latest request succeeded.
    Success,
    /// Validation or the latest request failed.
    Failed,
}

/// Identifies one issued request. Tokens increase monotonically per
/// controller, so a later submission always holds a larger token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RequestToken(pub(crate) u64);

impl RequestToken {
    /// Raw sequence number, for logging.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Session-scoped fetch state.
///
/// `records` always hold the most recent *successful* result; a failure
/// afterwards leaves them in place. `error_message` is set only while
/// `phase == Failed`.
#[derive(Debug, Clone, Default)]
pub struct FetchState {
    phase: Phase,
    query: String,
    records: Vec<PriceRecord>,
    pagination: Option<Pagination>,
    error_message: Option<String>,
    active_token: Option<RequestToken>,
}

impl FetchState {
    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Normalised query of the current or pending result. Empty until the
    /// first valid submission.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Records of the last successful fetch.
    pub fn records(&self) -> &[PriceRecord] {
        &self.records
    }

    /// Pagination of the last successful fetch.
    pub fn pagination(&self) -> Option<&Pagination> {
        self.pagination.as_ref()
    }

    /// Failure reason, present only in [`Phase::Failed`].
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Token of the request whose result will be accepted, if any.
    pub fn active_token(&self) -> Option<RequestToken> {
        self.active_token
    }

    /// Valid submission: a new request is now the only one that counts.
    pub(crate) fn begin(&mut self, query: String, token: RequestToken) {
        self.phase = Phase::Loading;
        self.query = query;
        self.error_message = None;
        self.active_token = Some(token);
    }

    /// Input rejected before any request. In-flight request and data stay.
    pub(crate) fn reject(&mut self, message: String) {
        self.phase = Phase::Failed;
        self.error_message = Some(message);
    }

    /// Active request succeeded.
    pub(crate) fn succeed(&mut self, response: EodResponse) {
        self.phase = Phase::Success;
        self.records = response.data;
        self.pagination = Some(response.pagination);
        self.error_message = None;
        self.active_token = None;
    }

    /// Active request failed. Previous records stay visible.
    pub(crate) fn fail(&mut self, message: String) {
        self.phase = Phase::Failed;
        self.error_message = Some(message);
        self.active_token = None;
    }
}
