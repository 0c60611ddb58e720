//! Validation and normalisation of the user's ticker input.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Rejected ticker input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Nothing but whitespace and separators.
    #[error("at least one ticker symbol required")]
    Empty,
}

/// A normalised ticker query: trimmed and upper-cased, otherwise exactly as
/// typed (`"aapl, msft "` becomes `"AAPL, MSFT"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolQuery(String);

impl SymbolQuery {
    /// Validate and normalise raw input.
    ///
    /// Errors with [`QueryError::Empty`] when the input holds no symbol at all,
    /// including separator-only input such as `" , "`.
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        let normalized = raw.trim().to_uppercase();
        let query = Self(normalized);
        if query.symbols().next().is_none() {
            return Err(QueryError::Empty);
        }
        Ok(query)
    }

    /// The normalised query text sent to the provider.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Individual symbols, split on commas and trimmed.
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.0.split(',').map(str::trim).filter(|s| !s.is_empty())
    }

    /// Consume into the normalised text.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl FromStr for SymbolQuery {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SymbolQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
