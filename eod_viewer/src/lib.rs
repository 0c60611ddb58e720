//! Core of the EOD viewer: turns a raw ticker string into a race-safe fetch
//! lifecycle and a date-aligned price matrix for charting.

#![warn(missing_docs)]

pub mod config;
pub mod controller;
pub mod pivot;
pub mod providers;
pub mod query;
pub mod state;
pub mod view;
