//! Small helpers shared by the EOD client and viewer crates.

pub mod env;
