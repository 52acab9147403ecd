#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod api;
pub mod config;
pub mod error;
pub mod telemetry;

pub type Result<T> = std::result::Result<T, error::Error>;
