//! BTC Price Gateway Library
//!
//! Exposes the price pipeline, derived views and HTTP layer for use in the
//! binary, benchmarks and integration tests.

pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
