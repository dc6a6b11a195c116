//! Core types and configuration for the counter-series system.
//!
//! This crate provides shared types used across all other crates:
//! - Event and dense-table row types
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::{AggregationConfig, ColumnConfig, Config, LoaderConfig, SessionConfig};
pub use error::{Error, Result};
pub use types::*;
