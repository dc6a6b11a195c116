//! Session handling for the counter-series system.
//!
//! This crate provides:
//! - A scoped, expiring store of computed tables keyed by opaque session id
//! - Lossless JSON snapshots for handing a table to a follow-up query

pub mod snapshot;
pub mod store;

pub use snapshot::{table_from_json, table_to_json, TableSnapshot};
pub use store::{SessionId, SessionStore};
