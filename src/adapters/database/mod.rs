//! Lineage store abstraction layer
//!
//! This module provides a trait-based abstraction for lineage persistence,
//! allowing Conduit to work with different backends (PostgreSQL, in-memory).

pub mod factory;
pub mod traits;

pub use factory::create_lineage_store;
pub use traits::{LineageStore, NewAction, RowCounts, TransactionScope};
