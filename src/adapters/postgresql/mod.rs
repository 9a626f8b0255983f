//! PostgreSQL lineage storage
//!
//! This module provides the pooled client and the transactional lineage
//! store backed by it.

pub mod client;
pub mod models;
pub mod store;

pub use client::PostgreSQLClient;
pub use store::PostgreSQLStore;
