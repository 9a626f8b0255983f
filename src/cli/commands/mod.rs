//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod deliver;
pub mod init;
pub mod lineage;
pub mod migrate;
pub mod validate;
