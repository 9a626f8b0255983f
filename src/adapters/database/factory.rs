//! Lineage store factory
//!
//! This module provides the factory function that creates a store based on
//! configuration.

use crate::adapters::database::traits::LineageStore;
use crate::adapters::memory::MemoryStore;
use crate::adapters::postgresql::{PostgreSQLClient, PostgreSQLStore};
use crate::config::schema::{ConduitConfig, StoreTarget};
use crate::domain::{ConduitError, Result};
use std::sync::Arc;

/// Create a lineage store based on the configuration
///
/// Dry-run mode always selects the in-memory store so nothing is written.
///
/// # Errors
///
/// Returns an error if the selected backend is missing its configuration or
/// its client cannot be created.
pub async fn create_lineage_store(config: &ConduitConfig) -> Result<Arc<dyn LineageStore>> {
    if config.application.dry_run {
        tracing::info!("DRY RUN: using in-memory lineage store");
        return Ok(Arc::new(MemoryStore::new()));
    }

    match config.store_target {
        StoreTarget::PostgreSQL => {
            let pg_config = config.postgresql.as_ref().ok_or_else(|| {
                ConduitError::Configuration(
                    "postgresql configuration is required when store_target = 'postgresql'"
                        .to_string(),
                )
            })?;

            let client = PostgreSQLClient::new(pg_config.clone()).await?;
            tracing::info!(
                connection = %client.connection_string_safe(),
                "Creating PostgreSQL lineage store"
            );
            Ok(Arc::new(PostgreSQLStore::new(client)))
        }
        StoreTarget::Memory => {
            tracing::info!("Creating in-memory lineage store");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
