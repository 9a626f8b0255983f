//! Migrate command implementation
//!
//! Applies the embedded lineage schema to the configured store.

use crate::adapters::database::create_lineage_store;
use crate::config::load_config;
use clap::Args;

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {}

impl MigrateArgs {
    /// Execute the migrate command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Applying lineage schema");

        println!("🗄️  Applying lineage schema");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        let store = match create_lineage_store(&config).await {
            Ok(s) => s,
            Err(e) => {
                println!("❌ Failed to connect to lineage store");
                println!("   Error: {e}");
                return Ok(4); // Connection error exit code
            }
        };

        if let Err(e) = store.test_connection().await {
            println!("❌ Failed to connect to lineage store");
            println!("   Error: {e}");
            return Ok(4); // Connection error exit code
        }

        if let Err(e) = store.ensure_schema().await {
            tracing::error!(store = store.store_name(), error = %e, "Schema migration failed");
            println!("❌ Schema migration failed");
            println!("   Error: {e}");
            return Ok(5); // Fatal error exit code
        }

        let counts = store.row_counts().await?;
        println!("✅ Lineage schema ready on {}", store.store_name());
        println!("   action: {} row(s)", counts.actions);
        println!("   report_file: {} row(s)", counts.reports);
        println!("   report_lineage: {} row(s)", counts.lineage);
        println!();
        Ok(0)
    }
}
