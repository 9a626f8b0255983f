//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Conduit configuration file.

use crate::config::load_config;
use crate::config::schema::StoreTarget;
use crate::config::ConduitConfig;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates after substitution and overrides
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                return Ok(2); // Configuration error exit code
            }
        };

        println!("✅ Configuration is valid");
        println!();
        print_summary(&config);
        println!();
        Ok(0)
    }
}

fn print_summary(config: &ConduitConfig) {
    println!("Configuration Summary:");
    println!("  Log Level: {}", config.application.log_level);
    println!("  Dry Run: {}", config.application.dry_run);

    match config.store_target {
        StoreTarget::PostgreSQL => {
            println!("  Store Target: PostgreSQL");
            if let Some(ref pg_config) = config.postgresql {
                use secrecy::ExposeSecret;
                println!(
                    "  PostgreSQL Connection: {}",
                    crate::adapters::postgresql::client::redact_connection_string(
                        pg_config.connection_string.expose_secret().as_ref()
                    )
                );
                println!("  Max Connections: {}", pg_config.max_connections);
                println!("  SSL Mode: {}", pg_config.ssl_mode);
            }
        }
        StoreTarget::Memory => println!("  Store Target: memory"),
    }

    println!("  Max Column Width: {}", config.lineage.max_column_width);
    println!("  Max Attempts: {}", config.delivery.max_attempts);
    println!(
        "  Retry Backoff: {}ms x{} (max {}ms)",
        config.delivery.retry.initial_delay_ms,
        config.delivery.retry.backoff_multiplier,
        config.delivery.retry.max_delay_ms
    );
    println!("  Send Timeout: {}s", config.delivery.send_timeout_seconds);

    if config.destinations.is_empty() {
        println!("  Destinations: none");
    } else {
        println!("  Destinations:");
        for destination in &config.destinations {
            println!(
                "    - {}.{} ({}/{}) via {}",
                destination.organization,
                destination.service,
                destination.schema_name,
                destination.topic,
                destination.transport
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_validate_memory_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
store_target = "memory"

[transports.file_drop]
directory = "/tmp/conduit-out"

[[destinations]]
organization = "az-phd"
service = "elr"
schema_name = "covid-19"
topic = "covid-19"
transport = "file_drop"
"#
        )
        .unwrap();

        let code = ValidateArgs {}
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_validate_missing_file() {
        let code = ValidateArgs {}
            .execute("/nonexistent/conduit.toml")
            .await
            .unwrap();
        assert_eq!(code, 2);
    }
}
