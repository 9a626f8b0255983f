//! Configuration management for Conduit.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! Conduit uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `CONDUIT_*` environment overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use conduit::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("conduit.toml")?;
//!
//! println!("Store: {:?}", config.store_target);
//! for destination in &config.destinations {
//!     println!("Destination: {}.{}", destination.organization, destination.service);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Example Configuration
//!
//! ```toml
//! store_target = "postgresql"
//!
//! [application]
//! log_level = "info"
//!
//! [postgresql]
//! connection_string = "${CONDUIT_PG_URL}"
//!
//! [lineage]
//! max_column_width = 2048
//!
//! [delivery]
//! max_attempts = 3
//!
//! [transports.email]
//! smtp_host = "smtp.example.org"
//! from = "conduit@example.org"
//! to = ["reports@phd.example.org"]
//!
//! [[destinations]]
//! organization = "az-phd"
//! service = "elr"
//! schema_name = "covid-19"
//! topic = "covid-19"
//! transport = "email"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, ConduitConfig, DeliveryConfig, DestinationConfig, EmailTransportConfig,
    FileDropConfig, LineageConfig, LoggingConfig, PostgreSQLConfig, RestTransportConfig,
    RetryConfig, StoreTarget, TransportsConfig,
};
pub use secret::{secret_string, secret_string_opt, SecretString, SecretValue};
