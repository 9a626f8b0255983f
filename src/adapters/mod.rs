//! External system integrations for Conduit.
//!
//! - [`database`] - Lineage store abstraction (trait-based) and factory
//! - [`postgresql`] - PostgreSQL lineage store
//! - [`memory`] - In-memory lineage store for dry runs and tests
//! - [`transport`] - Delivery transports (email, file drop, REST)
//!
//! # Design Pattern
//!
//! Adapters isolate external dependencies behind traits so the lineage
//! engine and delivery loop can be tested with in-process implementations.
//!
//! ```rust,no_run
//! use conduit::adapters::database::create_lineage_store;
//! use conduit::config::load_config;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("conduit.toml")?;
//! let store = create_lineage_store(&config).await?;
//! store.ensure_schema().await?;
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod memory;
pub mod postgresql;
pub mod transport;
