// Conduit - Health report routing with lineage tracking
// Copyright (c) 2025 Conduit Contributors
// Licensed under the MIT License

//! # Conduit - Health report routing with lineage tracking
//!
//! Conduit moves health reports between submitting organizations and
//! public-health destinations and records, for every pipeline step, which
//! reports went in and which came out.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Tracking** the reports an action receives, consumes, produces and sends
//! - **Persisting** the action, its report records and its parent/child edges
//!   atomically in one transaction
//! - **Delivering** reports through pluggable transports with partial-retry
//!   semantics
//!
//! ## Architecture
//!
//! Conduit follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (lineage engine, delivery loop)
//! - [`adapters`] - External integrations (PostgreSQL, memory store, transports)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use conduit::adapters::memory::MemoryStore;
//! use conduit::core::lineage::LineageTracker;
//! use conduit::domain::{
//!     ActionKind, Destination, Event, ReportBuilder, ReportSource, TransportKind,
//! };
//!
//! #[tokio::main]
//! async fn main() -> conduit::domain::Result<()> {
//!     let store = MemoryStore::new();
//!
//!     let input = ReportBuilder::new("covid-19", "covid-19")
//!         .source(ReportSource::client("simple_report", "default"))
//!         .item_count(10)
//!         .build();
//!     let output = ReportBuilder::new("covid-19", "covid-19").item_count(10).build();
//!     let destination =
//!         Destination::new("az-phd", "elr", "covid-19", "covid-19", TransportKind::Email);
//!
//!     let mut receive = LineageTracker::new(ActionKind::Receive);
//!     receive.register_received(&input)?;
//!     receive.commit(&store).await?;
//!
//!     let mut tracker = LineageTracker::new(ActionKind::Translate);
//!     tracker.register_consumed_input(input.id)?;
//!     tracker.register_produced(&Event::now(ActionKind::Send), &output, &destination)?;
//!
//!     let committed = tracker.commit(&store).await?;
//!     println!("action {} recorded {} edge(s)", committed.action_id, committed.edge_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Conduit uses the [`domain::ConduitError`] type for all errors. Programming
//! invariant violations (a report registered twice in one action) are kept
//! apart from retryable persistence and transport failures.
//!
//! ## Logging
//!
//! Conduit uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! use tracing::{info, warn};
//!
//! info!(action_id = 42, "Lineage committed");
//! warn!(destination = "az-phd.elr", "Delivery attempts exhausted");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
