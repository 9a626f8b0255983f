//! Core business logic for Conduit.
//!
//! # Modules
//!
//! - [`lineage`] - Per-action report classification, lineage graph and
//!   atomic persistence
//! - [`delivery`] - Send action driver with retry and result bookkeeping
//!
//! # Action Workflow
//!
//! 1. **Track**: create a [`lineage::LineageTracker`] and register the
//!    reports the action receives, consumes and produces
//! 2. **Deliver** (send actions): fan out to destinations through
//!    [`delivery::DeliveryAgent`], which records one sent report per
//!    destination
//! 3. **Commit**: write the action, its reports and its lineage edges in
//!    one transaction
//!
//! # Example
//!
//! ```rust,no_run
//! use conduit::adapters::memory::MemoryStore;
//! use conduit::core::lineage::LineageTracker;
//! use conduit::domain::{ActionKind, ReportBuilder, ReportSource};
//!
//! # async fn example() -> conduit::domain::Result<()> {
//! let store = MemoryStore::new();
//! let report = ReportBuilder::new("covid-19", "covid-19")
//!     .source(ReportSource::client("simple_report", "default"))
//!     .item_count(12)
//!     .build();
//!
//! let mut tracker = LineageTracker::new(ActionKind::Receive);
//! tracker.register_received(&report)?;
//! let committed = tracker.commit(&store).await?;
//! println!("action {} wrote {} report(s)", committed.action_id, committed.report_count);
//! # Ok(())
//! # }
//! ```

pub mod delivery;
pub mod lineage;
