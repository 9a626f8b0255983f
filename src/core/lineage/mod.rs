//! Lineage tracking engine
//!
//! - [`registry`] classifies the reports an action touches
//! - [`graph`] derives parent to child edges
//! - [`persistence`] writes an action atomically
//! - [`tracker`] ties them together for one action

pub mod graph;
pub mod persistence;
pub mod registry;
pub mod tracker;

pub use graph::LineageGraph;
pub use persistence::{CommittedAction, PersistenceCoordinator, DEFAULT_MAX_COLUMN_WIDTH};
pub use registry::{Classification, ReportRegistry, SentReport};
pub use tracker::LineageTracker;
