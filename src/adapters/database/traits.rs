//! Lineage store abstraction traits
//!
//! This module defines the traits a storage backend must implement to hold
//! actions, report records and lineage edges. Writes only happen through a
//! [`TransactionScope`]; nothing written through a scope is visible to other
//! readers until [`TransactionScope::commit`] returns.

use crate::domain::{
    ActionId, ActionKind, ActionRecord, LineageEdge, ReportId, ReportRecord, Result,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Action row ready for insertion
///
/// Text fields are already limited to the column width.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAction {
    /// Kind of step
    pub kind: ActionKind,

    /// Parameters log
    pub params: Option<String>,

    /// Result log
    pub result: Option<String>,

    /// When the action started
    pub created_at: DateTime<Utc>,
}

/// Row totals across the three lineage tables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowCounts {
    /// Rows in `action`
    pub actions: u64,

    /// Rows in `report_file`
    pub reports: u64,

    /// Rows in `report_lineage`
    pub lineage: u64,
}

/// A single open transaction against the store
///
/// Dropping a scope without calling `commit` or `rollback` must never leave
/// its writes visible.
#[async_trait]
pub trait TransactionScope: Send {
    /// Insert the action row and return its generated identifier
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    async fn insert_action(&mut self, action: &NewAction) -> Result<ActionId>;

    /// Insert one report record
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails (e.g. the report already exists).
    async fn insert_report(&mut self, record: &ReportRecord) -> Result<()>;

    /// Insert lineage edges
    ///
    /// # Errors
    ///
    /// Returns an error if any edge references an unknown action or report.
    async fn insert_lineage(&mut self, edges: &[LineageEdge]) -> Result<()>;

    /// Make all writes in this scope durable and visible
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Discard all writes in this scope
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Durable storage for lineage data
#[async_trait]
pub trait LineageStore: Send + Sync {
    /// Test the store connection
    async fn test_connection(&self) -> Result<()>;

    /// Create tables and indexes if they don't exist
    async fn ensure_schema(&self) -> Result<()>;

    /// Open a new transaction scope
    ///
    /// # Errors
    ///
    /// Returns an error if no connection is available or `BEGIN` fails.
    async fn begin(&self) -> Result<Box<dyn TransactionScope>>;

    /// Load a committed action
    async fn find_action(&self, action_id: ActionId) -> Result<Option<ActionRecord>>;

    /// Load a committed report record
    async fn find_report(&self, report_id: ReportId) -> Result<Option<ReportRecord>>;

    /// Report records owned by an action
    async fn reports_for_action(&self, action_id: ActionId) -> Result<Vec<ReportRecord>>;

    /// Lineage edges created by an action
    async fn lineage_for_action(&self, action_id: ActionId) -> Result<Vec<LineageEdge>>;

    /// Edges whose child is `report_id`
    async fn parents_of(&self, report_id: ReportId) -> Result<Vec<LineageEdge>>;

    /// Edges whose parent is `report_id`
    async fn children_of(&self, report_id: ReportId) -> Result<Vec<LineageEdge>>;

    /// Row totals across the lineage tables
    async fn row_counts(&self) -> Result<RowCounts>;

    /// Backend name for logging
    fn store_name(&self) -> &str;
}
