//! Atomic persistence of one action
//!
//! Writes the action row, its report records and its lineage edges through a
//! single [`TransactionScope`]. The coordinator never commits or rolls back;
//! that belongs to whoever owns the scope.

use super::graph::LineageGraph;
use crate::adapters::database::traits::{NewAction, TransactionScope};
use crate::domain::{truncate_to_width, Action, ActionId, ReportRecord, Result};
use chrono::Utc;
use serde::Serialize;

/// Width of the diagnostic text columns in the lineage schema
pub const DEFAULT_MAX_COLUMN_WIDTH: usize = 2048;

/// Summary of a committed action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommittedAction {
    /// Store-assigned action identifier
    pub action_id: ActionId,

    /// Report records inserted
    pub report_count: usize,

    /// Lineage edges inserted
    pub edge_count: usize,
}

/// Runs the four persistence steps inside a caller-owned scope
#[derive(Debug, Clone, Copy)]
pub struct PersistenceCoordinator {
    max_column_width: usize,
}

impl Default for PersistenceCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_COLUMN_WIDTH)
    }
}

impl PersistenceCoordinator {
    /// Creates a coordinator truncating diagnostic text to `max_column_width`
    pub fn new(max_column_width: usize) -> Self {
        Self { max_column_width }
    }

    /// Persist an action, its records and its edges
    ///
    /// 1. insert the action row and obtain its id
    /// 2. stamp the id onto every pending record
    /// 3. insert the records
    /// 4. insert the edges for the now-known action id
    ///
    /// # Errors
    ///
    /// Returns the first store error; the caller must roll the scope back.
    pub async fn persist(
        &self,
        scope: &mut dyn TransactionScope,
        action: &Action,
        records: Vec<ReportRecord>,
        graph: &LineageGraph,
    ) -> Result<CommittedAction> {
        let new_action = NewAction {
            kind: action.kind,
            params: action.params.to_column(self.max_column_width),
            result: action.result.to_column(self.max_column_width),
            created_at: action.created_at,
        };
        let action_id = scope.insert_action(&new_action).await?;
        tracing::debug!(action_id = %action_id, action = %action.kind, "Inserted action row");

        let report_count = records.len();
        for mut record in records {
            record.action_id = Some(action_id);
            record.transport_params = record.transport_params.map(|t| self.limit(&t));
            record.transport_result = record.transport_result.map(|t| self.limit(&t));
            scope.insert_report(&record).await?;
        }

        let edges = graph.edges(action_id, Utc::now());
        if !edges.is_empty() {
            scope.insert_lineage(&edges).await?;
        }

        Ok(CommittedAction {
            action_id,
            report_count,
            edge_count: edges.len(),
        })
    }

    fn limit(&self, text: &str) -> String {
        truncate_to_width(text, self.max_column_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::database::traits::LineageStore;
    use crate::adapters::memory::MemoryStore;
    use crate::domain::{ActionKind, ReportId};

    #[tokio::test]
    async fn test_persist_truncates_diagnostics() {
        let store = MemoryStore::new();
        let mut action = Action::new(ActionKind::Send);
        action.result.append("x".repeat(100));

        let mut record = ReportRecord::new(ReportId::new(), "s", "t", "CSV", 1);
        record.transport_result = Some("y".repeat(100));
        let report_id = record.report_id;

        let coordinator = PersistenceCoordinator::new(10);
        let mut scope = store.begin().await.unwrap();
        let committed = coordinator
            .persist(scope.as_mut(), &action, vec![record], &LineageGraph::default())
            .await
            .unwrap();
        scope.commit().await.unwrap();

        let stored = store.find_action(committed.action_id).await.unwrap().unwrap();
        assert_eq!(stored.action_result.as_deref(), Some("x".repeat(10).as_str()));
        let report = store.find_report(report_id).await.unwrap().unwrap();
        assert_eq!(report.transport_result.as_deref(), Some("y".repeat(10).as_str()));
        assert_eq!(report.action_id, Some(committed.action_id));
    }

    #[tokio::test]
    async fn test_persist_empty_logs_store_null() {
        let store = MemoryStore::new();
        let action = Action::new(ActionKind::Receive);

        let mut scope = store.begin().await.unwrap();
        let committed = PersistenceCoordinator::default()
            .persist(scope.as_mut(), &action, Vec::new(), &LineageGraph::default())
            .await
            .unwrap();
        scope.commit().await.unwrap();

        let stored = store.find_action(committed.action_id).await.unwrap().unwrap();
        assert!(stored.action_params.is_none());
        assert_eq!(committed.report_count, 0);
        assert_eq!(committed.edge_count, 0);
    }
}
