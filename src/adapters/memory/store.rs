//! In-memory lineage store
//!
//! Writes made through a scope are buffered in the scope and applied to the
//! shared tables under one lock acquisition at commit. A scope that is
//! dropped or rolled back simply discards its buffer. Primary and foreign
//! key rules match the PostgreSQL schema so both backends reject the same
//! commits.

use crate::adapters::database::traits::{LineageStore, NewAction, RowCounts, TransactionScope};
use crate::domain::{
    ActionId, ActionRecord, ConduitError, LineageEdge, ReportId, ReportRecord, Result,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Persistence step at which an injected failure fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    /// `insert_action`
    InsertAction,
    /// `insert_report`
    InsertReport,
    /// `insert_lineage`
    InsertLineage,
    /// `commit`
    Commit,
}

#[derive(Debug, Default)]
struct Tables {
    actions: HashMap<ActionId, ActionRecord>,
    reports: HashMap<ReportId, ReportRecord>,
    lineage: Vec<LineageEdge>,
}

#[derive(Debug, Default)]
struct Shared {
    tables: Mutex<Tables>,
    next_action_id: AtomicI64,
    failure: Mutex<Option<FailurePoint>>,
}

impl Shared {
    fn tables(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| ConduitError::Persistence("memory store lock poisoned".to_string()))
    }
}

/// Lineage store backed by process memory
///
/// Cloning is cheap and clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next transaction fail at `point`
    ///
    /// The failure fires once and is then cleared.
    pub fn fail_next_at(&self, point: FailurePoint) {
        if let Ok(mut failure) = self.shared.failure.lock() {
            *failure = Some(point);
        }
    }

    fn take_failure(&self) -> Option<FailurePoint> {
        self.shared
            .failure
            .lock()
            .ok()
            .and_then(|mut failure| failure.take())
    }
}

#[async_trait]
impl LineageStore for MemoryStore {
    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn TransactionScope>> {
        Ok(Box::new(MemoryScope {
            shared: self.shared.clone(),
            failure: self.take_failure(),
            actions: Vec::new(),
            reports: Vec::new(),
            lineage: Vec::new(),
        }))
    }

    async fn find_action(&self, action_id: ActionId) -> Result<Option<ActionRecord>> {
        Ok(self.shared.tables()?.actions.get(&action_id).cloned())
    }

    async fn find_report(&self, report_id: ReportId) -> Result<Option<ReportRecord>> {
        Ok(self.shared.tables()?.reports.get(&report_id).cloned())
    }

    async fn reports_for_action(&self, action_id: ActionId) -> Result<Vec<ReportRecord>> {
        let tables = self.shared.tables()?;
        let mut reports: Vec<ReportRecord> = tables
            .reports
            .values()
            .filter(|r| r.action_id == Some(action_id))
            .cloned()
            .collect();
        reports.sort_by_key(|r| r.created_at);
        Ok(reports)
    }

    async fn lineage_for_action(&self, action_id: ActionId) -> Result<Vec<LineageEdge>> {
        let tables = self.shared.tables()?;
        Ok(tables
            .lineage
            .iter()
            .filter(|e| e.action_id == action_id)
            .copied()
            .collect())
    }

    async fn parents_of(&self, report_id: ReportId) -> Result<Vec<LineageEdge>> {
        let tables = self.shared.tables()?;
        Ok(tables
            .lineage
            .iter()
            .filter(|e| e.child_report_id == report_id)
            .copied()
            .collect())
    }

    async fn children_of(&self, report_id: ReportId) -> Result<Vec<LineageEdge>> {
        let tables = self.shared.tables()?;
        Ok(tables
            .lineage
            .iter()
            .filter(|e| e.parent_report_id == report_id)
            .copied()
            .collect())
    }

    async fn row_counts(&self) -> Result<RowCounts> {
        let tables = self.shared.tables()?;
        Ok(RowCounts {
            actions: tables.actions.len() as u64,
            reports: tables.reports.len() as u64,
            lineage: tables.lineage.len() as u64,
        })
    }

    fn store_name(&self) -> &str {
        "memory"
    }
}

struct MemoryScope {
    shared: Arc<Shared>,
    failure: Option<FailurePoint>,
    actions: Vec<ActionRecord>,
    reports: Vec<ReportRecord>,
    lineage: Vec<LineageEdge>,
}

impl MemoryScope {
    fn check_failure(&self, point: FailurePoint) -> Result<()> {
        if self.failure == Some(point) {
            return Err(ConduitError::Persistence(format!(
                "injected failure at {point:?}"
            )));
        }
        Ok(())
    }

    fn action_known(&self, tables: &Tables, action_id: ActionId) -> bool {
        tables.actions.contains_key(&action_id)
            || self.actions.iter().any(|a| a.action_id == action_id)
    }

    fn report_known(&self, tables: &Tables, report_id: ReportId) -> bool {
        tables.reports.contains_key(&report_id)
            || self.reports.iter().any(|r| r.report_id == report_id)
    }
}

#[async_trait]
impl TransactionScope for MemoryScope {
    async fn insert_action(&mut self, action: &NewAction) -> Result<ActionId> {
        self.check_failure(FailurePoint::InsertAction)?;

        // Like a sequence, ids are consumed even if the scope rolls back.
        let action_id = ActionId::new(self.shared.next_action_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.actions.push(ActionRecord {
            action_id,
            action_name: action.kind,
            action_params: action.params.clone(),
            action_result: action.result.clone(),
            created_at: action.created_at,
        });
        Ok(action_id)
    }

    async fn insert_report(&mut self, record: &ReportRecord) -> Result<()> {
        self.check_failure(FailurePoint::InsertReport)?;

        let tables = self.shared.tables()?;
        if self.report_known(&tables, record.report_id) {
            return Err(ConduitError::Persistence(format!(
                "duplicate key: report_file.report_id = {}",
                record.report_id
            )));
        }
        match record.action_id {
            Some(action_id) if self.action_known(&tables, action_id) => {}
            other => {
                return Err(ConduitError::Persistence(format!(
                    "foreign key violation: report_file.action_id = {other:?}"
                )))
            }
        }
        drop(tables);

        self.reports.push(record.clone());
        Ok(())
    }

    async fn insert_lineage(&mut self, edges: &[LineageEdge]) -> Result<()> {
        self.check_failure(FailurePoint::InsertLineage)?;

        let tables = self.shared.tables()?;
        let mut seen: HashSet<(ActionId, ReportId, ReportId)> = self
            .lineage
            .iter()
            .map(|e| (e.action_id, e.parent_report_id, e.child_report_id))
            .collect();

        for edge in edges {
            if !self.action_known(&tables, edge.action_id) {
                return Err(ConduitError::Persistence(format!(
                    "foreign key violation: report_lineage.action_id = {}",
                    edge.action_id
                )));
            }
            for report_id in [edge.parent_report_id, edge.child_report_id] {
                if !self.report_known(&tables, report_id) {
                    return Err(ConduitError::Persistence(format!(
                        "foreign key violation: report_lineage references unknown report {report_id}"
                    )));
                }
            }
            if !seen.insert((edge.action_id, edge.parent_report_id, edge.child_report_id)) {
                return Err(ConduitError::Persistence(format!(
                    "duplicate lineage edge {} -> {}",
                    edge.parent_report_id, edge.child_report_id
                )));
            }
        }
        drop(tables);

        self.lineage.extend_from_slice(edges);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.check_failure(FailurePoint::Commit)?;

        let scope = *self;
        let mut tables = scope.shared.tables()?;

        // Another scope may have committed the same keys since they were buffered.
        for report in &scope.reports {
            if tables.reports.contains_key(&report.report_id) {
                return Err(ConduitError::Persistence(format!(
                    "duplicate key: report_file.report_id = {}",
                    report.report_id
                )));
            }
        }
        for edge in &scope.lineage {
            for report_id in [edge.parent_report_id, edge.child_report_id] {
                if !scope.report_known(&tables, report_id) {
                    return Err(ConduitError::Persistence(format!(
                        "foreign key violation: report_lineage references unknown report {report_id}"
                    )));
                }
            }
        }

        for action in scope.actions {
            tables.actions.insert(action.action_id, action);
        }
        for report in scope.reports {
            tables.reports.insert(report.report_id, report);
        }
        tables.lineage.extend(scope.lineage);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ActionKind;
    use chrono::Utc;

    fn new_action() -> NewAction {
        NewAction {
            kind: ActionKind::Receive,
            params: Some("params".to_string()),
            result: None,
            created_at: Utc::now(),
        }
    }

    fn record(action_id: ActionId) -> ReportRecord {
        let mut record = ReportRecord::new(ReportId::new(), "schema", "topic", "CSV", 3);
        record.action_id = Some(action_id);
        record
    }

    #[tokio::test]
    async fn test_writes_invisible_until_commit() {
        let store = MemoryStore::new();
        let mut scope = store.begin().await.unwrap();
        let action_id = scope.insert_action(&new_action()).await.unwrap();
        scope.insert_report(&record(action_id)).await.unwrap();

        assert_eq!(store.row_counts().await.unwrap(), RowCounts::default());
        assert!(store.find_action(action_id).await.unwrap().is_none());

        scope.commit().await.unwrap();
        let counts = store.row_counts().await.unwrap();
        assert_eq!(counts.actions, 1);
        assert_eq!(counts.reports, 1);
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let store = MemoryStore::new();
        let mut scope = store.begin().await.unwrap();
        let action_id = scope.insert_action(&new_action()).await.unwrap();
        scope.insert_report(&record(action_id)).await.unwrap();
        scope.rollback().await.unwrap();

        assert_eq!(store.row_counts().await.unwrap(), RowCounts::default());
    }

    #[tokio::test]
    async fn test_action_ids_increase() {
        let store = MemoryStore::new();
        let mut scope = store.begin().await.unwrap();
        let first = scope.insert_action(&new_action()).await.unwrap();
        let second = scope.insert_action(&new_action()).await.unwrap();
        assert!(second > first);
    }

    #[tokio::test]
    async fn test_duplicate_report_rejected() {
        let store = MemoryStore::new();
        let mut scope = store.begin().await.unwrap();
        let action_id = scope.insert_action(&new_action()).await.unwrap();
        let rec = record(action_id);
        scope.insert_report(&rec).await.unwrap();
        let err = scope.insert_report(&rec).await.unwrap_err();
        assert!(matches!(err, ConduitError::Persistence(_)));
    }

    #[tokio::test]
    async fn test_lineage_requires_known_reports() {
        let store = MemoryStore::new();
        let mut scope = store.begin().await.unwrap();
        let action_id = scope.insert_action(&new_action()).await.unwrap();
        let child = record(action_id);
        scope.insert_report(&child).await.unwrap();

        let edge = LineageEdge {
            action_id,
            parent_report_id: ReportId::new(),
            child_report_id: child.report_id,
            created_at: Utc::now(),
        };
        let err = scope.insert_lineage(&[edge]).await.unwrap_err();
        assert!(err.to_string().contains("foreign key"));
    }

    #[tokio::test]
    async fn test_concurrent_scopes_cannot_claim_same_report() {
        let store = MemoryStore::new();
        let report_id = ReportId::new();

        let mut first = store.begin().await.unwrap();
        let mut second = store.begin().await.unwrap();
        for scope in [&mut first, &mut second] {
            let action_id = scope.insert_action(&new_action()).await.unwrap();
            let mut rec = record(action_id);
            rec.report_id = report_id;
            scope.insert_report(&rec).await.unwrap();
        }

        first.commit().await.unwrap();
        let owner = store.find_report(report_id).await.unwrap().unwrap().action_id;

        let err = second.commit().await.unwrap_err();
        assert!(err.to_string().contains("duplicate key"));

        let counts = store.row_counts().await.unwrap();
        assert_eq!(counts.actions, 1);
        assert_eq!(counts.reports, 1);
        assert_eq!(
            store.find_report(report_id).await.unwrap().unwrap().action_id,
            owner
        );
    }

    #[tokio::test]
    async fn test_injected_failure_fires_once() {
        let store = MemoryStore::new();
        store.fail_next_at(FailurePoint::InsertAction);

        let mut scope = store.begin().await.unwrap();
        assert!(scope.insert_action(&new_action()).await.is_err());

        let mut scope = store.begin().await.unwrap();
        assert!(scope.insert_action(&new_action()).await.is_ok());
    }
}
