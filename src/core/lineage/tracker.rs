//! Action-scoped lineage tracker
//!
//! One tracker is created per action. It accumulates the action's
//! diagnostics and report classification in memory and is consumed by
//! [`LineageTracker::commit`], which is the only point where anything
//! becomes durable.

use super::graph::LineageGraph;
use super::persistence::{CommittedAction, PersistenceCoordinator, DEFAULT_MAX_COLUMN_WIDTH};
use super::registry::{ReportRegistry, SentReport};
use crate::adapters::database::traits::{LineageStore, TransactionScope};
use crate::domain::{Action, ActionKind, Destination, Event, Report, ReportId, Result};

/// In-memory provenance for one action
///
/// Not internally synchronized. Concurrent senders must feed results back
/// through a single owner.
///
/// # Example
///
/// ```no_run
/// use conduit::adapters::memory::MemoryStore;
/// use conduit::core::lineage::LineageTracker;
/// use conduit::domain::{ActionKind, ReportId};
///
/// # async fn example() -> conduit::domain::Result<()> {
/// let store = MemoryStore::new();
/// let mut tracker = LineageTracker::new(ActionKind::Route);
/// tracker.register_consumed_input(ReportId::new())?;
/// let committed = tracker.commit(&store).await?;
/// println!("action {}", committed.action_id);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct LineageTracker {
    action: Action,
    registry: ReportRegistry,
    max_column_width: usize,
}

impl LineageTracker {
    /// Starts tracking a new action of the given kind
    pub fn new(kind: ActionKind) -> Self {
        Self {
            action: Action::new(kind),
            registry: ReportRegistry::new(),
            max_column_width: DEFAULT_MAX_COLUMN_WIDTH,
        }
    }

    /// Sets the width diagnostic text is truncated to at commit
    pub fn with_max_column_width(mut self, max_column_width: usize) -> Self {
        self.max_column_width = max_column_width;
        self
    }

    /// Changes the action kind, e.g. to `send_error` when retries run out
    pub fn set_kind(&mut self, kind: ActionKind) {
        self.action.kind = kind;
    }

    /// Current action kind
    pub fn kind(&self) -> ActionKind {
        self.action.kind
    }

    /// Appends to the parameters log
    pub fn append_params(&mut self, text: impl AsRef<str>) {
        self.action.params.append(text);
    }

    /// Appends to the result log
    pub fn append_result(&mut self, text: impl AsRef<str>) {
        self.action.result.append(text);
    }

    /// The action being tracked
    pub fn action(&self) -> &Action {
        &self.action
    }

    /// See [`ReportRegistry::register_consumed_input`]
    pub fn register_consumed_input(&mut self, report_id: ReportId) -> Result<()> {
        self.registry.register_consumed_input(report_id)
    }

    /// See [`ReportRegistry::register_received`]
    pub fn register_received(&mut self, report: &Report) -> Result<()> {
        self.registry.register_received(report)
    }

    /// See [`ReportRegistry::register_produced`]
    pub fn register_produced(
        &mut self,
        event: &Event,
        report: &Report,
        destination: &Destination,
    ) -> Result<()> {
        self.registry.register_produced(event, report, destination)
    }

    /// See [`ReportRegistry::register_sent`]
    pub fn register_sent(&mut self, destination: &Destination, sent: SentReport) -> Result<()> {
        self.registry.register_sent(destination, sent)
    }

    /// Received report ids
    pub fn received_ids(&self) -> Vec<ReportId> {
        self.registry.received_ids()
    }

    /// Consumed-input report ids
    pub fn consumed_ids(&self) -> &[ReportId] {
        self.registry.consumed_ids()
    }

    /// Produced-output report ids
    pub fn produced_ids(&self) -> Vec<ReportId> {
        self.registry.child_ids()
    }

    /// Number of lineage parents
    pub fn parent_count(&self) -> usize {
        self.registry.parent_ids().len()
    }

    /// Number of lineage children
    pub fn child_count(&self) -> usize {
        self.registry.child_ids().len()
    }

    /// Commit the action in its own transaction
    ///
    /// Rolls back and returns the error if any persistence step fails, so
    /// nothing from this action becomes visible.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the transaction cannot be opened, any
    /// insert fails, or the commit fails.
    pub async fn commit(self, store: &dyn LineageStore) -> Result<CommittedAction> {
        let kind = self.action.kind;
        let mut scope = store.begin().await?;

        match self.persist(scope.as_mut()).await {
            Ok(committed) => {
                scope.commit().await?;
                crate::log_commit!(
                    committed.action_id,
                    kind,
                    committed.report_count,
                    committed.edge_count
                );
                Ok(committed)
            }
            Err(e) => {
                if let Err(rollback_err) = scope.rollback().await {
                    tracing::error!(
                        error = %rollback_err,
                        store = store.store_name(),
                        "Rollback failed after persistence error"
                    );
                }
                Err(e)
            }
        }
    }

    /// Persist the action inside a transaction owned by the caller
    ///
    /// The caller commits or rolls back `scope`.
    ///
    /// # Errors
    ///
    /// Returns the first store error.
    pub async fn commit_in(self, scope: &mut dyn TransactionScope) -> Result<CommittedAction> {
        self.persist(scope).await
    }

    async fn persist(self, scope: &mut dyn TransactionScope) -> Result<CommittedAction> {
        let graph = LineageGraph::build(&self.registry.parent_ids(), &self.registry.child_ids());
        let coordinator = PersistenceCoordinator::new(self.max_column_width);
        let records = self.registry.into_pending_records();

        coordinator.persist(scope, &self.action, records, &graph).await
    }
}
