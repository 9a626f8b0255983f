//! Persisted lineage records
//!
//! These mirror the `report_file` and `report_lineage` tables. Records are
//! built in memory while an action runs and stamped with the action id at
//! commit.

use super::action::ActionKind;
use super::ids::{ActionId, ReportId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One report touched by an action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    /// Report identifier
    pub report_id: ReportId,

    /// Owning action (set at commit)
    pub action_id: Option<ActionId>,

    /// Next scheduled action, if any
    pub next_action: Option<ActionKind>,

    /// When the next action is due
    pub next_action_at: Option<DateTime<Utc>>,

    /// Sending organization (externally received reports)
    pub sending_org: Option<String>,

    /// Sending organization client
    pub sending_org_client: Option<String>,

    /// Receiving organization (produced or sent reports)
    pub receiving_org: Option<String>,

    /// Receiving organization service
    pub receiving_org_svc: Option<String>,

    /// Schema name
    pub schema_name: String,

    /// Schema topic
    pub schema_topic: String,

    /// Body location; empty for sent reports whose content already existed
    pub body_url: Option<String>,

    /// Filename used at the destination (sent reports)
    pub external_name: Option<String>,

    /// Body format
    pub body_format: String,

    /// Transport parameters reported by the adapter (sent reports)
    pub transport_params: Option<String>,

    /// Transport result reported by the adapter (sent reports)
    pub transport_result: Option<String>,

    /// Number of items
    pub item_count: i64,

    /// When the record was created
    pub created_at: DateTime<Utc>,
}

impl ReportRecord {
    /// Creates a bare record; callers fill in the classification-specific fields
    pub fn new(
        report_id: ReportId,
        schema_name: impl Into<String>,
        schema_topic: impl Into<String>,
        body_format: impl Into<String>,
        item_count: usize,
    ) -> Self {
        Self {
            report_id,
            action_id: None,
            next_action: None,
            next_action_at: None,
            sending_org: None,
            sending_org_client: None,
            receiving_org: None,
            receiving_org_svc: None,
            schema_name: schema_name.into(),
            schema_topic: schema_topic.into(),
            body_url: None,
            external_name: None,
            body_format: body_format.into(),
            transport_params: None,
            transport_result: None,
            item_count: i64::try_from(item_count).unwrap_or(i64::MAX),
            created_at: Utc::now(),
        }
    }
}

/// "parent contributed to the creation of child within this action"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineageEdge {
    /// Action that created the child
    pub action_id: ActionId,

    /// Contributing report
    pub parent_report_id: ReportId,

    /// Created report
    pub child_report_id: ReportId,

    /// When the edge was recorded
    pub created_at: DateTime<Utc>,
}

/// A committed action as read back from the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Store-assigned identifier
    pub action_id: ActionId,

    /// Kind of step
    pub action_name: ActionKind,

    /// Parameters log as stored
    pub action_params: Option<String>,

    /// Result log as stored
    pub action_result: Option<String>,

    /// When the action started
    pub created_at: DateTime<Utc>,
}
