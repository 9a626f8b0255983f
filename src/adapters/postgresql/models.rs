//! PostgreSQL row models
//!
//! Mapping between `tokio_postgres` rows and the lineage records.

use crate::domain::{
    ActionId, ActionKind, ActionRecord, ConduitError, LineageEdge, ReportId, ReportRecord, Result,
};
use std::str::FromStr;
use tokio_postgres::Row;

/// Columns selected when reading `report_file`
pub const REPORT_COLUMNS: &str = "report_id, action_id, next_action, next_action_at, \
     sending_org, sending_org_client, receiving_org, receiving_org_svc, schema_name, \
     schema_topic, body_url, external_name, body_format, transport_params, transport_result, \
     item_count, created_at";

/// Columns selected when reading `report_lineage`
pub const LINEAGE_COLUMNS: &str = "action_id, parent_report_id, child_report_id, created_at";

/// Columns selected when reading `action`
pub const ACTION_COLUMNS: &str =
    "action_id, action_name, action_params, action_result, created_at";

fn try_get<'a, T>(row: &'a Row, column: &str) -> Result<T>
where
    T: tokio_postgres::types::FromSql<'a>,
{
    row.try_get(column).map_err(|e| {
        ConduitError::Persistence(format!("Failed to read column '{column}': {e}"))
    })
}

/// Map an `action` row
pub fn action_from_row(row: &Row) -> Result<ActionRecord> {
    let action_name: String = try_get(row, "action_name")?;
    Ok(ActionRecord {
        action_id: ActionId::new(try_get(row, "action_id")?),
        action_name: ActionKind::from_str(&action_name)?,
        action_params: try_get(row, "action_params")?,
        action_result: try_get(row, "action_result")?,
        created_at: try_get(row, "created_at")?,
    })
}

/// Map a `report_file` row
pub fn report_from_row(row: &Row) -> Result<ReportRecord> {
    let next_action: Option<String> = try_get(row, "next_action")?;
    let action_id: i64 = try_get(row, "action_id")?;
    Ok(ReportRecord {
        report_id: ReportId::from_uuid(try_get(row, "report_id")?),
        action_id: Some(ActionId::new(action_id)),
        next_action: next_action
            .as_deref()
            .map(ActionKind::from_str)
            .transpose()?,
        next_action_at: try_get(row, "next_action_at")?,
        sending_org: try_get(row, "sending_org")?,
        sending_org_client: try_get(row, "sending_org_client")?,
        receiving_org: try_get(row, "receiving_org")?,
        receiving_org_svc: try_get(row, "receiving_org_svc")?,
        schema_name: try_get(row, "schema_name")?,
        schema_topic: try_get(row, "schema_topic")?,
        body_url: try_get(row, "body_url")?,
        external_name: try_get(row, "external_name")?,
        body_format: try_get(row, "body_format")?,
        transport_params: try_get(row, "transport_params")?,
        transport_result: try_get(row, "transport_result")?,
        item_count: try_get(row, "item_count")?,
        created_at: try_get(row, "created_at")?,
    })
}

/// Map a `report_lineage` row
pub fn edge_from_row(row: &Row) -> Result<LineageEdge> {
    Ok(LineageEdge {
        action_id: ActionId::new(try_get(row, "action_id")?),
        parent_report_id: ReportId::from_uuid(try_get(row, "parent_report_id")?),
        child_report_id: ReportId::from_uuid(try_get(row, "child_report_id")?),
        created_at: try_get(row, "created_at")?,
    })
}

/// Build a multi-row `INSERT` for lineage edges
///
/// Returns the statement text for `count` edges, four parameters each.
pub fn lineage_insert_statement(count: usize) -> String {
    let values: Vec<String> = (0..count)
        .map(|i| {
            let base = i * 4;
            format!("(${}, ${}, ${}, ${})", base + 1, base + 2, base + 3, base + 4)
        })
        .collect();
    format!(
        "INSERT INTO report_lineage (action_id, parent_report_id, child_report_id, created_at) \
         VALUES {}",
        values.join(", ")
    )
}
