//! PostgreSQL lineage store
//!
//! Implements [`LineageStore`] over the pooled [`PostgreSQLClient`]. Each
//! transaction scope holds one pooled connection for its lifetime and runs
//! explicit `BEGIN`/`COMMIT`/`ROLLBACK`.

use super::client::PostgreSQLClient;
use super::models::{
    action_from_row, edge_from_row, lineage_insert_statement, report_from_row, ACTION_COLUMNS,
    LINEAGE_COLUMNS, REPORT_COLUMNS,
};
use crate::adapters::database::traits::{LineageStore, NewAction, RowCounts, TransactionScope};
use crate::domain::{
    ActionId, ActionRecord, ConduitError, LineageEdge, ReportId, ReportRecord, Result,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// Edges per multi-row insert
const LINEAGE_CHUNK_SIZE: usize = 500;

/// PostgreSQL implementation of [`LineageStore`]
pub struct PostgreSQLStore {
    client: Arc<PostgreSQLClient>,
}

impl PostgreSQLStore {
    /// Create a new store
    pub fn new(client: PostgreSQLClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    async fn edges_where(&self, column: &str, value: &uuid::Uuid) -> Result<Vec<LineageEdge>> {
        let sql = format!(
            "SELECT {LINEAGE_COLUMNS} FROM report_lineage WHERE {column} = $1 ORDER BY lineage_id"
        );
        let rows = self.client.query(&sql, &[value]).await?;
        rows.iter().map(edge_from_row).collect()
    }
}

#[async_trait]
impl LineageStore for PostgreSQLStore {
    async fn test_connection(&self) -> Result<()> {
        self.client.test_connection().await
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.client.ensure_schema().await
    }

    async fn begin(&self) -> Result<Box<dyn TransactionScope>> {
        let conn = self.client.get_connection().await?;
        conn.batch_execute("BEGIN")
            .await
            .map_err(|e| ConduitError::Persistence(format!("Failed to begin transaction: {e}")))?;

        Ok(Box::new(PgTransactionScope { conn: Some(conn) }))
    }

    async fn find_action(&self, action_id: ActionId) -> Result<Option<ActionRecord>> {
        let sql = format!("SELECT {ACTION_COLUMNS} FROM action WHERE action_id = $1");
        let rows = self.client.query(&sql, &[&action_id.value()]).await?;
        rows.first().map(action_from_row).transpose()
    }

    async fn find_report(&self, report_id: ReportId) -> Result<Option<ReportRecord>> {
        let sql = format!("SELECT {REPORT_COLUMNS} FROM report_file WHERE report_id = $1");
        let rows = self.client.query(&sql, &[report_id.as_uuid()]).await?;
        rows.first().map(report_from_row).transpose()
    }

    async fn reports_for_action(&self, action_id: ActionId) -> Result<Vec<ReportRecord>> {
        let sql = format!(
            "SELECT {REPORT_COLUMNS} FROM report_file WHERE action_id = $1 ORDER BY created_at"
        );
        let rows = self.client.query(&sql, &[&action_id.value()]).await?;
        rows.iter().map(report_from_row).collect()
    }

    async fn lineage_for_action(&self, action_id: ActionId) -> Result<Vec<LineageEdge>> {
        let sql = format!(
            "SELECT {LINEAGE_COLUMNS} FROM report_lineage WHERE action_id = $1 ORDER BY lineage_id"
        );
        let rows = self.client.query(&sql, &[&action_id.value()]).await?;
        rows.iter().map(edge_from_row).collect()
    }

    async fn parents_of(&self, report_id: ReportId) -> Result<Vec<LineageEdge>> {
        self.edges_where("child_report_id", report_id.as_uuid()).await
    }

    async fn children_of(&self, report_id: ReportId) -> Result<Vec<LineageEdge>> {
        self.edges_where("parent_report_id", report_id.as_uuid()).await
    }

    async fn row_counts(&self) -> Result<RowCounts> {
        let rows = self
            .client
            .query(
                "SELECT (SELECT COUNT(*) FROM action), \
                        (SELECT COUNT(*) FROM report_file), \
                        (SELECT COUNT(*) FROM report_lineage)",
                &[],
            )
            .await?;
        let row = rows
            .first()
            .ok_or_else(|| ConduitError::Persistence("row count query returned no rows".into()))?;

        let count = |idx: usize| -> u64 { row.get::<_, i64>(idx).max(0) as u64 };
        Ok(RowCounts {
            actions: count(0),
            reports: count(1),
            lineage: count(2),
        })
    }

    fn store_name(&self) -> &str {
        "postgresql"
    }
}

/// Open transaction on one pooled connection
///
/// If the scope is dropped while still open, the connection is detached
/// from the pool and closed so the server aborts the transaction.
struct PgTransactionScope {
    conn: Option<deadpool_postgres::Object>,
}

impl PgTransactionScope {
    fn conn(&self) -> Result<&deadpool_postgres::Object> {
        self.conn
            .as_ref()
            .ok_or_else(|| ConduitError::Persistence("transaction already finished".to_string()))
    }

    async fn finish(mut self: Box<Self>, statement: &str) -> Result<()> {
        let conn = self
            .conn
            .take()
            .ok_or_else(|| ConduitError::Persistence("transaction already finished".to_string()))?;

        match conn.batch_execute(statement).await {
            Ok(()) => Ok(()),
            Err(e) => {
                // State unknown; never hand this connection back to the pool.
                let _ = deadpool_postgres::Object::take(conn);
                Err(ConduitError::Persistence(format!("{statement} failed: {e}")))
            }
        }
    }
}

impl Drop for PgTransactionScope {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            tracing::warn!("Transaction scope dropped while open; discarding connection");
            let _ = deadpool_postgres::Object::take(conn);
        }
    }
}

#[async_trait]
impl TransactionScope for PgTransactionScope {
    async fn insert_action(&mut self, action: &NewAction) -> Result<ActionId> {
        let row = self
            .conn()?
            .query_one(
                "INSERT INTO action (action_name, action_params, action_result, created_at) \
                 VALUES ($1, $2, $3, $4) RETURNING action_id",
                &[
                    &action.kind.as_str(),
                    &action.params,
                    &action.result,
                    &action.created_at,
                ],
            )
            .await
            .map_err(|e| ConduitError::Persistence(format!("Failed to insert action: {e}")))?;

        Ok(ActionId::new(row.get(0)))
    }

    async fn insert_report(&mut self, record: &ReportRecord) -> Result<()> {
        let action_id = record.action_id.map(|id| id.value());
        let next_action = record.next_action.map(|kind| kind.as_str());

        self.conn()?
            .execute(
                "INSERT INTO report_file (report_id, action_id, next_action, next_action_at, \
                 sending_org, sending_org_client, receiving_org, receiving_org_svc, schema_name, \
                 schema_topic, body_url, external_name, body_format, transport_params, \
                 transport_result, item_count, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
                &[
                    record.report_id.as_uuid(),
                    &action_id,
                    &next_action,
                    &record.next_action_at,
                    &record.sending_org,
                    &record.sending_org_client,
                    &record.receiving_org,
                    &record.receiving_org_svc,
                    &record.schema_name,
                    &record.schema_topic,
                    &record.body_url,
                    &record.external_name,
                    &record.body_format,
                    &record.transport_params,
                    &record.transport_result,
                    &record.item_count,
                    &record.created_at,
                ],
            )
            .await
            .map_err(|e| {
                ConduitError::Persistence(format!(
                    "Failed to insert report {}: {e}",
                    record.report_id
                ))
            })?;

        Ok(())
    }

    async fn insert_lineage(&mut self, edges: &[LineageEdge]) -> Result<()> {
        let conn = self.conn()?;

        for chunk in edges.chunks(LINEAGE_CHUNK_SIZE) {
            let action_ids: Vec<i64> = chunk.iter().map(|e| e.action_id.value()).collect();
            let mut params: Vec<&(dyn ToSql + Sync)> = Vec::with_capacity(chunk.len() * 4);
            for (edge, action_id) in chunk.iter().zip(action_ids.iter()) {
                params.push(action_id);
                params.push(edge.parent_report_id.as_uuid());
                params.push(edge.child_report_id.as_uuid());
                params.push(&edge.created_at);
            }

            conn.execute(lineage_insert_statement(chunk.len()).as_str(), &params)
                .await
                .map_err(|e| {
                    ConduitError::Persistence(format!("Failed to insert lineage edges: {e}"))
                })?;
        }

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.finish("COMMIT").await
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.finish("ROLLBACK").await
    }
}
