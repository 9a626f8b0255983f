//! Lineage command implementation
//!
//! Prints the stored record of a report together with the reports it was
//! derived from and the reports derived from it.

use crate::adapters::database::create_lineage_store;
use crate::config::load_config;
use crate::domain::{LineageEdge, ReportId};
use clap::Args;

/// Arguments for the lineage command
#[derive(Args, Debug)]
pub struct LineageArgs {
    /// Report identifier (UUID)
    #[arg(long)]
    pub report: String,
}

impl LineageArgs {
    /// Execute the lineage command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let report_id: ReportId = match self.report.parse() {
            Ok(id) => id,
            Err(e) => {
                println!("❌ Invalid report id '{}': {e}", self.report);
                return Ok(2);
            }
        };

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        let store = match create_lineage_store(&config).await {
            Ok(s) => s,
            Err(e) => {
                println!("❌ Failed to connect to lineage store");
                println!("   Error: {e}");
                return Ok(4); // Connection error exit code
            }
        };

        let Some(record) = store.find_report(report_id).await? else {
            println!("No report found with id {report_id}");
            return Ok(0);
        };

        println!("📄 Report {report_id}");
        if let Some(action_id) = record.action_id {
            println!("   Action: {action_id}");
        }
        println!("   Schema: {} ({})", record.schema_name, record.schema_topic);
        println!("   Format: {}", record.body_format);
        println!("   Items: {}", record.item_count);
        if let (Some(org), Some(svc)) = (&record.receiving_org, &record.receiving_org_svc) {
            println!("   Destination: {org}.{svc}");
        }
        if let Some(ref name) = record.external_name {
            println!("   External name: {name}");
        }
        println!();

        let parents = store.parents_of(report_id).await?;
        print_edges("Parents", &parents, |e| e.parent_report_id);

        let children = store.children_of(report_id).await?;
        print_edges("Children", &children, |e| e.child_report_id);

        Ok(0)
    }
}

fn print_edges(title: &str, edges: &[LineageEdge], other_end: impl Fn(&LineageEdge) -> ReportId) {
    if edges.is_empty() {
        println!("{title}: none");
        return;
    }
    println!("{title}:");
    for edge in edges {
        println!(
            "  {} (action {}, {})",
            other_end(edge),
            edge.action_id,
            edge.created_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_report_id() {
        let args = LineageArgs {
            report: "not-a-uuid".to_string(),
        };
        assert_eq!(args.execute("conduit.toml").await.unwrap(), 2);
    }
}
