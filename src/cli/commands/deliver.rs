//! Deliver command implementation
//!
//! Receives a local file as an externally submitted report, delivers it to
//! every configured destination and commits the action's lineage.

use crate::adapters::database::create_lineage_store;
use crate::config::load_config;
use crate::core::delivery::{DeliveryAgent, DeliverySummary};
use crate::core::lineage::LineageTracker;
use crate::domain::{split_items, ActionKind, Destination, Report, ReportBuilder, ReportSource};
use clap::Args;
use std::path::Path;

/// Arguments for the deliver command
#[derive(Args, Debug)]
pub struct DeliverArgs {
    /// Report body to deliver
    #[arg(short, long)]
    pub file: String,

    /// Sending organization
    #[arg(long)]
    pub org: String,

    /// Sending organization client
    #[arg(long)]
    pub client: String,

    /// Schema name of the report
    #[arg(long, default_value = "covid-19")]
    pub schema: String,

    /// Schema topic of the report
    #[arg(long, default_value = "covid-19")]
    pub topic: String,

    /// Body format
    #[arg(long, default_value = "CSV")]
    pub format: String,

    /// Dry run mode - record lineage in memory only
    #[arg(long)]
    pub dry_run: bool,
}

impl DeliverArgs {
    /// Execute the deliver command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(file = %self.file, org = %self.org, "Starting deliver command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Configuration error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.application.dry_run = true;
            println!("🔍 DRY RUN MODE - lineage is kept in memory only");
            println!();
        }

        if config.destinations.is_empty() {
            eprintln!("No destinations configured");
            return Ok(2);
        }

        let content = match tokio::fs::read(&self.file).await {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(file = %self.file, error = %e, "Failed to read report body");
                eprintln!("Failed to read {}: {e}", self.file);
                return Ok(5); // Fatal error exit code
            }
        };
        let report = self.build_report(&content);
        let destinations: Vec<Destination> = config
            .destinations
            .iter()
            .map(|d| d.to_destination())
            .collect();

        let store = match create_lineage_store(&config).await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create lineage store");
                eprintln!("Failed to connect to lineage store: {e}");
                return Ok(4); // Connection error exit code
            }
        };

        let agent = match DeliveryAgent::from_config(&config) {
            Ok(a) => a,
            Err(e) => {
                eprintln!("Failed to initialize transports: {e}");
                return Ok(2);
            }
        };

        let mut tracker = LineageTracker::new(ActionKind::Send)
            .with_max_column_width(config.lineage.max_column_width);
        tracker.append_params(format!(
            "file={} org={} client={} schema={}",
            self.file, self.org, self.client, self.schema
        ));
        tracker.register_received(&report)?;

        println!(
            "🚀 Delivering report {} ({} item(s)) to {} destination(s)...",
            report.id,
            report.item_count,
            destinations.len()
        );
        println!();

        let summary = agent
            .deliver(&mut tracker, &report, Some(content), &destinations)
            .await?;

        let committed = match tracker.commit(store.as_ref()).await {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to record lineage: {e}");
                return Ok(5);
            }
        };

        print_summary(&summary);
        println!(
            "🧬 Lineage recorded: action {} ({} report(s), {} edge(s))",
            committed.action_id, committed.report_count, committed.edge_count
        );
        println!();

        if summary.failed() > 0 {
            Ok(5)
        } else {
            Ok(0)
        }
    }

    fn build_report(&self, content: &[u8]) -> Report {
        let item_count = split_items(content).len();
        let path = Path::new(&self.file);
        let location = path
            .canonicalize()
            .unwrap_or_else(|_| path.to_path_buf());

        ReportBuilder::new(&self.schema, &self.topic)
            .source(ReportSource::client(&self.org, &self.client))
            .body_url(format!("file://{}", location.display()))
            .body_format(&self.format)
            .item_count(item_count)
            .build()
    }
}

fn print_summary(summary: &DeliverySummary) {
    println!("📊 Delivery Summary");
    for report in &summary.reports {
        let status = if report.is_delivered() { "✅" } else { "❌" };
        println!(
            "  {status} {} -> {} ({} attempt(s), {} item(s))",
            report.destination, report.outcome, report.attempts, report.delivered_items
        );
        if let Some(ref name) = report.external_name {
            println!("       as {name}");
        }
    }
    println!(
        "  Delivered: {}  Failed: {}",
        summary.delivered(),
        summary.failed()
    );
    println!();
}
