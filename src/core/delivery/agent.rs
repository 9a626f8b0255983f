//! Send action driver
//!
//! Delivers one report to a set of destinations. Destinations run
//! concurrently; each keeps re-attempting according to its
//! [`RetryOutcome`] until delivered or out of attempts. Results are then
//! fed into the action's [`LineageTracker`] one destination at a time.

use crate::adapters::transport::{create_transport, TransportProtocol, TransportSession};
use crate::config::schema::{ConduitConfig, DeliveryConfig, RetryConfig};
use crate::core::lineage::{LineageTracker, SentReport};
use crate::domain::{
    ActionKind, Destination, DiagnosticLog, Report, ReportHeader, ReportId, Result, RetryItems,
    RetryOutcome, TransportKind,
};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of delivering one report to one destination
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryReport {
    /// Destination full name
    pub destination: String,

    /// Identifier of the sent report
    pub sent_report_id: ReportId,

    /// Outcome of the final attempt
    pub outcome: RetryOutcome,

    /// Attempts made
    pub attempts: usize,

    /// Items delivered by the time the loop ended
    pub delivered_items: usize,

    /// Filename at the destination
    pub external_name: Option<String>,

    /// Transport parameters of the last attempt
    pub params: String,

    /// Diagnostic text of every attempt, oldest first
    pub result: String,

    #[serde(skip)]
    target: Destination,

    #[serde(skip)]
    body_format: String,
}

impl DeliveryReport {
    /// True if the destination received everything
    pub fn is_delivered(&self) -> bool {
        self.outcome.is_delivered()
    }
}

/// Result of a whole send action
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeliverySummary {
    /// One entry per destination, in input order
    pub reports: Vec<DeliveryReport>,
}

impl DeliverySummary {
    /// Destinations fully delivered
    pub fn delivered(&self) -> usize {
        self.reports.iter().filter(|r| r.is_delivered()).count()
    }

    /// Destinations that ran out of attempts
    pub fn failed(&self) -> usize {
        self.reports.len() - self.delivered()
    }
}

/// Delay before attempt `attempt + 1`
pub fn backoff_delay(retry: &RetryConfig, attempt: usize) -> Duration {
    let exponent = attempt.saturating_sub(1) as i32;
    let delay = retry.initial_delay_ms as f64 * retry.backoff_multiplier.powi(exponent);
    let delay_ms = if delay.is_finite() {
        (delay as u64).min(retry.max_delay_ms)
    } else {
        retry.max_delay_ms
    };
    Duration::from_millis(delay_ms)
}

/// Drives delivery for a send action
pub struct DeliveryAgent {
    transports: HashMap<TransportKind, Arc<dyn TransportProtocol>>,
    delivery: DeliveryConfig,
}

impl DeliveryAgent {
    /// Create an agent with no transports registered
    pub fn new(delivery: DeliveryConfig) -> Self {
        Self {
            transports: HashMap::new(),
            delivery,
        }
    }

    /// Build an agent with a transport for every configured destination kind
    ///
    /// # Errors
    ///
    /// Returns an error if a destination's transport cannot be built.
    pub fn from_config(config: &ConduitConfig) -> Result<Self> {
        let mut agent = Self::new(config.delivery.clone());
        for destination in &config.destinations {
            if !agent.transports.contains_key(&destination.transport) {
                let transport = create_transport(destination.transport, config)?;
                agent = agent.with_transport(destination.transport, transport);
            }
        }
        Ok(agent)
    }

    /// Register the adapter used for `kind`
    pub fn with_transport(
        mut self,
        kind: TransportKind,
        transport: Arc<dyn TransportProtocol>,
    ) -> Self {
        self.transports.insert(kind, transport);
        self
    }

    /// Deliver `report` to every destination and record the results
    ///
    /// Each destination gets its own sent-report id. After all deliveries
    /// finish, one sent record and one result line per destination are
    /// added to `tracker`; if any destination ran out of attempts the
    /// action becomes `send_error`.
    ///
    /// # Errors
    ///
    /// Only lineage invariant violations are returned. Delivery failures are
    /// reported in the summary.
    pub async fn deliver(
        &self,
        tracker: &mut LineageTracker,
        report: &Report,
        content: Option<Vec<u8>>,
        destinations: &[Destination],
    ) -> Result<DeliverySummary> {
        let jobs: Vec<ReportHeader> = destinations
            .iter()
            .map(|d| ReportHeader::new(report.clone(), d.clone(), content.clone()))
            .collect();

        let reports: Vec<DeliveryReport> = stream::iter(jobs)
            .map(|header| self.deliver_one(header, ReportId::new()))
            .buffered(self.delivery.max_concurrency.max(1))
            .collect()
            .await;

        for delivery in &reports {
            tracker.register_sent(
                &delivery.target,
                SentReport {
                    report_id: delivery.sent_report_id,
                    external_name: delivery.external_name.clone(),
                    body_format: delivery.body_format.clone(),
                    transport_params: delivery.params.clone(),
                    transport_result: delivery.result.clone(),
                    item_count: delivery.delivered_items,
                },
            )?;
            tracker.append_params(format!("{}: {}", delivery.destination, delivery.params));
            tracker.append_result(format!(
                "{}: {} after {} attempt(s), {} item(s) delivered",
                delivery.destination, delivery.outcome, delivery.attempts, delivery.delivered_items
            ));
        }

        let summary = DeliverySummary { reports };
        if summary.failed() > 0 {
            tracker.set_kind(ActionKind::SendError);
        }
        Ok(summary)
    }

    async fn deliver_one(&self, header: ReportHeader, sent_report_id: ReportId) -> DeliveryReport {
        let destination = header.destination.clone();
        let mut log = DiagnosticLog::new();
        let mut report = DeliveryReport {
            destination: destination.full_name(),
            sent_report_id,
            outcome: RetryOutcome::RetryAll,
            attempts: 0,
            delivered_items: 0,
            external_name: None,
            params: String::new(),
            result: String::new(),
            target: destination.clone(),
            body_format: header.report.body_format.clone(),
        };

        let Some(transport) = self.transports.get(&destination.transport) else {
            report.result = format!("no transport registered for '{}'", destination.transport);
            tracing::error!(destination = %report.destination, "{}", report.result);
            return report;
        };

        let max_attempts = self.delivery.max_attempts.max(1);
        let mut session: Option<Box<dyn TransportSession>> = None;
        let mut session_open = false;
        let mut retry_items = RetryItems::first_attempt();

        for attempt in 1..=max_attempts {
            report.attempts = attempt;

            if !session_open {
                match transport.start_session(&destination).await {
                    Ok(opened) => {
                        session = opened;
                        session_open = true;
                    }
                    Err(e) => {
                        report.outcome = RetryOutcome::RetryAll;
                        log.append(format!("attempt {attempt}: session failed: {e}"));
                        crate::log_delivery_attempt!(
                            report.destination,
                            sent_report_id,
                            attempt,
                            report.outcome
                        );
                        self.pause_before_retry(attempt, max_attempts, &report.outcome)
                            .await;
                        continue;
                    }
                }
            }

            let transmission = transport
                .send(&header, sent_report_id, &retry_items, session.as_deref_mut())
                .await;

            crate::log_delivery_attempt!(
                report.destination,
                sent_report_id,
                attempt,
                transmission.outcome
            );
            log.append(format!(
                "attempt {attempt}: {}: {}",
                transmission.outcome, transmission.result
            ));

            report.delivered_items = match transmission.outcome {
                RetryOutcome::RetryAll => 0,
                _ => report.delivered_items + transmission.delivered_items,
            };
            report.params = transmission.params;
            if transmission.external_name.is_some() {
                report.external_name = transmission.external_name;
            }
            report.outcome = transmission.outcome;

            match report.outcome.next_attempt() {
                None => break,
                Some(next) => {
                    retry_items = next;
                    self.pause_before_retry(attempt, max_attempts, &report.outcome)
                        .await;
                }
            }
        }

        if let Some(session) = session {
            session.close().await;
        }

        if !report.is_delivered() {
            tracing::warn!(
                destination = %report.destination,
                report_id = %sent_report_id,
                attempts = report.attempts,
                "Delivery attempts exhausted"
            );
        }

        report.result = log.as_str().to_string();
        report
    }

    async fn pause_before_retry(&self, attempt: usize, max_attempts: usize, reason: &RetryOutcome) {
        if attempt < max_attempts {
            crate::log_retry_attempt!(attempt + 1, max_attempts, reason);
            tokio::time::sleep(backoff_delay(&self.delivery.retry, attempt)).await;
        }
    }
}
