//! Per-action report classification
//!
//! Every report an action touches lands in exactly one of three sets:
//! received, consumed-input or produced-output. Registering the same report
//! id twice within one action is a programming error and fails with
//! [`ConduitError::InvariantViolation`].

use crate::domain::{
    ActionKind, ConduitError, Destination, Event, Report, ReportId, ReportRecord, Result,
};
use std::collections::HashSet;

/// What a transport reported back for one delivered report
#[derive(Debug, Clone, PartialEq)]
pub struct SentReport {
    /// Identifier of the sent report
    pub report_id: ReportId,

    /// Filename at the destination, if the transport names its payload
    pub external_name: Option<String>,

    /// Body format of the delivered content
    pub body_format: String,

    /// Transport parameters text
    pub transport_params: String,

    /// Accumulated transport result text
    pub transport_result: String,

    /// Items delivered
    pub item_count: usize,
}

/// Which set a report was registered in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Submitted externally during this action
    Received,
    /// Already durable, consumed by this action
    ConsumedInput,
    /// Created or sent by this action
    ProducedOutput,
}

/// The three disjoint classification sets of one action
#[derive(Debug, Default)]
pub struct ReportRegistry {
    tracked: HashSet<ReportId>,
    received: Vec<ReportRecord>,
    consumed: Vec<ReportId>,
    produced: Vec<ReportRecord>,
}

impl ReportRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    fn claim(&mut self, report_id: ReportId, classification: Classification) -> Result<()> {
        if let Some(existing) = self.classification_of(report_id) {
            return Err(ConduitError::InvariantViolation(format!(
                "report {report_id} is already tracked as {existing:?}; \
                 cannot register it again as {classification:?}"
            )));
        }
        self.tracked.insert(report_id);
        Ok(())
    }

    /// Marks an already-durable report as consumed by this action
    ///
    /// No new record is created; the report only contributes lineage.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` if the id is already tracked.
    pub fn register_consumed_input(&mut self, report_id: ReportId) -> Result<()> {
        self.claim(report_id, Classification::ConsumedInput)?;
        self.consumed.push(report_id);
        Ok(())
    }

    /// Marks a newly, externally submitted report
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` if the report doesn't carry exactly one
    /// source or its id is already tracked.
    pub fn register_received(&mut self, report: &Report) -> Result<()> {
        let source = match report.sources.as_slice() {
            [source] => source,
            sources => {
                return Err(ConduitError::InvariantViolation(format!(
                    "received report {} must have exactly one source, found {}",
                    report.id,
                    sources.len()
                )))
            }
        };
        self.claim(report.id, Classification::Received)?;

        let mut record = ReportRecord::new(
            report.id,
            &report.schema_name,
            &report.schema_topic,
            &report.body_format,
            report.item_count,
        );
        if let Some((organization, client)) = source.sending_org() {
            record.sending_org = Some(organization.to_string());
            record.sending_org_client = Some(client.to_string());
        }
        record.body_url = report.body_url.clone();
        record.next_action = Some(ActionKind::None);
        record.created_at = report.created_at;

        self.received.push(record);
        Ok(())
    }

    /// Marks a report created by this action for further processing
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` if the id is already tracked.
    pub fn register_produced(
        &mut self,
        event: &Event,
        report: &Report,
        destination: &Destination,
    ) -> Result<()> {
        self.claim(report.id, Classification::ProducedOutput)?;

        let mut record = ReportRecord::new(
            report.id,
            &report.schema_name,
            &report.schema_topic,
            &report.body_format,
            report.item_count,
        );
        record.receiving_org = Some(destination.organization.clone());
        record.receiving_org_svc = Some(destination.service.clone());
        record.body_url = report.body_url.clone();
        record.next_action = Some(event.action);
        record.next_action_at = Some(event.at);
        record.created_at = report.created_at;

        self.produced.push(record);
        Ok(())
    }

    /// Records the outcome of a delivery as a produced-output entry
    ///
    /// The body already existed, so the body location stays empty.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` if the id is already tracked.
    pub fn register_sent(&mut self, destination: &Destination, sent: SentReport) -> Result<()> {
        self.claim(sent.report_id, Classification::ProducedOutput)?;

        let mut record = ReportRecord::new(
            sent.report_id,
            &destination.schema_name,
            &destination.topic,
            sent.body_format,
            sent.item_count,
        );
        record.receiving_org = Some(destination.organization.clone());
        record.receiving_org_svc = Some(destination.service.clone());
        record.external_name = sent.external_name;
        record.transport_params = Some(sent.transport_params).filter(|t| !t.is_empty());
        record.transport_result = Some(sent.transport_result).filter(|t| !t.is_empty());

        self.produced.push(record);
        Ok(())
    }

    /// The set a report was registered in, if any
    pub fn classification_of(&self, report_id: ReportId) -> Option<Classification> {
        if !self.tracked.contains(&report_id) {
            None
        } else if self.consumed.contains(&report_id) {
            Some(Classification::ConsumedInput)
        } else if self.received.iter().any(|r| r.report_id == report_id) {
            Some(Classification::Received)
        } else {
            Some(Classification::ProducedOutput)
        }
    }

    /// Lineage parents: received and consumed-input ids
    pub fn parent_ids(&self) -> Vec<ReportId> {
        self.received
            .iter()
            .map(|r| r.report_id)
            .chain(self.consumed.iter().copied())
            .collect()
    }

    /// Lineage children: produced-output ids
    pub fn child_ids(&self) -> Vec<ReportId> {
        self.produced.iter().map(|r| r.report_id).collect()
    }

    /// Received report ids
    pub fn received_ids(&self) -> Vec<ReportId> {
        self.received.iter().map(|r| r.report_id).collect()
    }

    /// Consumed-input report ids
    pub fn consumed_ids(&self) -> &[ReportId] {
        &self.consumed
    }

    /// Records pending insertion: received then produced
    ///
    /// Consumed-input reports already exist and are not included.
    pub fn into_pending_records(self) -> Vec<ReportRecord> {
        let mut records = self.received;
        records.extend(self.produced);
        records
    }

    /// Number of tracked reports across all three sets
    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    /// True if nothing has been registered
    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ReportBuilder, ReportSource, TransportKind};

    fn destination() -> Destination {
        Destination::new("az-phd", "elr", "covid-19", "covid-19", TransportKind::Email)
    }

    fn received_report() -> Report {
        ReportBuilder::new("covid-19", "covid-19")
            .source(ReportSource::client("simple_report", "default"))
            .body_url("file:///reports/in.csv")
            .item_count(5)
            .build()
    }

    fn sent(report_id: ReportId) -> SentReport {
        SentReport {
            report_id,
            external_name: Some("covid-19.csv".to_string()),
            body_format: "CSV".to_string(),
            transport_params: "to=ops@example.org".to_string(),
            transport_result: "attempt 1: delivered".to_string(),
            item_count: 5,
        }
    }

    #[test]
    fn test_register_received_populates_provenance() {
        let mut registry = ReportRegistry::new();
        let report = received_report();
        registry.register_received(&report).unwrap();

        let records = registry.into_pending_records();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.sending_org.as_deref(), Some("simple_report"));
        assert_eq!(record.sending_org_client.as_deref(), Some("default"));
        assert_eq!(record.next_action, Some(ActionKind::None));
        assert_eq!(record.body_url.as_deref(), Some("file:///reports/in.csv"));
        assert_eq!(record.item_count, 5);
    }

    #[test]
    fn test_register_received_requires_one_source() {
        let mut registry = ReportRegistry::new();

        let no_source = ReportBuilder::new("covid-19", "covid-19").build();
        let err = registry.register_received(&no_source).unwrap_err();
        assert!(err.is_invariant_violation());

        let two_sources = ReportBuilder::new("covid-19", "covid-19")
            .source(ReportSource::client("a", "default"))
            .source(ReportSource::client("b", "default"))
            .build();
        assert!(registry
            .register_received(&two_sources)
            .unwrap_err()
            .is_invariant_violation());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_across_sets_rejected() {
        let mut registry = ReportRegistry::new();
        let report = received_report();
        registry.register_received(&report).unwrap();

        assert!(registry
            .register_consumed_input(report.id)
            .unwrap_err()
            .is_invariant_violation());
        assert!(registry
            .register_produced(&Event::now(ActionKind::Send), &report, &destination())
            .unwrap_err()
            .is_invariant_violation());
        assert!(registry
            .register_sent(&destination(), sent(report.id))
            .unwrap_err()
            .is_invariant_violation());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_sent_has_no_body_url() {
        let mut registry = ReportRegistry::new();
        let id = ReportId::new();
        registry.register_sent(&destination(), sent(id)).unwrap();

        assert_eq!(registry.classification_of(id), Some(Classification::ProducedOutput));
        let record = &registry.into_pending_records()[0];
        assert!(record.body_url.is_none());
        assert_eq!(record.external_name.as_deref(), Some("covid-19.csv"));
        assert_eq!(record.receiving_org_svc.as_deref(), Some("elr"));
        assert_eq!(record.transport_result.as_deref(), Some("attempt 1: delivered"));
    }

    #[test]
    fn test_consumed_inputs_not_pending() {
        let mut registry = ReportRegistry::new();
        let a = ReportId::new();
        registry.register_consumed_input(a).unwrap();

        assert_eq!(registry.parent_ids(), vec![a]);
        assert!(registry.into_pending_records().is_empty());
    }
}
