//! Integration tests for committing action lineage
//!
//! All tests run against the in-memory store, which enforces the same key
//! rules as the PostgreSQL schema.

use conduit::adapters::database::LineageStore;
use conduit::adapters::memory::{FailurePoint, MemoryStore};
use conduit::core::lineage::{LineageTracker, SentReport};
use conduit::domain::{
    ActionKind, ConduitError, Destination, Event, Report, ReportBuilder, ReportId, ReportSource,
    TransportKind,
};
use test_case::test_case;

fn received_report(items: usize) -> Report {
    ReportBuilder::new("covid-19", "covid-19")
        .source(ReportSource::client("simple_report", "default"))
        .body_url("https://blob.example.org/receive/simple_report.csv")
        .item_count(items)
        .build()
}

fn destination() -> Destination {
    Destination::new("az-phd", "elr", "covid-19", "covid-19", TransportKind::Email)
}

async fn receive(store: &MemoryStore, report: &Report) -> ReportId {
    let mut tracker = LineageTracker::new(ActionKind::Receive);
    tracker.register_received(report).unwrap();
    tracker.commit(store).await.unwrap();
    report.id
}

#[tokio::test]
async fn test_receive_writes_one_report_and_no_edges() {
    let store = MemoryStore::new();
    let report = received_report(12);

    let mut tracker = LineageTracker::new(ActionKind::Receive);
    tracker.register_received(&report).unwrap();
    let committed = tracker.commit(&store).await.unwrap();

    assert_eq!(committed.report_count, 1);
    assert_eq!(committed.edge_count, 0);

    let record = store.find_report(report.id).await.unwrap().unwrap();
    assert_eq!(record.action_id, Some(committed.action_id));
    assert_eq!(record.sending_org.as_deref(), Some("simple_report"));
    assert_eq!(record.sending_org_client.as_deref(), Some("default"));
    assert_eq!(record.next_action, Some(ActionKind::None));
    assert_eq!(record.item_count, 12);

    let counts = store.row_counts().await.unwrap();
    assert_eq!((counts.actions, counts.reports, counts.lineage), (1, 1, 0));
}

#[tokio::test]
async fn test_merge_links_both_inputs_to_output() {
    let store = MemoryStore::new();
    let a = receive(&store, &received_report(3)).await;
    let b = receive(&store, &received_report(4)).await;

    let merged = ReportBuilder::new("covid-19", "covid-19").item_count(7).build();
    let mut tracker = LineageTracker::new(ActionKind::Batch);
    tracker.register_consumed_input(a).unwrap();
    tracker.register_consumed_input(b).unwrap();
    tracker
        .register_produced(&Event::now(ActionKind::Send), &merged, &destination())
        .unwrap();
    let committed = tracker.commit(&store).await.unwrap();

    assert_eq!(committed.report_count, 1);
    assert_eq!(committed.edge_count, 2);

    let parents = store.parents_of(merged.id).await.unwrap();
    assert_eq!(parents.len(), 2);
    assert!(parents.iter().all(|e| e.action_id == committed.action_id));
    let mut parent_ids: Vec<ReportId> = parents.iter().map(|e| e.parent_report_id).collect();
    let mut expected = vec![a, b];
    parent_ids.sort_by_key(|id| *id.as_uuid());
    expected.sort_by_key(|id| *id.as_uuid());
    assert_eq!(parent_ids, expected);

    let record = store.find_report(merged.id).await.unwrap().unwrap();
    assert_eq!(record.receiving_org.as_deref(), Some("az-phd"));
    assert_eq!(record.next_action, Some(ActionKind::Send));
}

#[test_case(1, 1 ; "one to one")]
#[test_case(1, 3 ; "split")]
#[test_case(3, 1 ; "merge")]
#[test_case(2, 3 ; "many to many")]
#[tokio::test]
async fn test_edges_are_cross_product(parents: usize, children: usize) {
    let store = MemoryStore::new();
    let mut inputs = Vec::new();
    for _ in 0..parents {
        inputs.push(receive(&store, &received_report(1)).await);
    }

    let mut tracker = LineageTracker::new(ActionKind::Translate);
    for id in &inputs {
        tracker.register_consumed_input(*id).unwrap();
    }
    for _ in 0..children {
        let output = ReportBuilder::new("covid-19", "covid-19").item_count(1).build();
        tracker
            .register_produced(&Event::now(ActionKind::Batch), &output, &destination())
            .unwrap();
    }

    let committed = tracker.commit(&store).await.unwrap();
    assert_eq!(committed.edge_count, parents * children);
    assert_eq!(
        store.lineage_for_action(committed.action_id).await.unwrap().len(),
        parents * children
    );
}

#[test_case(FailurePoint::InsertAction ; "action insert")]
#[test_case(FailurePoint::InsertReport ; "report insert")]
#[test_case(FailurePoint::InsertLineage ; "lineage insert")]
#[test_case(FailurePoint::Commit ; "commit")]
#[tokio::test]
async fn test_failure_leaves_no_rows(point: FailurePoint) {
    let store = MemoryStore::new();
    let input = receive(&store, &received_report(2)).await;
    let before = store.row_counts().await.unwrap();

    let output = ReportBuilder::new("covid-19", "covid-19").item_count(2).build();
    let mut tracker = LineageTracker::new(ActionKind::Translate);
    tracker.register_consumed_input(input).unwrap();
    tracker
        .register_produced(&Event::now(ActionKind::Batch), &output, &destination())
        .unwrap();

    store.fail_next_at(point);
    let err = tracker.commit(&store).await.unwrap_err();
    assert!(!err.is_invariant_violation());

    assert_eq!(store.row_counts().await.unwrap(), before);
    assert!(store.find_report(output.id).await.unwrap().is_none());
}

#[test]
fn test_duplicate_registration_is_invariant_violation() {
    let report = received_report(1);
    let mut tracker = LineageTracker::new(ActionKind::Receive);
    tracker.register_received(&report).unwrap();

    let err = tracker.register_consumed_input(report.id).unwrap_err();
    assert!(err.is_invariant_violation());

    let err = tracker
        .register_produced(&Event::now(ActionKind::Send), &report, &destination())
        .unwrap_err();
    assert!(err.is_invariant_violation());
}

#[test_case(0 ; "no source")]
#[test_case(2 ; "two sources")]
fn test_received_report_needs_exactly_one_source(sources: usize) {
    let mut builder = ReportBuilder::new("covid-19", "covid-19");
    for i in 0..sources {
        builder = builder.source(ReportSource::client(format!("org-{i}"), "default"));
    }
    let report = builder.build();

    let mut tracker = LineageTracker::new(ActionKind::Receive);
    let err = tracker.register_received(&report).unwrap_err();
    assert!(err.is_invariant_violation());
    assert!(tracker.received_ids().is_empty());
}

#[tokio::test]
async fn test_long_diagnostics_keep_prefix() {
    let store = MemoryStore::new();
    let input = receive(&store, &received_report(1)).await;

    let mut tracker = LineageTracker::new(ActionKind::Send).with_max_column_width(64);
    tracker.append_result("first line survives");
    tracker.append_result("é".repeat(200));
    tracker.register_consumed_input(input).unwrap();

    let sent_id = ReportId::new();
    tracker
        .register_sent(
            &destination(),
            SentReport {
                report_id: sent_id,
                external_name: Some("covid-19-out.csv".to_string()),
                body_format: "CSV".to_string(),
                transport_params: "email to=ops@phd.example.org".to_string(),
                transport_result: format!("attempt 1: {}", "x".repeat(500)),
                item_count: 1,
            },
        )
        .unwrap();

    let committed = tracker.commit(&store).await.unwrap();

    let action = store.find_action(committed.action_id).await.unwrap().unwrap();
    let result = action.action_result.unwrap();
    assert_eq!(result.chars().count(), 64);
    assert!(result.starts_with("first line survives\n"));

    let sent = store.find_report(sent_id).await.unwrap().unwrap();
    let transport_result = sent.transport_result.unwrap();
    assert_eq!(transport_result.chars().count(), 64);
    assert!(transport_result.starts_with("attempt 1: "));
    assert!(sent.body_url.is_none());
    assert_eq!(sent.external_name.as_deref(), Some("covid-19-out.csv"));

    let children = store.children_of(input).await.unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].child_report_id, sent_id);
}

#[tokio::test]
async fn test_commit_in_caller_scope() {
    let store = MemoryStore::new();
    let report = received_report(5);

    let mut scope = store.begin().await.unwrap();
    let mut tracker = LineageTracker::new(ActionKind::Receive);
    tracker.register_received(&report).unwrap();
    let committed = tracker.commit_in(scope.as_mut()).await.unwrap();

    assert!(store.find_action(committed.action_id).await.unwrap().is_none());
    scope.commit().await.unwrap();
    assert!(store.find_action(committed.action_id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_overlapping_scopes_cannot_both_claim_a_report() {
    let store = MemoryStore::new();
    let report = received_report(5);

    let mut first_scope = store.begin().await.unwrap();
    let mut second_scope = store.begin().await.unwrap();

    let mut first = LineageTracker::new(ActionKind::Receive);
    first.register_received(&report).unwrap();
    let first_committed = first.commit_in(first_scope.as_mut()).await.unwrap();

    let mut second = LineageTracker::new(ActionKind::Receive);
    second.register_received(&report).unwrap();
    second.commit_in(second_scope.as_mut()).await.unwrap();

    first_scope.commit().await.unwrap();
    let err = second_scope.commit().await.unwrap_err();
    assert!(matches!(err, ConduitError::Persistence(_)));

    let counts = store.row_counts().await.unwrap();
    assert_eq!(counts.actions, 1);
    assert_eq!(counts.reports, 1);
    let owner = store.find_report(report.id).await.unwrap().unwrap();
    assert_eq!(owner.action_id, Some(first_committed.action_id));
}
