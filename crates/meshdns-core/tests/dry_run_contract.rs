//! Contract Test: Dry-run Reporting
//!
//! Constraints verified:
//! - A dry-run pass reports the same plan a live pass would apply
//! - The report is flagged as dry-run and counts the synthesized outcomes
//! - The zone is left as it was, so a repeated dry run reports the same plan
//! - A live pass is never flagged as dry-run
//!
//! If this test fails, a dry run would misreport what a live run would do.

mod common;

use common::*;
use meshdns_core::model::ZoneRecord;
use meshdns_core::SyncEngine;

fn mixed_zone() -> Vec<ZoneRecord> {
    vec![
        owned_record("o1", "host2.example.com", "100.64.0.9"),
        owned_record("o2", "gone.example.com", "100.64.0.7"),
        owned_record("o3", "host3.example.com", "100.64.0.3"),
        ZoneRecord::new("f1", "manual.example.com", "10.0.0.2", "added by ops"),
    ]
}

fn mesh() -> StaticRoster {
    StaticRoster::new(roster(vec![
        peer("p1", "host1", "100.64.0.1"),
        peer("p2", "host2", "100.64.0.2"),
        peer("p3", "host3", "100.64.0.3"),
    ]))
}

#[tokio::test]
async fn dry_run_reports_planned_changes() {
    let zone = MemoryZone::dry_run(mixed_zone());
    let engine = SyncEngine::new(
        Box::new(mesh()),
        Box::new(MemoryZone::sharing_state_with(&zone)),
        minimal_config().with_dry_run(true),
    )
    .unwrap();

    let report = engine.run_once().await.unwrap();

    assert!(report.dry_run);
    assert_eq!(report.zone_id, "zone-example.com");
    assert_eq!(report.peers, 3);
    assert_eq!(report.created, 1);
    assert_eq!(report.updated, 1);
    assert_eq!(report.deleted, 1);
    assert_eq!(report.unchanged, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.changes(), 3);
    assert_eq!(zone.mutations(), 3);
}

#[tokio::test]
async fn dry_run_leaves_zone_untouched() {
    let zone = MemoryZone::dry_run(mixed_zone());
    let engine = SyncEngine::new(
        Box::new(mesh()),
        Box::new(MemoryZone::sharing_state_with(&zone)),
        minimal_config().with_dry_run(true),
    )
    .unwrap();

    let first = engine.run_once().await.unwrap();
    assert_eq!(zone.records(), mixed_zone());
    assert!(zone.find("host1.example.com").is_none());

    let second = engine.run_once().await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn live_run_is_not_flagged() {
    let zone = MemoryZone::new(mixed_zone());
    let engine = SyncEngine::new(
        Box::new(mesh()),
        Box::new(MemoryZone::sharing_state_with(&zone)),
        minimal_config(),
    )
    .unwrap();

    let report = engine.run_once().await.unwrap();

    assert!(!report.dry_run);
    assert_eq!(report.changes(), 3);
    assert_eq!(zone.find("host2.example.com").unwrap().content, "100.64.0.2");
}
