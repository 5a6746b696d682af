//! Test doubles and common utilities for contract tests
//!
//! The zone double keeps records in memory and applies mutations for real,
//! so consecutive runs observe each other's effects. In dry-run mode it
//! counts mutations and answers with synthesized records, like a provider
//! built with dry-run enabled, but leaves the records alone.

#![allow(dead_code)]

use meshdns_core::config::{ProviderConfig, SyncConfig};
use meshdns_core::error::{Error, Result};
use meshdns_core::model::{Peer, RecordDraft, RosterSnapshot, ZoneRecord};
use meshdns_core::traits::{RosterSource, ZoneProvider};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const MESH_SUFFIX: &str = "tailnetxyz";
pub const MANAGED_SUFFIX: &str = ".example.com";
pub const MARKER: &str = "magicmagicdns";

/// A roster source returning a fixed snapshot (or failing)
pub struct StaticRoster {
    snapshot: Arc<Mutex<Option<RosterSnapshot>>>,
    call_count: Arc<AtomicUsize>,
}

impl StaticRoster {
    pub fn new(snapshot: RosterSnapshot) -> Self {
        Self {
            snapshot: Arc::new(Mutex::new(Some(snapshot))),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A source whose status command is unavailable
    pub fn unavailable() -> Self {
        Self {
            snapshot: Arc::new(Mutex::new(None)),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Replace the snapshot returned by later calls
    pub fn set(&self, snapshot: RosterSnapshot) {
        *self.snapshot.lock().unwrap() = Some(snapshot);
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Create a StaticRoster sharing state with an existing one
    pub fn sharing_state_with(other: &Self) -> Self {
        Self {
            snapshot: Arc::clone(&other.snapshot),
            call_count: Arc::clone(&other.call_count),
        }
    }
}

#[async_trait::async_trait]
impl RosterSource for StaticRoster {
    async fn snapshot(&self) -> Result<RosterSnapshot> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.snapshot
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::roster("tailscale status exited with 1"))
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

/// An in-memory zone that records every mutation
pub struct MemoryZone {
    records: Arc<Mutex<Vec<ZoneRecord>>>,
    next_id: Arc<AtomicUsize>,
    creates: Arc<AtomicUsize>,
    updates: Arc<AtomicUsize>,
    deletes: Arc<AtomicUsize>,
    /// Fail the nth mutation (1-based) when set
    fail_on_mutation: Arc<Mutex<Option<usize>>>,
    fail_listing: bool,
    dry_run: bool,
}

impl MemoryZone {
    pub fn new(records: Vec<ZoneRecord>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
            next_id: Arc::new(AtomicUsize::new(1)),
            creates: Arc::new(AtomicUsize::new(0)),
            updates: Arc::new(AtomicUsize::new(0)),
            deletes: Arc::new(AtomicUsize::new(0)),
            fail_on_mutation: Arc::new(Mutex::new(None)),
            fail_listing: false,
            dry_run: false,
        }
    }

    /// A zone that only pretends to apply mutations
    pub fn dry_run(records: Vec<ZoneRecord>) -> Self {
        Self {
            dry_run: true,
            ..Self::new(records)
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// A zone whose listing call fails
    pub fn unreadable() -> Self {
        Self {
            fail_listing: true,
            ..Self::empty()
        }
    }

    /// Make the nth mutation from now on fail
    pub fn fail_on_mutation(&self, n: usize) {
        *self.fail_on_mutation.lock().unwrap() = Some(self.mutations() + n);
    }

    pub fn clear_failure(&self) {
        *self.fail_on_mutation.lock().unwrap() = None;
    }

    pub fn records(&self) -> Vec<ZoneRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn find(&self, name: &str) -> Option<ZoneRecord> {
        self.records().into_iter().find(|r| r.name == name)
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn mutations(&self) -> usize {
        self.creates() + self.updates() + self.deletes()
    }

    /// Create a MemoryZone sharing records and counters with an existing one
    pub fn sharing_state_with(other: &Self) -> Self {
        Self {
            records: Arc::clone(&other.records),
            next_id: Arc::clone(&other.next_id),
            creates: Arc::clone(&other.creates),
            updates: Arc::clone(&other.updates),
            deletes: Arc::clone(&other.deletes),
            fail_on_mutation: Arc::clone(&other.fail_on_mutation),
            fail_listing: other.fail_listing,
            dry_run: other.dry_run,
        }
    }

    fn check_failure(&self) -> Result<()> {
        let attempt = self.mutations() + 1;
        if *self.fail_on_mutation.lock().unwrap() == Some(attempt) {
            return Err(Error::rate_limited("429 Too Many Requests"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ZoneProvider for MemoryZone {
    async fn find_zone(&self, zone_domain: &str) -> Result<String> {
        Ok(format!("zone-{zone_domain}"))
    }

    async fn list_address_records(&self, _zone_id: &str) -> Result<Vec<ZoneRecord>> {
        if self.fail_listing {
            return Err(Error::auth("403 Forbidden"));
        }
        Ok(self.records())
    }

    async fn create_record(&self, _zone_id: &str, draft: &RecordDraft) -> Result<ZoneRecord> {
        self.check_failure()?;
        self.creates.fetch_add(1, Ordering::SeqCst);
        if self.dry_run {
            return Ok(ZoneRecord::new("dry-run", &draft.name, &draft.content, &draft.comment));
        }

        let id = format!("rec-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let record = ZoneRecord::new(id, &draft.name, &draft.content, &draft.comment);
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn update_record(
        &self,
        _zone_id: &str,
        record_id: &str,
        draft: &RecordDraft,
    ) -> Result<ZoneRecord> {
        self.check_failure()?;
        self.updates.fetch_add(1, Ordering::SeqCst);
        if self.dry_run {
            return Ok(ZoneRecord::new(record_id, &draft.name, &draft.content, &draft.comment));
        }

        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| Error::not_found(record_id.to_string()))?;
        record.content = draft.content.clone();
        record.comment = draft.comment.clone();
        Ok(record.clone())
    }

    async fn delete_record(&self, _zone_id: &str, record_id: &str) -> Result<()> {
        self.check_failure()?;
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.dry_run {
            return Ok(());
        }

        self.records.lock().unwrap().retain(|r| r.id != record_id);
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}

/// A peer in the test mesh
pub fn peer(id: &str, host: &str, ip: &str) -> Peer {
    Peer::new(id, format!("{host}.{MESH_SUFFIX}."), vec![ip.to_string()])
}

/// A roster over the test mesh suffix
pub fn roster(peers: Vec<Peer>) -> RosterSnapshot {
    RosterSnapshot::new(MESH_SUFFIX, peers)
}

/// A managed record carrying the provenance marker
pub fn owned_record(id: &str, name: &str, ip: &str) -> ZoneRecord {
    ZoneRecord::new(
        id,
        name,
        ip,
        format!("Automatically created by {MARKER} at 2024-01-01T00:00:00Z"),
    )
}

/// Helper to create a minimal SyncConfig for testing
pub fn minimal_config() -> SyncConfig {
    SyncConfig::new(
        MANAGED_SUFFIX,
        "example.com",
        ProviderConfig::Cloudflare {
            api_token: "test-token".to_string(),
            zone_id: None,
        },
    )
}
