//! Roster vs. zone reconciliation
//!
//! Planning is pure: given a roster snapshot, the zone's address records
//! and a timestamp, [`Reconciler::plan`] returns the actions that converge
//! the managed part of the zone onto the roster. Nothing here performs I/O.
//!
//! ## Classification
//!
//! ```text
//! zone records ──┬── name under managed suffix ──┬── matched to a peer ──> keep (create/update/none)
//!                │                               └── orphaned ──┬── marker in comment ──> delete
//!                │                                              └── no marker ──────────> skip
//!                └── anything else ──> never inspected
//! ```
//!
//! Deletion decisions are made only after every peer has been matched, so a
//! record that some peer claims can never be deleted.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::model::{DesiredRecord, RecordDraft, RosterSnapshot, ZoneRecord};
use crate::naming;

/// Timestamp layout used in provenance comments
const COMMENT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// A single change to apply to the zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// No managed record exists for the peer yet
    Create {
        /// Peer the record is published for
        peer_id: String,
        /// Record to create
        draft: RecordDraft,
    },

    /// The managed record points at a stale address
    Update {
        /// Peer the record is published for
        peer_id: String,
        /// Record as currently stored
        existing: ZoneRecord,
        /// New content and comment
        draft: RecordDraft,
    },

    /// An owned managed record no longer matches any peer
    Delete {
        /// Record to remove
        record: ZoneRecord,
    },
}

impl Action {
    /// Verb used in logs and errors
    pub fn verb(&self) -> &'static str {
        match self {
            Action::Create { .. } => "create",
            Action::Update { .. } => "update",
            Action::Delete { .. } => "delete",
        }
    }

    /// Name of the record the action targets
    pub fn record_name(&self) -> &str {
        match self {
            Action::Create { draft, .. } | Action::Update { draft, .. } => &draft.name,
            Action::Delete { record } => &record.name,
        }
    }
}

/// Result of one planning pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    /// Creates and updates ordered by record name, then deletes
    pub actions: Vec<Action>,
    /// Managed records already matching their peer
    pub unchanged: Vec<ZoneRecord>,
    /// Orphaned managed records left alone because they lack the marker
    pub skipped: Vec<ZoneRecord>,
    /// Names claimed by a peer in this run, lowercased
    pub keep: HashSet<String>,
}

impl Plan {
    /// True when the zone already mirrors the roster
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Number of create actions
    pub fn creates(&self) -> usize {
        self.count(|a| matches!(a, Action::Create { .. }))
    }

    /// Number of update actions
    pub fn updates(&self) -> usize {
        self.count(|a| matches!(a, Action::Update { .. }))
    }

    /// Number of delete actions
    pub fn deletes(&self) -> usize {
        self.count(|a| matches!(a, Action::Delete { .. }))
    }

    fn count(&self, pred: impl Fn(&Action) -> bool) -> usize {
        self.actions.iter().filter(|a| pred(a)).count()
    }
}

/// Computes create/update/delete actions for the managed suffix
#[derive(Debug, Clone)]
pub struct Reconciler {
    managed_suffix: String,
    provenance_marker: String,
}

impl Reconciler {
    /// Create a reconciler for a managed suffix and provenance marker
    pub fn new(managed_suffix: impl Into<String>, provenance_marker: impl Into<String>) -> Self {
        Self {
            managed_suffix: managed_suffix.into(),
            provenance_marker: provenance_marker.into(),
        }
    }

    /// Create a reconciler from the sync configuration
    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(&config.managed_suffix, &config.provenance_marker)
    }

    /// Whether a zone record falls under the managed suffix
    pub fn is_managed(&self, record: &ZoneRecord) -> bool {
        naming::is_managed(&record.name, &self.managed_suffix)
    }

    /// Derive one desired record per public name from the roster
    ///
    /// Peers are visited in id order. When two peers normalize to the same
    /// name, the later one wins and a warning is logged.
    pub fn desired_records(&self, roster: &RosterSnapshot) -> Result<Vec<DesiredRecord>> {
        let mut desired: BTreeMap<String, DesiredRecord> = BTreeMap::new();

        for peer in roster.sorted_peers() {
            let name = naming::normalize(
                &peer.internal_hostname,
                &roster.mesh_suffix,
                &self.managed_suffix,
            )?;

            let address = peer
                .addresses
                .first()
                .map(|a| a.trim())
                .filter(|a| !a.is_empty())
                .ok_or_else(|| Error::no_address(&peer.id))?;

            debug!(
                "Peer {}: {} -> {} ({})",
                peer.id,
                peer.internal_hostname,
                name,
                peer.addresses.join("; ")
            );

            let record = DesiredRecord {
                name: name.clone(),
                address: address.to_string(),
                peer_id: peer.id.clone(),
            };

            if let Some(previous) = desired.insert(name, record) {
                warn!(
                    "Peers {} and {} both map to {}, using {}",
                    previous.peer_id, peer.id, previous.name, peer.id
                );
            }
        }

        Ok(desired.into_values().collect())
    }

    /// Plan the actions converging `zone` onto `roster`
    ///
    /// `now` stamps the provenance comments of creates and updates.
    pub fn plan(
        &self,
        roster: &RosterSnapshot,
        zone: &[ZoneRecord],
        now: DateTime<Utc>,
    ) -> Result<Plan> {
        let managed: Vec<&ZoneRecord> = zone.iter().filter(|r| self.is_managed(r)).collect();
        warn_on_duplicates(&managed);

        let desired = self.desired_records(roster)?;
        let timestamp = now.format(COMMENT_TIMESTAMP_FORMAT).to_string();

        let mut plan = Plan::default();

        for want in desired {
            // First match by scan order wins; desired names are already lowercase
            let existing = managed
                .iter()
                .copied()
                .find(|r| r.name.eq_ignore_ascii_case(&want.name));

            match existing {
                None => {
                    info!("Create {} -> {}", want.name, want.address);
                    plan.actions.push(Action::Create {
                        peer_id: want.peer_id,
                        draft: RecordDraft {
                            name: want.name.clone(),
                            content: want.address,
                            comment: self.comment("created", &timestamp),
                        },
                    });
                }
                Some(record) if record.content != want.address => {
                    info!(
                        "Update {} -> {} (was: {})",
                        want.name, want.address, record.content
                    );
                    plan.actions.push(Action::Update {
                        peer_id: want.peer_id,
                        existing: record.clone(),
                        draft: RecordDraft {
                            name: want.name.clone(),
                            content: want.address,
                            comment: self.comment("updated", &timestamp),
                        },
                    });
                }
                Some(record) => {
                    debug!("No need to update {} ({})", record.name, record.content);
                    plan.unchanged.push(record.clone());
                }
            }

            plan.keep.insert(want.name);
        }

        // Every peer has been matched; only now may anything be deleted
        for record in managed {
            if plan.keep.contains(&record.name.to_ascii_lowercase()) {
                continue;
            }

            if !record.is_owned_by(&self.provenance_marker) {
                warn!(
                    "Skip deleting {} {} because it was not created by {}",
                    record.name, record.content, self.provenance_marker
                );
                plan.skipped.push(record.clone());
                continue;
            }

            info!("Delete {} {}", record.name, record.content);
            plan.actions.push(Action::Delete {
                record: record.clone(),
            });
        }

        Ok(plan)
    }

    fn comment(&self, verb: &str, timestamp: &str) -> String {
        format!(
            "Automatically {verb} by {} at {timestamp}",
            self.provenance_marker
        )
    }
}

fn warn_on_duplicates(managed: &[&ZoneRecord]) {
    let mut seen = HashSet::new();
    for record in managed {
        if !seen.insert(record.name.to_ascii_lowercase()) {
            warn!(
                "Duplicate managed record {} (id {}), only the first is reconciled",
                record.name, record.id
            );
        }
    }
}
