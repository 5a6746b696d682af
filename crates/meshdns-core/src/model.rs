//! Data model shared by the reconciler and its collaborators
//!
//! Everything here is rebuilt from live snapshots on every run.

use std::collections::HashMap;

/// One mesh network member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    /// Stable identifier assigned by the mesh control plane
    pub id: String,
    /// Hostname inside the mesh naming domain, e.g. "host1.tailnet-abc.ts.net."
    pub internal_hostname: String,
    /// Mesh addresses; the first one is published
    pub addresses: Vec<String>,
}

impl Peer {
    /// Create a new peer
    pub fn new(
        id: impl Into<String>,
        internal_hostname: impl Into<String>,
        addresses: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            internal_hostname: internal_hostname.into(),
            addresses,
        }
    }
}

/// Mesh state at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterSnapshot {
    /// Internal naming domain of the mesh, without a trailing dot
    pub mesh_suffix: String,
    /// Peers keyed by id; iteration order carries no meaning
    pub peers: HashMap<String, Peer>,
}

impl RosterSnapshot {
    /// Create a snapshot from a suffix and a list of peers
    pub fn new(mesh_suffix: impl Into<String>, peers: impl IntoIterator<Item = Peer>) -> Self {
        Self {
            mesh_suffix: mesh_suffix.into(),
            peers: peers.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }

    /// Peers sorted by id
    pub fn sorted_peers(&self) -> Vec<&Peer> {
        let mut peers: Vec<&Peer> = self.peers.values().collect();
        peers.sort_by(|a, b| a.id.cmp(&b.id));
        peers
    }
}

/// An existing address record in the zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneRecord {
    /// Provider-assigned record id
    pub id: String,
    /// Fully-qualified record name
    pub name: String,
    /// Record content (the address)
    pub content: String,
    /// Free-text annotation, carries the provenance marker
    pub comment: String,
}

impl ZoneRecord {
    /// Create a new zone record
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            content: content.into(),
            comment: comment.into(),
        }
    }

    /// Whether the comment carries the given provenance marker
    pub fn is_owned_by(&self, marker: &str) -> bool {
        self.comment.contains(marker)
    }
}

/// Desired public record for one peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredRecord {
    /// Public name under the managed suffix
    pub name: String,
    /// Address to publish
    pub address: String,
    /// Peer the record was derived from
    pub peer_id: String,
}

/// Fields sent to the provider when creating or updating an A record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDraft {
    /// Record name
    pub name: String,
    /// Record content (the address)
    pub content: String,
    /// Provenance comment
    pub comment: String,
}
