// # Tailscale Roster Source
//
// This crate reads the mesh roster from the local tailscale daemon by
// running `tailscale status --json` once per call.
//
// ## Status Document
//
// Only the fields meshdns needs are decoded:
//
// ```json
// {
//   "CurrentTailnet": { "MagicDNSSuffix": "tail1234.ts.net" },
//   "Peer": {
//     "nodekey:abcd": {
//       "ID": "n1234CNTRL",
//       "DNSName": "laptop.tail1234.ts.net.",
//       "TailscaleIPs": ["100.64.0.1", "fd7a:115c:a1e0::1"]
//     }
//   }
// }
// ```
//
// `CurrentTailnet` is null while the node is logged out; that is reported
// as an unavailable roster rather than an empty one, so a logged-out node
// never causes every managed record to be deleted.

use async_trait::async_trait;
use meshdns_core::config::RosterConfig;
use meshdns_core::model::{Peer, RosterSnapshot};
use meshdns_core::traits::RosterSource;
use meshdns_core::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use tokio::process::Command;

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(rename = "CurrentTailnet")]
    current_tailnet: Option<CurrentTailnet>,
    #[serde(rename = "Peer", default)]
    peers: Option<HashMap<String, PeerStatus>>,
}

#[derive(Debug, Deserialize)]
struct CurrentTailnet {
    #[serde(rename = "MagicDNSSuffix", default)]
    magic_dns_suffix: String,
}

#[derive(Debug, Deserialize)]
struct PeerStatus {
    #[serde(rename = "ID", default)]
    id: String,
    #[serde(rename = "DNSName", default)]
    dns_name: String,
    #[serde(rename = "TailscaleIPs", default)]
    tailscale_ips: Option<Vec<String>>,
}

/// Parse a `tailscale status --json` document into a roster snapshot
///
/// Peers without an `ID` are keyed by their map key instead.
pub fn parse_status(json: &[u8]) -> Result<RosterSnapshot> {
    let status: Status = serde_json::from_slice(json)
        .map_err(|e| Error::roster(format!("Failed to parse tailscale status: {e}")))?;

    let tailnet = status
        .current_tailnet
        .ok_or_else(|| Error::roster("tailscale status has no CurrentTailnet (logged out?)"))?;

    let suffix = tailnet.magic_dns_suffix.trim_end_matches('.').to_string();
    if suffix.is_empty() {
        return Err(Error::roster("tailscale status has an empty MagicDNSSuffix"));
    }

    let peers = status
        .peers
        .unwrap_or_default()
        .into_iter()
        .map(|(key, p)| {
            let id = if p.id.is_empty() { key } else { p.id };
            Peer::new(id, p.dns_name, p.tailscale_ips.unwrap_or_default())
        });

    Ok(RosterSnapshot::new(suffix, peers))
}

/// Roster source backed by the tailscale CLI
#[derive(Debug, Clone)]
pub struct TailscaleRoster {
    /// Path or name of the tailscale binary
    binary: String,
}

impl TailscaleRoster {
    /// Create a roster source running the given tailscale binary
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Build a roster source from configuration
    pub fn from_config(config: &RosterConfig) -> Self {
        match config {
            RosterConfig::Tailscale { binary } => Self::new(binary.clone()),
        }
    }
}

#[async_trait]
impl RosterSource for TailscaleRoster {
    async fn snapshot(&self) -> Result<RosterSnapshot> {
        tracing::debug!("Running {} status --json", self.binary);

        let output = Command::new(&self.binary)
            .args(["status", "--json"])
            .output()
            .await
            .map_err(|e| Error::roster(format!("Failed to run {}: {e}", self.binary)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::roster(format!(
                "{} status exited with {}: {}",
                self.binary,
                output.status,
                stderr.trim()
            )));
        }

        parse_status(&output.stdout)
    }

    fn source_name(&self) -> &'static str {
        "tailscale"
    }
}
