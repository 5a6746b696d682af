// # Roster Source Trait
//
// Defines the interface for reading the current mesh peer roster.
//
// ## Implementations
//
// - Tailscale: `meshdns-roster-tailscale` crate (`tailscale status --json`)
//
// ## Usage
//
// ```rust,ignore
// use meshdns_core::RosterSource;
//
// async fn print_peers(source: &dyn RosterSource) -> meshdns_core::Result<()> {
//     let snapshot = source.snapshot().await?;
//     for peer in snapshot.sorted_peers() {
//         println!("{} {}", peer.id, peer.internal_hostname);
//     }
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::model::RosterSnapshot;

/// Trait for mesh roster implementations
///
/// Implementations are single-shot: one call reads the mesh state once and
/// returns it. No caching, no retries; a failure is reported as
/// [`Error::RosterUnavailable`](crate::Error::RosterUnavailable) and ends
/// the run before anything in the zone is touched.
#[async_trait]
pub trait RosterSource: Send + Sync {
    /// Read the mesh suffix and the full peer mapping
    async fn snapshot(&self) -> Result<RosterSnapshot, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
