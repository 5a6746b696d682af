// # Zone Provider Trait
//
// Defines the interface for reading and mutating address records in a
// DNS zone via a provider API.
//
// ## Implementations
//
// - Cloudflare: `meshdns-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use meshdns_core::{RecordDraft, ZoneProvider};
//
// async fn publish(provider: &dyn ZoneProvider) -> meshdns_core::Result<()> {
//     let zone_id = provider.find_zone("example.com").await?;
//     let record = provider
//         .create_record(&zone_id, &RecordDraft {
//             name: "host1.ts.example.com".into(),
//             content: "100.64.0.1".into(),
//             comment: "Automatically created by magicmagicdns at 2024-01-01T00:00:00Z".into(),
//         })
//         .await?;
//     println!("created {}", record.id);
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::model::{RecordDraft, ZoneRecord};

/// Trait for DNS provider implementations
///
/// # Constraints
///
/// Providers are thin API wrappers:
/// - One API operation per call (pagination aside)
/// - No retry or backoff: return the error, the run aborts
/// - No decisions about *whether* a record should change; that is the
///   reconciler's job
/// - No state between calls
///
/// Only address (A) records are ever listed or written.
#[async_trait]
pub trait ZoneProvider: Send + Sync {
    /// Resolve a zone domain name to the provider's zone id
    async fn find_zone(&self, zone_domain: &str) -> Result<String, crate::Error>;

    /// List every A record in the zone
    async fn list_address_records(&self, zone_id: &str) -> Result<Vec<ZoneRecord>, crate::Error>;

    /// Create an A record, returning the record as stored
    async fn create_record(
        &self,
        zone_id: &str,
        draft: &RecordDraft,
    ) -> Result<ZoneRecord, crate::Error>;

    /// Overwrite content and comment of an existing A record
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        draft: &RecordDraft,
    ) -> Result<ZoneRecord, crate::Error>;

    /// Delete a record by id
    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
