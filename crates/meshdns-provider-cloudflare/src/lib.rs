// # Cloudflare Zone Provider
//
// This crate provides a Cloudflare implementation of `meshdns_core::ZoneProvider`.
//
// ## Behavior
//
// - ✅ One API operation per trait call (listing follows pagination)
// - ✅ Full error propagation; the run aborts on any failure
// - ✅ HTTP timeout configured (30 seconds)
// - ✅ Specific error handling for HTTP status codes (401/403, 404, 409, 429, 5xx)
// - ✅ Dry-run mode: reads are real, mutations are only logged
// - ✅ Pre-configured zone ID skips the zone lookup
// - ❌ NO retry or backoff
// - ❌ NO caching between calls
//
// ## Security Requirements
//
// - API token NEVER appears in logs or Debug output
// - Provider MUST fail fast if token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List Zones: GET `/zones?name=...`
// - List DNS Records: GET `/zones/:zone_id/dns_records?type=A&page=..&per_page=..`
// - Create DNS Record: POST `/zones/:zone_id/dns_records`
// - Update DNS Record: PATCH `/zones/:zone_id/dns_records/:record_id`
// - Delete DNS Record: DELETE `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use meshdns_core::config::ProviderConfig;
use meshdns_core::model::{RecordDraft, ZoneRecord};
use meshdns_core::traits::ZoneProvider;
use meshdns_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Records requested per listing page
const PAGE_SIZE: u32 = 100;

/// Cloudflare zone provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all GET requests (zone lookup, record listing)
/// - Log the intended POST/PATCH/DELETE payload
/// - **NOT** modify DNS records, returning what the API would have stored
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// Zone ID (optional, looked up from the zone domain otherwise)
    zone_id: Option<String>,

    /// API base URL (overridable for tests)
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip mutations
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("zone_id", &self.zone_id)
            .field("base_url", &self.base_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

/// Standard Cloudflare v4 response envelope
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    page: u32,
    total_pages: u32,
}

#[derive(Debug, Deserialize)]
struct Zone {
    id: String,
}

#[derive(Debug, Deserialize)]
struct DnsRecord {
    id: String,
    name: String,
    content: String,
    #[serde(default)]
    comment: Option<String>,
}

impl From<DnsRecord> for ZoneRecord {
    fn from(r: DnsRecord) -> Self {
        ZoneRecord::new(r.id, r.name, r.content, r.comment.unwrap_or_default())
    }
}

#[derive(Debug, Serialize)]
struct RecordBody<'a> {
    #[serde(rename = "type")]
    record_type: &'static str,
    name: &'a str,
    content: &'a str,
    comment: &'a str,
}

impl<'a> From<&'a RecordDraft> for RecordBody<'a> {
    fn from(draft: &'a RecordDraft) -> Self {
        Self {
            record_type: "A",
            name: &draft.name,
            content: &draft.content,
            comment: &draft.comment,
        }
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    /// - `zone_id`: Optional zone ID (looked up by name otherwise)
    /// - `dry_run`: If true, perform GET requests but skip mutations
    ///
    /// # Security
    ///
    /// The API token will NEVER be logged or displayed in error messages.
    pub fn new(api_token: impl Into<String>, zone_id: Option<String>, dry_run: bool) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_token,
            zone_id,
            base_url: CLOUDFLARE_API_BASE.to_string(),
            client,
            dry_run,
        })
    }

    /// Build a provider from configuration
    pub fn from_config(config: &ProviderConfig, dry_run: bool) -> Result<Self> {
        match config {
            ProviderConfig::Cloudflare { api_token, zone_id } => {
                if dry_run {
                    tracing::warn!("Cloudflare provider running in DRY-RUN mode - no changes will be made");
                }
                Self::new(api_token.clone(), zone_id.clone(), dry_run)
            }
        }
    }

    /// Point the provider at a different API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether mutations are skipped
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Send a request and unwrap the Cloudflare envelope
    ///
    /// `context` describes the operation for error messages.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<Envelope<T>> {
        let response = request
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| Error::http(format!("{context}: HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(status_error(status.as_u16(), &error_text, context));
        }

        let envelope: Envelope<T> = response.json().await.map_err(|e| {
            Error::provider("cloudflare", format!("{context}: Failed to parse response: {e}"))
        })?;

        if !envelope.success {
            let messages: Vec<String> = envelope
                .errors
                .iter()
                .map(|m| format!("{} ({})", m.message, m.code))
                .collect();
            return Err(Error::provider(
                "cloudflare",
                format!("{context}: {}", messages.join("; ")),
            ));
        }

        Ok(envelope)
    }

    fn records_url(&self, zone_id: &str) -> String {
        format!("{}/zones/{}/dns_records", self.base_url, zone_id)
    }

    fn record_url(&self, zone_id: &str, record_id: &str) -> String {
        format!("{}/zones/{}/dns_records/{}", self.base_url, zone_id, record_id)
    }
}

/// Map a non-success HTTP status to an error
fn status_error(status: u16, body: &str, context: &str) -> Error {
    match status {
        401 | 403 => Error::auth(format!(
            "{context}: Invalid API token or insufficient permissions. Status: {status}"
        )),
        404 => Error::not_found(format!("{context}: {body}")),
        409 => Error::provider(
            "cloudflare",
            format!("{context}: Conflict: Record is being updated by another process. Status: {status}"),
        ),
        429 => Error::rate_limited(format!("{context}: Rate limit exceeded. Status: {status}")),
        500..=599 => Error::provider(
            "cloudflare",
            format!("{context}: Cloudflare server error: {status} - {body}"),
        ),
        _ => Error::provider("cloudflare", format!("{context}: {status} - {body}")),
    }
}

#[async_trait]
impl ZoneProvider for CloudflareProvider {
    /// ```http
    /// GET /zones?name=example.com
    /// ```
    async fn find_zone(&self, zone_domain: &str) -> Result<String> {
        if let Some(ref zone_id) = self.zone_id {
            tracing::debug!("Using pre-configured zone ID");
            return Ok(zone_id.clone());
        }

        tracing::debug!("Looking up zone ID for domain: {}", zone_domain);

        let request = self
            .client
            .get(format!("{}/zones", self.base_url))
            .query(&[("name", zone_domain)]);
        let envelope: Envelope<Vec<Zone>> = self.send(request, "Zone lookup").await?;

        let zone = envelope
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(format!("Zone not found: {zone_domain}")))?;

        tracing::debug!("Found zone ID: {}", zone.id);
        Ok(zone.id)
    }

    /// ```http
    /// GET /zones/:zone_id/dns_records?type=A&page=1&per_page=100
    /// ```
    async fn list_address_records(&self, zone_id: &str) -> Result<Vec<ZoneRecord>> {
        let mut records = Vec::new();
        let mut page = 1u32;

        loop {
            let request = self.client.get(self.records_url(zone_id)).query(&[
                ("type", "A".to_string()),
                ("page", page.to_string()),
                ("per_page", PAGE_SIZE.to_string()),
            ]);
            let envelope: Envelope<Vec<DnsRecord>> = self.send(request, "Record listing").await?;

            records.extend(envelope.result.unwrap_or_default().into_iter().map(ZoneRecord::from));

            match envelope.result_info {
                Some(info) if info.page < info.total_pages => page = info.page + 1,
                _ => break,
            }
        }

        tracing::debug!("Listed {} A record(s) in zone {}", records.len(), zone_id);
        Ok(records)
    }

    /// ```http
    /// POST /zones/:zone_id/dns_records
    /// { "type": "A", "name": "...", "content": "...", "comment": "..." }
    /// ```
    async fn create_record(&self, zone_id: &str, draft: &RecordDraft) -> Result<ZoneRecord> {
        let body = RecordBody::from(draft);

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send POST to {} with payload: {}",
                self.records_url(zone_id),
                serde_json::to_string(&body)?
            );
            return Ok(ZoneRecord::new(
                "dry-run",
                &draft.name,
                &draft.content,
                &draft.comment,
            ));
        }

        let request = self.client.post(self.records_url(zone_id)).json(&body);
        let envelope: Envelope<DnsRecord> = self.send(request, "Record creation").await?;
        envelope
            .result
            .map(ZoneRecord::from)
            .ok_or_else(|| Error::provider("cloudflare", "Record creation returned no result"))
    }

    /// ```http
    /// PATCH /zones/:zone_id/dns_records/:record_id
    /// { "type": "A", "name": "...", "content": "...", "comment": "..." }
    /// ```
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        draft: &RecordDraft,
    ) -> Result<ZoneRecord> {
        let body = RecordBody::from(draft);
        let url = self.record_url(zone_id, record_id);

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send PATCH to {} with payload: {}",
                url,
                serde_json::to_string(&body)?
            );
            return Ok(ZoneRecord::new(record_id, &draft.name, &draft.content, &draft.comment));
        }

        let request = self.client.patch(url).json(&body);
        let envelope: Envelope<DnsRecord> = self.send(request, "Record update").await?;
        envelope
            .result
            .map(ZoneRecord::from)
            .ok_or_else(|| Error::provider("cloudflare", "Record update returned no result"))
    }

    /// ```http
    /// DELETE /zones/:zone_id/dns_records/:record_id
    /// ```
    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<()> {
        let url = self.record_url(zone_id, record_id);

        if self.dry_run {
            tracing::info!("[DRY-RUN] Would send DELETE to {}", url);
            return Ok(());
        }

        let request = self.client.delete(url);
        let _: Envelope<serde_json::Value> = self.send(request, "Record deletion").await?;
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let config = ProviderConfig::Cloudflare {
            api_token: "test_token".to_string(),
            zone_id: Some("test_zone".to_string()),
        };

        let provider = CloudflareProvider::from_config(&config, false).unwrap();
        assert_eq!(provider.zone_id.as_deref(), Some("test_zone"));
        assert!(!provider.is_dry_run());
    }

    #[test]
    fn test_empty_token_rejected() {
        let err = CloudflareProvider::new("", None, false).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_api_token_not_exposed_in_debug() {
        let provider = CloudflareProvider::new("secret_token_12345", None, false).unwrap();

        let debug_str = format!("{:?}", provider);
        assert!(!debug_str.contains("secret_token"));
        assert!(debug_str.contains("CloudflareProvider"));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let provider = CloudflareProvider::new("token", None, false)
            .unwrap()
            .with_base_url("http://127.0.0.1:9999/");
        assert_eq!(
            provider.record_url("z", "r"),
            "http://127.0.0.1:9999/zones/z/dns_records/r"
        );
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(status_error(401, "", "x"), Error::Authentication(_)));
        assert!(matches!(status_error(403, "", "x"), Error::Authentication(_)));
        assert!(matches!(status_error(404, "", "x"), Error::NotFound(_)));
        assert!(matches!(status_error(429, "", "x"), Error::RateLimited(_)));
        assert!(matches!(status_error(409, "", "x"), Error::Provider { .. }));
        assert!(matches!(status_error(502, "bad gateway", "x"), Error::Provider { .. }));
    }

    #[test]
    fn test_record_body_serialization() {
        let draft = RecordDraft {
            name: "host1.example.com".to_string(),
            content: "100.64.0.1".to_string(),
            comment: "Automatically created by magicmagicdns at 2024-01-01T00:00:00Z".to_string(),
        };
        let value = serde_json::to_value(RecordBody::from(&draft)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "type": "A",
                "name": "host1.example.com",
                "content": "100.64.0.1",
                "comment": "Automatically created by magicmagicdns at 2024-01-01T00:00:00Z",
            })
        );
    }

    #[test]
    fn test_null_comment_becomes_empty() {
        let record: DnsRecord = serde_json::from_value(serde_json::json!({
            "id": "r1",
            "name": "a.example.com",
            "content": "1.2.3.4",
            "comment": null,
            "type": "A",
        }))
        .unwrap();
        assert_eq!(ZoneRecord::from(record).comment, "");
    }
}
