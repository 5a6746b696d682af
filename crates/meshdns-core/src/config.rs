//! Configuration types for meshdns
//!
//! The configuration is built once at startup (see the `meshdns` binary) and
//! passed explicitly into the engine and its collaborators.

use serde::{Deserialize, Serialize};

/// Provenance marker written into record comments when none is configured
pub const DEFAULT_PROVENANCE_MARKER: &str = "magicmagicdns";

/// Status command used when none is configured
pub const DEFAULT_TAILSCALE_BINARY: &str = "tailscale";

/// Main sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Public suffix peers are published under (e.g. "ts.example.com").
    /// A leading dot is accepted and ignored.
    pub managed_suffix: String,

    /// Domain of the DNS zone holding the records (e.g. "example.com")
    pub zone_domain: String,

    /// Substring marking a record comment as written by meshdns
    #[serde(default = "default_provenance_marker")]
    pub provenance_marker: String,

    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// Mesh roster configuration
    #[serde(default)]
    pub roster: RosterConfig,

    /// Log intended mutations without sending them
    #[serde(default)]
    pub dry_run: bool,
}

impl SyncConfig {
    /// Create a configuration with default marker and roster settings
    pub fn new(
        managed_suffix: impl Into<String>,
        zone_domain: impl Into<String>,
        provider: ProviderConfig,
    ) -> Self {
        Self {
            managed_suffix: managed_suffix.into(),
            zone_domain: zone_domain.into(),
            provenance_marker: default_provenance_marker(),
            provider,
            roster: RosterConfig::default(),
            dry_run: false,
        }
    }

    /// Override the provenance marker
    pub fn with_provenance_marker(mut self, marker: impl Into<String>) -> Self {
        self.provenance_marker = marker.into();
        self
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        let suffix = self.managed_suffix.trim_start_matches('.');
        validate_domain_name("managed suffix", suffix)?;
        validate_domain_name("zone domain", &self.zone_domain)?;

        if self.provenance_marker.trim().is_empty() {
            return Err(crate::Error::config("Provenance marker cannot be empty"));
        }

        self.provider.validate()?;
        self.roster.validate()?;

        Ok(())
    }
}

/// DNS provider configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Cloudflare provider
    Cloudflare {
        /// Cloudflare API token
        api_token: String,
        /// Zone ID (optional, looked up from the zone domain otherwise)
        zone_id: Option<String>,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Cloudflare { api_token, zone_id } => {
                if api_token.is_empty() {
                    return Err(crate::Error::config("Cloudflare API token cannot be empty"));
                }
                if zone_id.as_ref().is_some_and(|id| id.trim().is_empty()) {
                    return Err(crate::Error::config("Cloudflare zone ID cannot be blank"));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Cloudflare { .. } => "cloudflare",
        }
    }
}

// The token never reaches Debug output
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Cloudflare { zone_id, .. } => f
                .debug_struct("Cloudflare")
                .field("api_token", &"<REDACTED>")
                .field("zone_id", zone_id)
                .finish(),
        }
    }
}

/// Mesh roster configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RosterConfig {
    /// `tailscale status --json`
    Tailscale {
        /// Path or name of the tailscale CLI
        #[serde(default = "default_tailscale_binary")]
        binary: String,
    },
}

impl RosterConfig {
    /// Validate the roster configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            RosterConfig::Tailscale { binary } => {
                if binary.trim().is_empty() {
                    return Err(crate::Error::config("Tailscale binary cannot be empty"));
                }
                Ok(())
            }
        }
    }
}

impl Default for RosterConfig {
    fn default() -> Self {
        RosterConfig::Tailscale {
            binary: default_tailscale_binary(),
        }
    }
}

fn default_provenance_marker() -> String {
    DEFAULT_PROVENANCE_MARKER.to_string()
}

fn default_tailscale_binary() -> String {
    DEFAULT_TAILSCALE_BINARY.to_string()
}

/// Validate that a string is a valid domain name
///
/// Basic RFC 1035 checks: total length, label length, label charset and
/// hyphen placement. `what` names the setting in the error message.
pub fn validate_domain_name(what: &str, domain: &str) -> Result<(), crate::Error> {
    if domain.is_empty() {
        return Err(crate::Error::config(format!("{what} cannot be empty")));
    }

    if domain.len() > 253 {
        return Err(crate::Error::config(format!(
            "{what} too long: {} chars (max 253). Got: {domain}",
            domain.len()
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(crate::Error::config(format!(
                "{what} has empty label: '{domain}'"
            )));
        }

        if label.len() > 63 {
            return Err(crate::Error::config(format!(
                "{what} label too long: {} chars (max 63). Label: '{label}'",
                label.len()
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(crate::Error::config(format!(
                "{what} label contains invalid characters. Label: '{label}'. \
                Valid: alphanumeric and hyphen only."
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(crate::Error::config(format!(
                "{what} label cannot start or end with hyphen. Label: '{label}'"
            )));
        }
    }

    Ok(())
}
