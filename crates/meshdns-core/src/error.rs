//! Error types for meshdns
//!
//! Every error is fatal to the run it occurs in. The five stage variants
//! (`RosterUnavailable`, `ZoneReadFailure`, `InvalidHostname`,
//! `NoAddressForPeer`, `ActionFailure`) tell the operator how far the run
//! got; the remaining variants are raised by collaborators and wrapped into
//! a stage variant by the engine.

use thiserror::Error;

/// Result type alias for meshdns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for meshdns
#[derive(Error, Debug)]
pub enum Error {
    /// Mesh status could not be retrieved or parsed
    #[error("Mesh roster unavailable: {0}")]
    RosterUnavailable(String),

    /// Zone lookup or the initial record listing failed
    #[error("Failed to read zone records: {0}")]
    ZoneReadFailure(String),

    /// A peer hostname violates the trailing-dot contract
    #[error("Invalid hostname '{hostname}': {reason}")]
    InvalidHostname {
        /// The offending mesh hostname
        hostname: String,
        /// What is wrong with it
        reason: String,
    },

    /// A peer reported no addresses
    #[error("Peer {peer_id} has no address")]
    NoAddressForPeer {
        /// Mesh id of the peer
        peer_id: String,
    },

    /// A create/update/delete call failed
    #[error("Failed to {action} record {name}: {message}")]
    ActionFailure {
        /// "create", "update" or "delete"
        action: &'static str,
        /// Record name the action targeted
        name: String,
        /// Underlying failure
        message: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors (from provider APIs)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Zone or record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },
}

impl Error {
    /// Create a roster error
    pub fn roster(msg: impl Into<String>) -> Self {
        Self::RosterUnavailable(msg.into())
    }

    /// Create a zone read error
    pub fn zone_read(msg: impl Into<String>) -> Self {
        Self::ZoneReadFailure(msg.into())
    }

    /// Create an invalid hostname error
    pub fn invalid_hostname(hostname: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidHostname {
            hostname: hostname.into(),
            reason: reason.into(),
        }
    }

    /// Create a missing address error
    pub fn no_address(peer_id: impl Into<String>) -> Self {
        Self::NoAddressForPeer {
            peer_id: peer_id.into(),
        }
    }

    /// Create an action failure
    pub fn action(action: &'static str, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ActionFailure {
            action,
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// True for errors raised before anything in the zone was mutated
    ///
    /// The whole plan is computed before the first write, so only a failed
    /// action can leave the zone partially converged.
    pub fn is_pre_mutation(&self) -> bool {
        matches!(
            self,
            Self::RosterUnavailable(_)
                | Self::ZoneReadFailure(_)
                | Self::InvalidHostname { .. }
                | Self::NoAddressForPeer { .. }
                | Self::Config(_)
        )
    }
}
