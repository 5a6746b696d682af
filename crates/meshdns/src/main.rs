// # meshdns - one-shot mesh → DNS sync
//
// This binary is a THIN integration layer:
// 1. Reading configuration from a `.env` file and environment variables
// 2. Initializing logging and the runtime
// 3. Wiring the Tailscale roster and Cloudflare provider into the engine
// 4. Running one reconciliation pass and mapping the outcome to an exit code
//
// All reconciliation logic lives in meshdns-core.
//
// ## Configuration
//
// Variables are read from the process environment. A `.env` file in the
// working directory is loaded first if present; variables already set in
// the environment win over the file.
//
// - `MESHDNS_MANAGED_SUFFIX`: Public suffix peers are published under (required)
// - `MESHDNS_ZONE_DOMAIN`: Cloudflare zone holding the records (required)
// - `MESHDNS_PROVIDER_API_TOKEN`: Cloudflare API token (required)
// - `MESHDNS_PROVIDER_ZONE_ID`: Zone ID, skips the zone lookup (optional)
// - `MESHDNS_TAILSCALE_BIN`: tailscale CLI to run (default: tailscale)
// - `MESHDNS_PROVENANCE_MARKER`: Comment marker for owned records (default: magicmagicdns)
// - `MESHDNS_MODE`: Set to `dry-run` to log mutations without sending them
// - `MESHDNS_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// ## Example
//
// ```bash
// export MESHDNS_MANAGED_SUFFIX=ts.example.com
// export MESHDNS_ZONE_DOMAIN=example.com
// export MESHDNS_PROVIDER_API_TOKEN=your_token
//
// meshdns
// ```

use anyhow::{Context, Result};
use meshdns_core::config::{ProviderConfig, RosterConfig, SyncConfig};
use meshdns_core::SyncEngine;
use meshdns_provider_cloudflare::CloudflareProvider;
use meshdns_roster_tailscale::TailscaleRoster;
use std::env;
use std::path::Path;
use std::process::ExitCode;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy)]
enum MeshdnsExitCode {
    /// Zone converged
    Converged = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Reconciliation failed
    RuntimeError = 2,
}

impl From<MeshdnsExitCode> for ExitCode {
    fn from(code: MeshdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Optional dotenv file, relative to the working directory
const ENV_FILE: &str = ".env";

/// Environment-derived settings, before validation
struct EnvConfig {
    managed_suffix: String,
    zone_domain: String,
    api_token: String,
    zone_id: Option<String>,
    tailscale_bin: Option<String>,
    provenance_marker: Option<String>,
    mode: String,
    log_level: String,
}

impl EnvConfig {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            managed_suffix: required("MESHDNS_MANAGED_SUFFIX")?,
            zone_domain: required("MESHDNS_ZONE_DOMAIN")?,
            api_token: required("MESHDNS_PROVIDER_API_TOKEN")?,
            zone_id: optional("MESHDNS_PROVIDER_ZONE_ID"),
            tailscale_bin: optional("MESHDNS_TAILSCALE_BIN"),
            provenance_marker: optional("MESHDNS_PROVENANCE_MARKER"),
            mode: env::var("MESHDNS_MODE").unwrap_or_else(|_| "live".to_string()),
            log_level: env::var("MESHDNS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Turn the raw settings into a validated SyncConfig
    fn into_sync_config(self) -> Result<SyncConfig> {
        let dry_run = match self.mode.to_lowercase().as_str() {
            "live" | "" => false,
            "dry-run" => true,
            other => anyhow::bail!("MESHDNS_MODE '{}' is not valid. Valid modes: live, dry-run", other),
        };

        let provider = ProviderConfig::Cloudflare {
            api_token: self.api_token,
            zone_id: self.zone_id,
        };

        let mut config = SyncConfig::new(self.managed_suffix, self.zone_domain, provider)
            .with_dry_run(dry_run);
        if let Some(marker) = self.provenance_marker {
            config = config.with_provenance_marker(marker);
        }
        if let Some(binary) = self.tailscale_bin {
            config.roster = RosterConfig::Tailscale { binary };
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

/// Load `path` into the process environment
///
/// Returns `Ok(false)` when the file does not exist. Variables already set
/// are not overridden.
fn load_env_file(path: &Path) -> Result<bool> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(e).with_context(|| format!("Failed to load {}", path.display())),
    }
}

fn required(name: &str) -> Result<String> {
    optional(name).with_context(|| format!("{name} is required. Set it via: export {name}=..."))
}

fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "MESHDNS_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

fn main() -> ExitCode {
    let env_file_loaded = match load_env_file(Path::new(ENV_FILE)) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Configuration error: {e:#}");
            return MeshdnsExitCode::ConfigError.into();
        }
    };

    let env_config = match EnvConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e:#}");
            return MeshdnsExitCode::ConfigError.into();
        }
    };

    let log_level = match parse_log_level(&env_config.log_level) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {e:#}");
            return MeshdnsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {e}");
        return MeshdnsExitCode::ConfigError.into();
    }
    if env_file_loaded {
        debug!("Loaded environment from {}", ENV_FILE);
    }

    let config = match env_config.into_sync_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration validation error: {:#}", e);
            return MeshdnsExitCode::ConfigError.into();
        }
    };

    // A single pass of sequential I/O needs no worker threads
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return MeshdnsExitCode::RuntimeError.into();
        }
    };

    match rt.block_on(run(config)) {
        Ok(()) => MeshdnsExitCode::Converged.into(),
        Err(e) => {
            error!("Sync failed: {:#}", e);
            let untouched = e
                .downcast_ref::<meshdns_core::Error>()
                .is_some_and(meshdns_core::Error::is_pre_mutation);
            if untouched {
                info!("No changes were made to the zone");
            } else {
                warn!("The zone may be partially updated, the next run converges it");
            }
            MeshdnsExitCode::RuntimeError.into()
        }
    }
}

/// Wire collaborators and run one pass
async fn run(config: SyncConfig) -> Result<()> {
    info!(
        "Syncing mesh peers into zone {} under {}",
        config.zone_domain, config.managed_suffix
    );

    let roster = TailscaleRoster::from_config(&config.roster);
    let provider = CloudflareProvider::from_config(&config.provider, config.dry_run)?;

    let engine = SyncEngine::new(Box::new(roster), Box::new(provider), config)?;
    let report = engine.run_once().await?;

    info!(
        "Zone {} converged: {} peer(s), {} change(s)",
        report.zone_id,
        report.peers,
        report.changes()
    );
    Ok(())
}
