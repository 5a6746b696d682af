//! Core sync engine
//!
//! The SyncEngine runs one reconciliation pass:
//! - Resolves the zone and lists its address records
//! - Reads the mesh roster
//! - Plans the converging actions
//! - Applies them through the provider
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐                     ┌──────────────┐
//! │ ZoneProvider │── zone records ──┐  │ RosterSource │
//! └──────────────┘                  │  └──────────────┘
//!        ▲                          │         │ snapshot
//!        │                          ▼         ▼
//!        │                      ┌──────────────────┐
//!        │                      │    Reconciler    │
//!        │                      └──────────────────┘
//!        │                               │ plan
//!        │                               ▼
//!        │                      ┌──────────────────┐
//!        └──── create/update/ ──│     Executor     │
//!              delete           └──────────────────┘
//! ```
//!
//! ## Failure Model
//!
//! Every error ends the pass. Reads happen before any mutation, so a
//! roster or zone failure leaves the zone untouched. A failed action
//! leaves earlier actions applied; running again converges.

use chrono::Utc;
use tracing::{debug, info};

use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::executor::{ActionOutcome, Executor};
use crate::model::ZoneRecord;
use crate::reconcile::Reconciler;
use crate::traits::{RosterSource, ZoneProvider};

/// Summary of one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Provider zone id the pass ran against
    pub zone_id: String,
    /// Peers in the roster
    pub peers: usize,
    /// Records created
    pub created: usize,
    /// Records whose address changed
    pub updated: usize,
    /// Records already correct
    pub unchanged: usize,
    /// Owned orphans removed
    pub deleted: usize,
    /// Foreign orphans left in place
    pub skipped: usize,
    /// Mutations were only logged
    pub dry_run: bool,
}

impl SyncReport {
    /// Number of mutations applied
    pub fn changes(&self) -> usize {
        self.created + self.updated + self.deleted
    }
}

/// One-shot roster → zone synchronizer
///
/// ## Lifecycle
///
/// 1. Create with [`SyncEngine::new()`] (validates the configuration)
/// 2. Call [`SyncEngine::run_once()`]
/// 3. Exit; the next invocation starts from fresh snapshots
pub struct SyncEngine {
    /// Mesh roster reader
    roster: Box<dyn RosterSource>,

    /// DNS provider for the target zone
    provider: Box<dyn ZoneProvider>,

    /// Diff logic for the managed suffix
    reconciler: Reconciler,

    /// Sync configuration
    config: SyncConfig,
}

impl SyncEngine {
    /// Create a new sync engine
    ///
    /// # Parameters
    ///
    /// - `roster`: Mesh roster implementation
    /// - `provider`: DNS provider implementation
    /// - `config`: Sync configuration
    pub fn new(
        roster: Box<dyn RosterSource>,
        provider: Box<dyn ZoneProvider>,
        config: SyncConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            roster,
            provider,
            reconciler: Reconciler::from_config(&config),
            config,
        })
    }

    /// Run one reconciliation pass
    ///
    /// # Returns
    ///
    /// - `Ok(SyncReport)`: The zone now mirrors the roster
    /// - `Err(Error)`: The pass stopped at the first failure
    pub async fn run_once(&self) -> Result<SyncReport> {
        let zone_id = self
            .provider
            .find_zone(&self.config.zone_domain)
            .await
            .map_err(|e| Error::zone_read(format!("zone {}: {e}", self.config.zone_domain)))?;
        info!("Zone {} ({})", self.config.zone_domain, zone_id);

        let records = self
            .provider
            .list_address_records(&zone_id)
            .await
            .map_err(|e| Error::zone_read(e.to_string()))?;
        self.log_zone(&records);

        let snapshot = self.roster.snapshot().await.map_err(|e| match e {
            Error::RosterUnavailable(_) => e,
            other => Error::roster(other.to_string()),
        })?;
        info!(
            "Mesh suffix {}: {} peer(s) from {}",
            snapshot.mesh_suffix,
            snapshot.peers.len(),
            self.roster.source_name()
        );

        let plan = self.reconciler.plan(&snapshot, &records, Utc::now())?;
        info!(
            "Plan: {} create, {} update, {} delete, {} unchanged, {} skipped",
            plan.creates(),
            plan.updates(),
            plan.deletes(),
            plan.unchanged.len(),
            plan.skipped.len()
        );

        let executor = Executor::new(self.provider.as_ref(), &zone_id);
        let outcomes = executor.apply_all(&plan).await?;

        let mut report = SyncReport {
            zone_id,
            peers: snapshot.peers.len(),
            unchanged: plan.unchanged.len(),
            skipped: plan.skipped.len(),
            dry_run: self.config.dry_run,
            ..SyncReport::default()
        };
        for outcome in &outcomes {
            match outcome {
                ActionOutcome::Created(_) => report.created += 1,
                ActionOutcome::Updated { .. } => report.updated += 1,
                ActionOutcome::Deleted(_) => report.deleted += 1,
            }
        }

        info!(
            "Done: {} created, {} updated, {} deleted, {} unchanged, {} skipped{}",
            report.created,
            report.updated,
            report.deleted,
            report.unchanged,
            report.skipped,
            if report.dry_run { " [DRY-RUN]" } else { "" }
        );

        Ok(report)
    }

    fn log_zone(&self, records: &[ZoneRecord]) {
        info!("{} A record(s) in zone", records.len());
        for record in records {
            debug!("A record: {} {}", record.name, record.content);
        }
        for record in records.iter().filter(|r| self.reconciler.is_managed(r)) {
            info!("Managed record: {} {}", record.name, record.content);
        }
    }
}
