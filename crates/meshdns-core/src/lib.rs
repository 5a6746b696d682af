// # meshdns-core
//
// Core library for publishing mesh network peers into a public DNS zone.
//
// ## Architecture Overview
//
// This library provides the reconciliation logic and the seams around it:
// - **RosterSource**: Trait for reading the current mesh peer roster
// - **ZoneProvider**: Trait for listing and mutating address records in a zone
// - **Reconciler**: Pure diff of roster against managed zone records
// - **Executor**: Applies the planned actions through a `ZoneProvider`
// - **SyncEngine**: One reconciliation pass, roster + zone → plan → apply
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Planning is pure, I/O lives behind traits
// 2. **All-or-abort**: Any collaborator error ends the run
// 3. **Idempotency**: Re-running against an unchanged roster emits no actions
// 4. **Ownership**: Records without the provenance marker are never deleted

pub mod traits;
pub mod model;
pub mod naming;
pub mod reconcile;
pub mod executor;
pub mod engine;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{RosterSource, ZoneProvider};
pub use model::{Peer, RosterSnapshot, ZoneRecord, DesiredRecord, RecordDraft};
pub use naming::normalize;
pub use reconcile::{Action, Plan, Reconciler};
pub use executor::{ActionOutcome, Executor};
pub use engine::{SyncEngine, SyncReport};
pub use config::{SyncConfig, ProviderConfig, RosterConfig};
pub use error::{Error, Result};
