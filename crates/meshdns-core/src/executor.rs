//! Applies planned actions through a [`ZoneProvider`]
//!
//! Actions run one at a time in plan order. The first failure stops the
//! run: already-applied actions stay in effect and the next run picks up
//! from whatever state the zone is in.

use tracing::info;

use crate::error::{Error, Result};
use crate::model::ZoneRecord;
use crate::reconcile::{Action, Plan};
use crate::traits::ZoneProvider;

/// What an applied action did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Record was created
    Created(ZoneRecord),
    /// Record content was replaced
    Updated {
        /// Record before the update
        previous: ZoneRecord,
        /// Record as returned by the provider
        current: ZoneRecord,
    },
    /// Record was removed
    Deleted(ZoneRecord),
}

/// Executes actions against one zone
pub struct Executor<'a> {
    provider: &'a dyn ZoneProvider,
    zone_id: &'a str,
}

impl<'a> Executor<'a> {
    /// Create an executor bound to a provider and zone
    pub fn new(provider: &'a dyn ZoneProvider, zone_id: &'a str) -> Self {
        Self { provider, zone_id }
    }

    /// Apply every action of the plan, stopping at the first failure
    pub async fn apply_all(&self, plan: &Plan) -> Result<Vec<ActionOutcome>> {
        let mut outcomes = Vec::with_capacity(plan.actions.len());
        for action in &plan.actions {
            outcomes.push(self.apply(action).await?);
        }
        Ok(outcomes)
    }

    /// Apply a single action
    ///
    /// Provider errors are reported as [`Error::ActionFailure`].
    pub async fn apply(&self, action: &Action) -> Result<ActionOutcome> {
        let fail = |e: Error| Error::action(action.verb(), action.record_name(), e.to_string());

        match action {
            Action::Create { draft, .. } => {
                let record = self
                    .provider
                    .create_record(self.zone_id, draft)
                    .await
                    .map_err(fail)?;
                info!("Created record: {} {}", record.name, record.content);
                Ok(ActionOutcome::Created(record))
            }
            Action::Update { existing, draft, .. } => {
                let record = self
                    .provider
                    .update_record(self.zone_id, &existing.id, draft)
                    .await
                    .map_err(fail)?;
                info!(
                    "Updated record: {} {} (was: {})",
                    record.name, record.content, existing.content
                );
                Ok(ActionOutcome::Updated {
                    previous: existing.clone(),
                    current: record,
                })
            }
            Action::Delete { record } => {
                self.provider
                    .delete_record(self.zone_id, &record.id)
                    .await
                    .map_err(fail)?;
                info!("Deleted record: {} {}", record.name, record.content);
                Ok(ActionOutcome::Deleted(record.clone()))
            }
        }
    }
}
