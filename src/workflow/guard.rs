// Optimistic concurrency around engine transitions
//
// load -> check version -> apply -> compare-and-swap save. The activation
// check for a join stage therefore always runs against the state that is
// actually being replaced, never against an older read.

use std::sync::Arc;
use tracing::{debug, warn};

use super::engine::{Transition, TransitionEngine};
use super::errors::TransitionError;
use super::state::{SubmissionId, WorkflowState};
use crate::errors::ReviewError;
use crate::observability::{review_metrics, OperationTimer};
use crate::store::{StoreError, WorkflowStore};

pub const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Clone)]
pub struct ConcurrencyGuard {
    store: Arc<dyn WorkflowStore>,
    engine: TransitionEngine,
    max_retries: u32,
}

impl ConcurrencyGuard {
    pub fn new(store: Arc<dyn WorkflowStore>) -> Self {
        Self {
            store,
            engine: TransitionEngine::new(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn store(&self) -> &Arc<dyn WorkflowStore> {
        &self.store
    }

    pub fn engine(&self) -> &TransitionEngine {
        &self.engine
    }

    /// Persist the initial state of a new submission
    pub async fn create<F>(&self, op: F) -> Result<Transition, ReviewError>
    where
        F: FnOnce(&TransitionEngine) -> Result<Transition, TransitionError>,
    {
        let transition = op(&self.engine)?;
        self.store.insert(&transition.state).await?;
        Ok(transition)
    }

    /// Apply `op` against the stored state, which must still be at
    /// `expected_version`. Fails with `StaleWrite` if anyone got there first.
    pub async fn apply<F>(
        &self,
        submission_id: &SubmissionId,
        expected_version: u64,
        op: F,
    ) -> Result<Transition, ReviewError>
    where
        F: FnOnce(&TransitionEngine, &WorkflowState) -> Result<Transition, TransitionError>,
    {
        let timer = OperationTimer::new("guarded_transition");
        let current = self.store.load(submission_id).await?;
        if current.version != expected_version {
            review_metrics().record_stale_write();
            warn!(
                submission_id = %submission_id,
                expected = expected_version,
                found = current.version,
                "Rejected write against stale version"
            );
            return Err(StoreError::StaleWrite {
                submission_id: submission_id.clone(),
                expected: expected_version,
                found: current.version,
            }
            .into());
        }

        let result = self.commit(&current, op).await;
        timer.finish();
        result
    }

    /// Re-read and re-apply `op` until it lands or `max_retries` stale
    /// writes have been absorbed. Validation errors are never retried.
    pub async fn apply_with_retry<F>(
        &self,
        submission_id: &SubmissionId,
        op: F,
    ) -> Result<Transition, ReviewError>
    where
        F: Fn(&TransitionEngine, &WorkflowState) -> Result<Transition, TransitionError>,
    {
        let mut attempt = 0;
        loop {
            let current = self.store.load(submission_id).await?;
            match self.commit(&current, &op).await {
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    review_metrics().record_retry();
                    debug!(
                        submission_id = %submission_id,
                        attempt,
                        "Retrying transition after stale write"
                    );
                }
                other => return other,
            }
        }
    }

    async fn commit<F>(&self, current: &WorkflowState, op: F) -> Result<Transition, ReviewError>
    where
        F: FnOnce(&TransitionEngine, &WorkflowState) -> Result<Transition, TransitionError>,
    {
        let transition = op(&self.engine, current)?;
        if let Err(e) = self.store.save(&transition.state, current.version).await {
            if e.is_stale_write() {
                review_metrics().record_stale_write();
            }
            return Err(e.into());
        }
        if let Some(entry) = transition.entry() {
            review_metrics().record_action(&entry.action);
        }
        Ok(transition)
    }
}
