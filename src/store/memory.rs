use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::{StoreError, WorkflowStore};
use crate::workflow::{SubmissionId, WorkflowState};

/// Process-local store. The compare and the swap happen under one lock.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    states: Mutex<HashMap<SubmissionId, WorkflowState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkflowStore for InMemoryStore {
    async fn insert(&self, state: &WorkflowState) -> Result<(), StoreError> {
        let mut states = self.states.lock().await;
        if states.contains_key(&state.submission_id) {
            return Err(StoreError::AlreadyExists(state.submission_id.clone()));
        }
        states.insert(state.submission_id.clone(), state.clone());
        Ok(())
    }

    async fn load(&self, submission_id: &SubmissionId) -> Result<WorkflowState, StoreError> {
        self.states
            .lock()
            .await
            .get(submission_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(submission_id.clone()))
    }

    async fn save(&self, state: &WorkflowState, expected_version: u64) -> Result<(), StoreError> {
        let mut states = self.states.lock().await;
        let stored = states
            .get_mut(&state.submission_id)
            .ok_or_else(|| StoreError::NotFound(state.submission_id.clone()))?;
        if stored.version != expected_version {
            return Err(StoreError::StaleWrite {
                submission_id: state.submission_id.clone(),
                expected: expected_version,
                found: stored.version,
            });
        }
        *stored = state.clone();
        Ok(())
    }

    async fn list(&self) -> Result<Vec<SubmissionId>, StoreError> {
        let mut ids: Vec<SubmissionId> = self.states.lock().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
