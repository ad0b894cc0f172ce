// Persistence collaborator for workflow state
//
// `save` is a compare-and-swap on `version`: it only succeeds when the
// stored record is still at the version the caller read.

pub mod file;
pub mod memory;
#[cfg(feature = "database")]
pub mod sqlite;

use async_trait::async_trait;
use thiserror::Error;

use crate::workflow::{SubmissionId, WorkflowState};

pub use file::FileStore;
pub use memory::InMemoryStore;
#[cfg(feature = "database")]
pub use sqlite::SqliteStore;

/// Errors that can occur while loading or saving workflow state
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Stale write on {submission_id}: expected version {expected}, found {found}")]
    StaleWrite {
        submission_id: SubmissionId,
        expected: u64,
        found: u64,
    },

    #[error("Submission {0} not found")]
    NotFound(SubmissionId),

    #[error("Submission {0} already exists")]
    AlreadyExists(SubmissionId),

    #[error("Invalid submission id '{0}'")]
    InvalidSubmissionId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Lock acquisition failed: {reason}")]
    Lock { reason: String },

    #[cfg(feature = "database")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn is_stale_write(&self) -> bool {
        matches!(self, StoreError::StaleWrite { .. })
    }
}

#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Persist a newly created submission
    async fn insert(&self, state: &WorkflowState) -> Result<(), StoreError>;

    async fn load(&self, submission_id: &SubmissionId) -> Result<WorkflowState, StoreError>;

    /// Atomically replace the stored state if it is still at
    /// `expected_version`; otherwise fail with `StaleWrite`.
    async fn save(&self, state: &WorkflowState, expected_version: u64) -> Result<(), StoreError>;

    async fn list(&self) -> Result<Vec<SubmissionId>, StoreError>;
}
