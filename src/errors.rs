use thiserror::Error;

use crate::store::StoreError;
use crate::workflow::{ErrorKind, TransitionError};

/// Failure of a guarded review action. Persisted state is untouched in
/// every case.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ReviewError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReviewError::Transition(e) => e.kind(),
            ReviewError::Store(StoreError::StaleWrite { .. }) => ErrorKind::StaleWrite,
            ReviewError::Store(_) => ErrorKind::Storage,
        }
    }

    /// Only stale writes clear up by re-reading and trying again
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::StaleWrite
    }
}
