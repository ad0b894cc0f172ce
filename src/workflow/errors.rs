use thiserror::Error;

use super::roles::Role;
use super::state::{OverallStatus, StageStatus};

/// Validation failures raised by the transition engine. None of these leave
/// a partially applied state behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Stage {role} is {status} while the workflow is {overall}; only an active stage can act")]
    InvalidStage {
        role: Role,
        status: StageStatus,
        overall: OverallStatus,
    },

    #[error("Stage {role} cannot be completed without a signature")]
    MissingSignature { role: Role },

    #[error("Role {role} is not allowed to {action}")]
    Forbidden { role: Role, action: &'static str },

    #[error("Role {0} does not own a stage in the review chain")]
    NotAStage(Role),
}

/// Caller-facing classification of workflow failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidStage,
    MissingSignature,
    Forbidden,
    StaleWrite,
    Storage,
}

impl TransitionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransitionError::InvalidStage { .. } => ErrorKind::InvalidStage,
            TransitionError::MissingSignature { .. } => ErrorKind::MissingSignature,
            TransitionError::Forbidden { .. } | TransitionError::NotAStage(_) => {
                ErrorKind::Forbidden
            }
        }
    }
}
