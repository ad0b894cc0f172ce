// Review workflow engine: role graph, per-submission state, transitions,
// access policy and the optimistic concurrency guard.

pub mod access;
pub mod engine;
pub mod errors;
pub mod guard;
pub mod roles;
pub mod state;

pub use access::{Access, AccessPolicy, PolicyView, StageView};
pub use engine::{Signoff, Transition, TransitionEngine};
pub use errors::{ErrorKind, TransitionError};
pub use guard::ConcurrencyGuard;
pub use roles::{Role, RoleGraph, StageSpec, UnknownRole};
pub use state::{
    ActorId, AuditAction, AuditEntry, OverallStatus, Signature, StageRecord, StageStatus,
    SubmissionId, WorkflowState,
};
