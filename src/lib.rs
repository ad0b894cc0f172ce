// Inspection review library
// Sign-off chain engine for inspection reports plus the storage,
// notification and configuration plumbing around it.

pub mod cli;
pub mod config;
pub mod coordinator;
pub mod errors;
pub mod notify;
pub mod observability;
pub mod store;
pub mod telemetry;
pub mod workflow;

// Re-export key types for easy access
pub use config::{config, init_config, ReviewConfig};
pub use coordinator::{ReviewCoordinator, StageSubmission};
pub use errors::ReviewError;
pub use notify::{LogDispatcher, Notification, NotificationDispatcher, RoleDirectory, StaticRoleDirectory};
pub use observability::{review_metrics, OperationTimer, ReviewMetrics};
pub use store::{FileStore, InMemoryStore, StoreError, WorkflowStore};
pub use telemetry::{create_review_span, generate_correlation_id, init_telemetry, shutdown_telemetry};
pub use workflow::{
    Access, AccessPolicy, ActorId, AuditAction, AuditEntry, ConcurrencyGuard, ErrorKind,
    OverallStatus, PolicyView, Role, RoleGraph, Signature, Signoff, StageRecord, StageStatus,
    SubmissionId, Transition, TransitionEngine, TransitionError, WorkflowState,
};
