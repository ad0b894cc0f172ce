//! Shared helpers for review chain integration tests

#![allow(dead_code)]

use std::sync::Arc;

use inspection_review::{
    ActorId, ConcurrencyGuard, InMemoryStore, Role, Signature, SubmissionId, Transition,
    TransitionEngine, TransitionError, WorkflowState, WorkflowStore,
};

pub fn actor_for(role: Role) -> ActorId {
    ActorId::new(format!("{}-user", role.as_str()))
}

/// A sign-off closure suitable for `ConcurrencyGuard::apply*`
pub fn sign_as(
    role: Role,
    signature: &str,
) -> impl Fn(&TransitionEngine, &WorkflowState) -> Result<Transition, TransitionError> + Send + Sync + 'static
{
    let signature = signature.to_string();
    move |engine, state| {
        engine.complete(
            state,
            role,
            Some(format!("{} reviewed", role.as_str())),
            Some(Signature::new(signature.clone())),
            &actor_for(role),
        )
    }
}

pub fn reject_as(
    role: Role,
    reason: &str,
) -> impl Fn(&TransitionEngine, &WorkflowState) -> Result<Transition, TransitionError> + Send + Sync + 'static
{
    let reason = reason.to_string();
    move |engine, state| engine.reject(state, role, &reason, &actor_for(role))
}

/// Guard over a fresh in-memory store holding one new submission
pub async fn guard_with_submission(id: &str) -> (ConcurrencyGuard, SubmissionId) {
    let store: Arc<dyn WorkflowStore> = Arc::new(InMemoryStore::new());
    let guard = ConcurrencyGuard::new(store);
    let submission_id = SubmissionId::from(id);
    guard
        .create(|engine| engine.create(submission_id.clone(), &actor_for(Role::Supervisor), None))
        .await
        .expect("submission created");
    (guard, submission_id)
}

/// Drive a submission until both parallel branches are active
pub async fn advance_to_fork(guard: &ConcurrencyGuard, id: &SubmissionId) -> WorkflowState {
    guard
        .apply_with_retry(id, sign_as(Role::Supervisor, "S1"))
        .await
        .expect("supervisor signs");
    guard
        .apply_with_retry(id, sign_as(Role::OperationsManager, "S2"))
        .await
        .expect("operations manager signs")
        .state
}
