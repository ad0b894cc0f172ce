// Review coordination: the request-level surface a web or CLI layer calls.
//
// Each action runs through the concurrency guard; once the new state is
// committed, newly active stages are handed to the notification dispatcher.

use std::sync::Arc;
use tracing::{warn, Instrument};

use crate::config::ReviewConfig;
use crate::errors::ReviewError;
use crate::notify::{Notification, NotificationDispatcher, RoleDirectory};
use crate::store::WorkflowStore;
use crate::telemetry::{create_review_span, generate_correlation_id};
use crate::workflow::{
    AccessPolicy, ActorId, ConcurrencyGuard, PolicyView, Role, Signature, Signoff, SubmissionId,
    Transition, TransitionEngine, TransitionError, WorkflowState,
};

/// A sign-off submitted by the owner of the active stage
#[derive(Debug, Clone)]
pub struct StageSubmission {
    pub acting_role: Role,
    pub actor: ActorId,
    pub comments: Option<String>,
    pub signature: Option<Signature>,
}

pub struct ReviewCoordinator {
    guard: ConcurrencyGuard,
    policy: AccessPolicy,
    dispatcher: Arc<dyn NotificationDispatcher>,
    directory: Arc<dyn RoleDirectory>,
    notifications_enabled: bool,
}

impl ReviewCoordinator {
    pub fn new(
        store: Arc<dyn WorkflowStore>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        directory: Arc<dyn RoleDirectory>,
    ) -> Self {
        Self {
            guard: ConcurrencyGuard::new(store),
            policy: AccessPolicy::new(),
            dispatcher,
            directory,
            notifications_enabled: true,
        }
    }

    pub fn with_config(mut self, config: &ReviewConfig) -> Self {
        self.guard = self.guard.with_max_retries(config.guard.max_retries);
        self.notifications_enabled = config.notifications.enabled;
        self
    }

    pub fn guard(&self) -> &ConcurrencyGuard {
        &self.guard
    }

    /// Open the review chain for a newly filed inspection
    pub async fn submit(
        &self,
        submission_id: SubmissionId,
        creator: ActorId,
        signoff: Option<Signoff>,
    ) -> Result<Transition, ReviewError> {
        let span = create_review_span(
            "submit",
            &submission_id,
            Some(Role::Supervisor),
            Some(&generate_correlation_id()),
        );
        async {
            let transition = self
                .guard
                .create(|engine| engine.create(submission_id.clone(), &creator, signoff))
                .await?;
            self.notify(&transition).await;
            Ok(transition)
        }
        .instrument(span)
        .await
    }

    pub async fn load(&self, submission_id: &SubmissionId) -> Result<WorkflowState, ReviewError> {
        Ok(self.guard.store().load(submission_id).await?)
    }

    /// Every stored submission, optionally narrowed to those waiting on `awaiting`
    pub async fn list(&self, awaiting: Option<Role>) -> Result<Vec<WorkflowState>, ReviewError> {
        let mut states = Vec::new();
        for submission_id in self.guard.store().list().await? {
            let state = self.load(&submission_id).await?;
            if awaiting.map_or(true, |role| state.active_roles().contains(&role)) {
                states.push(state);
            }
        }
        Ok(states)
    }

    /// Current state as the given role is allowed to see it
    pub async fn view(
        &self,
        submission_id: &SubmissionId,
        role: Role,
    ) -> Result<PolicyView, ReviewError> {
        let state = self.load(submission_id).await?;
        Ok(self.policy.resolve(&state, role))
    }

    /// Sign off the acting role's stage. With `expected_version` the write
    /// fails on any intervening change; without it the latest state is
    /// re-read on stale writes.
    pub async fn complete(
        &self,
        submission_id: &SubmissionId,
        expected_version: Option<u64>,
        submission: StageSubmission,
    ) -> Result<Transition, ReviewError> {
        let role = submission.acting_role;
        self.run("complete", submission_id, expected_version, role, move |engine, state| {
            engine.complete(
                state,
                submission.acting_role,
                submission.comments.clone(),
                submission.signature.clone(),
                &submission.actor,
            )
        })
        .await
    }

    pub async fn reject(
        &self,
        submission_id: &SubmissionId,
        expected_version: Option<u64>,
        acting_role: Role,
        actor: ActorId,
        reason: String,
    ) -> Result<Transition, ReviewError> {
        self.run("reject", submission_id, expected_version, acting_role, move |engine, state| {
            engine.reject(state, acting_role, &reason, &actor)
        })
        .await
    }

    /// Administrative override
    pub async fn reopen(
        &self,
        submission_id: &SubmissionId,
        expected_version: Option<u64>,
        acting_role: Role,
        stage: Role,
        actor: ActorId,
    ) -> Result<Transition, ReviewError> {
        self.run("reopen", submission_id, expected_version, acting_role, move |engine, state| {
            engine.reopen(state, acting_role, stage, &actor)
        })
        .await
    }

    /// Administrative override
    pub async fn amend(
        &self,
        submission_id: &SubmissionId,
        expected_version: Option<u64>,
        acting_role: Role,
        stage: Role,
        edit: StageSubmission,
    ) -> Result<Transition, ReviewError> {
        self.run("amend", submission_id, expected_version, acting_role, move |engine, state| {
            engine.amend(
                state,
                acting_role,
                stage,
                edit.comments.clone(),
                edit.signature.clone(),
                &edit.actor,
            )
        })
        .await
    }

    async fn run<F>(
        &self,
        operation: &str,
        submission_id: &SubmissionId,
        expected_version: Option<u64>,
        role: Role,
        op: F,
    ) -> Result<Transition, ReviewError>
    where
        F: Fn(&TransitionEngine, &WorkflowState) -> Result<Transition, TransitionError>,
    {
        let span = create_review_span(
            operation,
            submission_id,
            Some(role),
            Some(&generate_correlation_id()),
        );
        async {
            let transition = match expected_version {
                Some(version) => self.guard.apply(submission_id, version, op).await?,
                None => self.guard.apply_with_retry(submission_id, op).await?,
            };
            self.notify(&transition).await;
            Ok(transition)
        }
        .instrument(span)
        .await
    }

    /// Hand newly active stages to the dispatcher. The transition is
    /// already committed, so delivery failures are only logged.
    async fn notify(&self, transition: &Transition) {
        if !self.notifications_enabled {
            return;
        }
        for role in &transition.activated {
            let notification = Notification {
                submission_id: transition.state.submission_id.clone(),
                role: *role,
                recipients: self.directory.members(*role),
                version: transition.state.version,
            };
            if let Err(e) = self.dispatcher.dispatch(&notification).await {
                warn!(
                    submission_id = %notification.submission_id,
                    role = %role,
                    "Notification dispatch failed: {}",
                    e
                );
            }
        }
    }
}
