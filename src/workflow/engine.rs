// Transition engine for the review chain
//
// Every operation takes the current state by reference and returns a new
// state with `version + 1`. The input is never touched, so a failed call
// leaves nothing half-applied.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::errors::TransitionError;
use super::roles::{Role, RoleGraph};
use super::state::{
    ActorId, AuditAction, AuditEntry, OverallStatus, Signature, StageStatus, SubmissionId,
    WorkflowState,
};

/// Signature and comments supplied when a stage is signed off
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signoff {
    pub comments: Option<String>,
    pub signature: Signature,
}

impl Signoff {
    pub fn new(signature: impl Into<String>) -> Self {
        Self {
            comments: None,
            signature: Signature::new(signature),
        }
    }

    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.comments = Some(comments.into());
        self
    }
}

/// Result of an applied transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: WorkflowState,
    /// Stages that became active because of this transition
    pub activated: Vec<Role>,
}

impl Transition {
    pub fn entry(&self) -> Option<&AuditEntry> {
        self.state.last_entry()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionEngine;

impl TransitionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Start the chain for a new submission. The supervisor stage is active
    /// immediately, or already completed when the creator signs at
    /// submission time.
    pub fn create(
        &self,
        submission_id: SubmissionId,
        creator: &ActorId,
        signoff: Option<Signoff>,
    ) -> Result<Transition, TransitionError> {
        let now = Utc::now();
        let mut state = WorkflowState::fresh(submission_id, now);
        let activated = settle(&mut state);
        record(
            &mut state,
            now,
            creator,
            Role::Supervisor,
            Role::Supervisor,
            AuditAction::Created,
        );

        info!(
            submission_id = %state.submission_id,
            actor = %creator,
            version = state.version,
            "Inspection submission entered review"
        );

        match signoff {
            Some(signoff) => self.complete(
                &state,
                Role::Supervisor,
                signoff.comments,
                Some(signoff.signature),
                creator,
            ),
            None => Ok(Transition { state, activated }),
        }
    }

    /// Sign off the acting role's stage and activate every successor whose
    /// predecessors are now all completed.
    pub fn complete(
        &self,
        state: &WorkflowState,
        acting_role: Role,
        comments: Option<String>,
        signature: Option<Signature>,
        actor: &ActorId,
    ) -> Result<Transition, TransitionError> {
        require_active(state, acting_role, "complete a stage")?;
        let signature = signature
            .filter(|sig| !sig.is_blank())
            .ok_or(TransitionError::MissingSignature { role: acting_role })?;

        let now = Utc::now();
        let mut next = state.clone();
        let stage = next
            .stage_mut(acting_role)
            .ok_or(TransitionError::NotAStage(acting_role))?;
        stage.status = StageStatus::Completed;
        stage.comments = non_empty(comments);
        stage.signature = Some(signature);
        stage.completed_at = Some(now);
        stage.completed_by = Some(actor.clone());

        let activated = settle(&mut next);
        if next
            .stages
            .iter()
            .all(|record| record.status == StageStatus::Completed)
        {
            next.overall_status = OverallStatus::Approved;
        }
        record(
            &mut next,
            now,
            actor,
            acting_role,
            acting_role,
            AuditAction::Completed,
        );

        info!(
            submission_id = %next.submission_id,
            role = %acting_role,
            actor = %actor,
            version = next.version,
            activated = ?activated,
            overall_status = %next.overall_status,
            "Stage signed off"
        );

        Ok(Transition {
            state: next,
            activated,
        })
    }

    /// Reject the document at the acting role's stage. Rejection ends the
    /// whole workflow; nothing downstream is ever activated afterwards.
    pub fn reject(
        &self,
        state: &WorkflowState,
        acting_role: Role,
        reason: &str,
        actor: &ActorId,
    ) -> Result<Transition, TransitionError> {
        require_active(state, acting_role, "reject a stage")?;

        let now = Utc::now();
        let mut next = state.clone();
        let stage = next
            .stage_mut(acting_role)
            .ok_or(TransitionError::NotAStage(acting_role))?;
        stage.status = StageStatus::Rejected;
        stage.comments = non_empty(Some(reason.to_string()));
        stage.signature = None;
        stage.completed_at = Some(now);
        stage.completed_by = Some(actor.clone());

        // A parallel sibling that was still open can no longer proceed
        for sibling in RoleGraph::siblings(acting_role) {
            if let Some(other) = next.stage_mut(sibling) {
                if other.status == StageStatus::Active {
                    other.status = StageStatus::Pending;
                }
            }
        }
        next.overall_status = OverallStatus::Rejected;
        record(
            &mut next,
            now,
            actor,
            acting_role,
            acting_role,
            AuditAction::Rejected {
                reason: reason.to_string(),
            },
        );

        info!(
            submission_id = %next.submission_id,
            role = %acting_role,
            actor = %actor,
            version = next.version,
            reason = %reason,
            "Stage rejected, workflow terminated"
        );

        Ok(Transition {
            state: next,
            activated: Vec::new(),
        })
    }

    /// Administrative override: put a closed stage back in play. Later
    /// stages that were still open drop back to pending until the reopened
    /// stage is signed again; completed later stages are kept. Reopening a
    /// rejected workflow withdraws every rejection, so the chain can run to
    /// approval again.
    pub fn reopen(
        &self,
        state: &WorkflowState,
        acting_role: Role,
        stage: Role,
        actor: &ActorId,
    ) -> Result<Transition, TransitionError> {
        if !acting_role.is_admin() {
            return Err(TransitionError::Forbidden {
                role: acting_role,
                action: "reopen a stage",
            });
        }
        let current = state.stage(stage).ok_or(TransitionError::NotAStage(stage))?;
        let upstream_open = RoleGraph::ancestors(stage)
            .into_iter()
            .any(|role| state.status_of(role) != Some(StageStatus::Completed));
        if !current.status.is_closed() || upstream_open {
            return Err(TransitionError::InvalidStage {
                role: stage,
                status: current.status,
                overall: state.overall_status,
            });
        }

        let now = Utc::now();
        let previous = current.clone();
        let mut next = state.clone();
        let target = next
            .stage_mut(stage)
            .ok_or(TransitionError::NotAStage(stage))?;
        target.status = StageStatus::Active;
        target.clear_decision();
        for later in RoleGraph::descendants(stage) {
            if let Some(record) = next.stage_mut(later) {
                if record.status == StageStatus::Active {
                    record.status = StageStatus::Pending;
                }
            }
        }
        for record in next.stages.iter_mut() {
            if record.status == StageStatus::Rejected {
                record.status = StageStatus::Pending;
                record.clear_decision();
            }
        }
        next.overall_status = OverallStatus::InProgress;

        let mut activated = vec![stage];
        activated.extend(settle(&mut next));
        record(
            &mut next,
            now,
            actor,
            acting_role,
            stage,
            AuditAction::Reopened {
                previous: previous.clone(),
            },
        );

        warn!(
            submission_id = %next.submission_id,
            stage = %stage,
            actor = %actor,
            previous_status = %previous.status,
            version = next.version,
            admin_override = true,
            "Stage reopened by administrator"
        );

        Ok(Transition {
            state: next,
            activated,
        })
    }

    /// Administrative override: edit a stage's comments and/or signature
    /// without moving it through the chain. Only a completed stage carries
    /// a signature, so signatures can be corrected but never added to an
    /// open or rejected stage.
    pub fn amend(
        &self,
        state: &WorkflowState,
        acting_role: Role,
        stage: Role,
        comments: Option<String>,
        signature: Option<Signature>,
        actor: &ActorId,
    ) -> Result<Transition, TransitionError> {
        if !acting_role.is_admin() {
            return Err(TransitionError::Forbidden {
                role: acting_role,
                action: "amend another stage",
            });
        }
        let current = state.stage(stage).ok_or(TransitionError::NotAStage(stage))?;
        if state.is_terminal() {
            return Err(TransitionError::InvalidStage {
                role: stage,
                status: current.status,
                overall: state.overall_status,
            });
        }
        if signature.as_ref().is_some_and(Signature::is_blank) {
            return Err(TransitionError::MissingSignature { role: stage });
        }
        if signature.is_some() && current.status != StageStatus::Completed {
            return Err(TransitionError::InvalidStage {
                role: stage,
                status: current.status,
                overall: state.overall_status,
            });
        }

        let now = Utc::now();
        let previous = current.clone();
        let mut next = state.clone();
        let target = next
            .stage_mut(stage)
            .ok_or(TransitionError::NotAStage(stage))?;
        if let Some(comments) = comments {
            target.comments = non_empty(Some(comments));
        }
        if let Some(signature) = signature {
            target.signature = Some(signature);
        }
        record(
            &mut next,
            now,
            actor,
            acting_role,
            stage,
            AuditAction::AdministrativeEdit { previous },
        );

        warn!(
            submission_id = %next.submission_id,
            stage = %stage,
            actor = %actor,
            version = next.version,
            admin_override = true,
            "Stage amended by administrator"
        );

        Ok(Transition {
            state: next,
            activated: Vec::new(),
        })
    }
}

fn require_active(
    state: &WorkflowState,
    acting_role: Role,
    action: &'static str,
) -> Result<(), TransitionError> {
    if acting_role.is_admin() {
        return Err(TransitionError::Forbidden {
            role: acting_role,
            action,
        });
    }
    let stage = state
        .stage(acting_role)
        .ok_or(TransitionError::NotAStage(acting_role))?;
    if state.is_terminal() || stage.status != StageStatus::Active {
        return Err(TransitionError::InvalidStage {
            role: acting_role,
            status: stage.status,
            overall: state.overall_status,
        });
    }
    Ok(())
}

/// Recompute activation across the chain. A stage is ready once every
/// stage before it is completed. Pending stages that are ready become
/// active; active stages that are no longer ready fall back to pending.
/// Returns the stages that were activated.
fn settle(state: &mut WorkflowState) -> Vec<Role> {
    let completed: Vec<Role> = state
        .stages
        .iter()
        .filter(|record| record.status == StageStatus::Completed)
        .map(|record| record.role)
        .collect();

    let mut activated = Vec::new();
    for record in state.stages.iter_mut() {
        let ready = RoleGraph::ancestors(record.role)
            .iter()
            .all(|role| completed.contains(role));
        match record.status {
            StageStatus::Pending if ready => {
                record.status = StageStatus::Active;
                activated.push(record.role);
            }
            StageStatus::Active if !ready => record.status = StageStatus::Pending,
            _ => {}
        }
    }
    activated
}

fn record(
    state: &mut WorkflowState,
    at: DateTime<Utc>,
    actor: &ActorId,
    acting_role: Role,
    stage: Role,
    action: AuditAction,
) {
    state.version += 1;
    state.updated_at = at;
    state.history.push(AuditEntry {
        at,
        actor: actor.clone(),
        acting_role,
        stage,
        version: state.version,
        action,
    });
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(name: &str) -> ActorId {
        ActorId::new(name)
    }

    fn sig(value: &str) -> Option<Signature> {
        Some(Signature::new(value))
    }

    fn fresh() -> WorkflowState {
        TransitionEngine::new()
            .create(SubmissionId::from("INSP-100"), &actor("sam"), None)
            .unwrap()
            .state
    }

    fn through_operations_manager() -> WorkflowState {
        let engine = TransitionEngine::new();
        let state = fresh();
        let state = engine
            .complete(&state, Role::Supervisor, None, sig("S1"), &actor("sam"))
            .unwrap()
            .state;
        engine
            .complete(&state, Role::OperationsManager, None, sig("S2"), &actor("olga"))
            .unwrap()
            .state
    }

    #[test]
    fn test_create_activates_supervisor() {
        let transition = TransitionEngine::new()
            .create(SubmissionId::from("INSP-1"), &actor("sam"), None)
            .unwrap();
        assert_eq!(transition.activated, vec![Role::Supervisor]);
        assert_eq!(transition.state.active_roles(), vec![Role::Supervisor]);
        assert_eq!(transition.state.version, 1);
        assert_eq!(transition.state.history.len(), 1);
        assert_eq!(transition.state.history[0].action, AuditAction::Created);
    }

    #[test]
    fn test_create_with_signoff_completes_supervisor() {
        let transition = TransitionEngine::new()
            .create(
                SubmissionId::from("INSP-2"),
                &actor("sam"),
                Some(Signoff::new("S1").with_comments("site clean")),
            )
            .unwrap();
        let state = &transition.state;
        assert_eq!(state.status_of(Role::Supervisor), Some(StageStatus::Completed));
        assert_eq!(transition.activated, vec![Role::OperationsManager]);
        assert_eq!(state.version, 2);
        assert_eq!(
            state.stage(Role::Supervisor).unwrap().comments.as_deref(),
            Some("site clean")
        );
    }

    #[test]
    fn test_complete_records_signoff() {
        let engine = TransitionEngine::new();
        let state = fresh();
        let transition = engine
            .complete(
                &state,
                Role::Supervisor,
                Some("all good".to_string()),
                sig("S1"),
                &actor("sam"),
            )
            .unwrap();
        let record = transition.state.stage(Role::Supervisor).unwrap();
        assert_eq!(record.status, StageStatus::Completed);
        assert_eq!(record.signature, Some(Signature::new("S1")));
        assert_eq!(record.completed_by, Some(actor("sam")));
        assert!(record.completed_at.is_some());
        assert_eq!(transition.activated, vec![Role::OperationsManager]);
        assert_eq!(transition.state.version, state.version + 1);
        // input untouched
        assert_eq!(state.status_of(Role::Supervisor), Some(StageStatus::Active));
    }

    #[test]
    fn test_complete_requires_signature() {
        let engine = TransitionEngine::new();
        let state = fresh();
        for missing in [None, sig(""), sig("  ")] {
            let err = engine
                .complete(&state, Role::Supervisor, None, missing, &actor("sam"))
                .unwrap_err();
            assert_eq!(err, TransitionError::MissingSignature { role: Role::Supervisor });
        }
    }

    #[test]
    fn test_complete_out_of_turn_is_invalid() {
        let engine = TransitionEngine::new();
        let state = fresh();
        let err = engine
            .complete(&state, Role::GeneralManager, None, sig("G"), &actor("gina"))
            .unwrap_err();
        assert!(matches!(
            err,
            TransitionError::InvalidStage { role: Role::GeneralManager, status: StageStatus::Pending, .. }
        ));
    }

    #[test]
    fn test_complete_twice_is_invalid() {
        let engine = TransitionEngine::new();
        let state = fresh();
        let state = engine
            .complete(&state, Role::Supervisor, None, sig("S1"), &actor("sam"))
            .unwrap()
            .state;
        let err = engine
            .complete(&state, Role::Supervisor, None, sig("S1"), &actor("sam"))
            .unwrap_err();
        assert!(matches!(
            err,
            TransitionError::InvalidStage { status: StageStatus::Completed, .. }
        ));
    }

    #[test]
    fn test_admin_cannot_use_normal_path() {
        let engine = TransitionEngine::new();
        let state = fresh();
        assert!(matches!(
            engine.complete(&state, Role::Admin, None, sig("A"), &actor("root")),
            Err(TransitionError::Forbidden { role: Role::Admin, .. })
        ));
        assert!(matches!(
            engine.reject(&state, Role::Admin, "no", &actor("root")),
            Err(TransitionError::Forbidden { role: Role::Admin, .. })
        ));
    }

    #[test]
    fn test_fork_activates_both_branches() {
        let state = through_operations_manager();
        assert_eq!(
            state.active_roles(),
            vec![Role::BusinessDevelopment, Role::Procurement]
        );
        assert_eq!(state.status_of(Role::GeneralManager), Some(StageStatus::Pending));
    }

    #[test]
    fn test_join_waits_for_both_branches() {
        let engine = TransitionEngine::new();
        let state = through_operations_manager();
        let after_bd = engine
            .complete(&state, Role::BusinessDevelopment, None, sig("S3"), &actor("bea"))
            .unwrap();
        assert!(after_bd.activated.is_empty());
        assert_eq!(
            after_bd.state.status_of(Role::GeneralManager),
            Some(StageStatus::Pending)
        );

        let after_proc = engine
            .complete(&after_bd.state, Role::Procurement, None, sig("S4"), &actor("pia"))
            .unwrap();
        assert_eq!(after_proc.activated, vec![Role::GeneralManager]);
    }

    #[test]
    fn test_final_signoff_approves() {
        let engine = TransitionEngine::new();
        let mut state = through_operations_manager();
        for role in [Role::BusinessDevelopment, Role::Procurement, Role::GeneralManager] {
            state = engine
                .complete(&state, role, None, sig("ok"), &actor("x"))
                .unwrap()
                .state;
        }
        assert_eq!(state.overall_status, OverallStatus::Approved);
        assert!(state.active_roles().is_empty());
        assert_eq!(state.version, 6);
    }

    #[test]
    fn test_reject_terminates_and_parks_sibling() {
        let engine = TransitionEngine::new();
        let state = through_operations_manager();
        let rejected = engine
            .reject(&state, Role::Procurement, "budget", &actor("pia"))
            .unwrap()
            .state;
        assert_eq!(rejected.overall_status, OverallStatus::Rejected);
        let record = rejected.stage(Role::Procurement).unwrap();
        assert_eq!(record.status, StageStatus::Rejected);
        assert_eq!(record.comments.as_deref(), Some("budget"));
        assert_eq!(
            rejected.status_of(Role::BusinessDevelopment),
            Some(StageStatus::Pending)
        );
        assert!(rejected.active_roles().is_empty());

        let err = engine
            .complete(&rejected, Role::BusinessDevelopment, None, sig("S3"), &actor("bea"))
            .unwrap_err();
        assert!(matches!(
            err,
            TransitionError::InvalidStage { overall: OverallStatus::Rejected, .. }
        ));
    }

    #[test]
    fn test_reopen_requires_admin() {
        let engine = TransitionEngine::new();
        let state = through_operations_manager();
        let err = engine
            .reopen(&state, Role::OperationsManager, Role::OperationsManager, &actor("olga"))
            .unwrap_err();
        assert!(matches!(err, TransitionError::Forbidden { .. }));
    }

    #[test]
    fn test_reopen_rejected_stage_restores_progress() {
        let engine = TransitionEngine::new();
        let state = through_operations_manager();
        let rejected = engine
            .reject(&state, Role::Procurement, "budget", &actor("pia"))
            .unwrap()
            .state;

        let reopened = engine
            .reopen(&rejected, Role::Admin, Role::Procurement, &actor("root"))
            .unwrap();
        let state = &reopened.state;
        assert_eq!(state.overall_status, OverallStatus::InProgress);
        let record = state.stage(Role::Procurement).unwrap();
        assert_eq!(record.status, StageStatus::Active);
        assert!(record.comments.is_none());
        assert!(record.completed_by.is_none());
        assert_eq!(
            reopened.activated,
            vec![Role::Procurement, Role::BusinessDevelopment]
        );
        assert!(reopened.entry().unwrap().is_override());
    }

    #[test]
    fn test_reopen_parks_open_downstream_stages() {
        let engine = TransitionEngine::new();
        let state = through_operations_manager();
        let reopened = engine
            .reopen(&state, Role::Admin, Role::OperationsManager, &actor("root"))
            .unwrap()
            .state;
        assert_eq!(reopened.active_roles(), vec![Role::OperationsManager]);
        assert_eq!(
            reopened.status_of(Role::BusinessDevelopment),
            Some(StageStatus::Pending)
        );
    }

    #[test]
    fn test_reopen_keeps_completed_downstream() {
        let engine = TransitionEngine::new();
        let state = through_operations_manager();
        let state = engine
            .complete(&state, Role::BusinessDevelopment, None, sig("S3"), &actor("bea"))
            .unwrap()
            .state;
        let reopened = engine
            .reopen(&state, Role::Admin, Role::OperationsManager, &actor("root"))
            .unwrap()
            .state;
        assert_eq!(
            reopened.status_of(Role::BusinessDevelopment),
            Some(StageStatus::Completed)
        );
        assert_eq!(reopened.status_of(Role::Procurement), Some(StageStatus::Pending));

        let resigned = engine
            .complete(&reopened, Role::OperationsManager, None, sig("S2b"), &actor("olga"))
            .unwrap();
        assert_eq!(resigned.activated, vec![Role::Procurement]);
    }

    #[test]
    fn test_reopen_open_stage_is_invalid() {
        let engine = TransitionEngine::new();
        let state = fresh();
        let err = engine
            .reopen(&state, Role::Admin, Role::Supervisor, &actor("root"))
            .unwrap_err();
        assert!(matches!(err, TransitionError::InvalidStage { .. }));
        let err = engine
            .reopen(&state, Role::Admin, Role::Admin, &actor("root"))
            .unwrap_err();
        assert_eq!(err, TransitionError::NotAStage(Role::Admin));
    }

    #[test]
    fn test_reopen_below_open_ancestor_is_invalid() {
        let engine = TransitionEngine::new();
        let state = through_operations_manager();
        let state = engine
            .reopen(&state, Role::Admin, Role::Supervisor, &actor("root"))
            .unwrap()
            .state;
        let err = engine
            .reopen(&state, Role::Admin, Role::OperationsManager, &actor("root"))
            .unwrap_err();
        assert!(matches!(err, TransitionError::InvalidStage { .. }));
        assert_eq!(state.active_roles(), vec![Role::Supervisor]);
    }

    #[test]
    fn test_amend_is_tagged_and_keeps_status() {
        let engine = TransitionEngine::new();
        let state = through_operations_manager();
        let amended = engine
            .amend(
                &state,
                Role::Admin,
                Role::Supervisor,
                Some("typo fixed".to_string()),
                None,
                &actor("root"),
            )
            .unwrap();
        let record = amended.state.stage(Role::Supervisor).unwrap();
        assert_eq!(record.status, StageStatus::Completed);
        assert_eq!(record.comments.as_deref(), Some("typo fixed"));
        assert_eq!(record.signature, Some(Signature::new("S1")));
        let entry = amended.entry().unwrap();
        assert!(entry.is_override());
        assert_eq!(entry.acting_role, Role::Admin);
        assert!(matches!(entry.action, AuditAction::AdministrativeEdit { .. }));
    }

    #[test]
    fn test_amend_rejects_non_admin_and_terminal() {
        let engine = TransitionEngine::new();
        let state = through_operations_manager();
        assert!(matches!(
            engine.amend(&state, Role::GeneralManager, Role::Supervisor, None, None, &actor("g")),
            Err(TransitionError::Forbidden { .. })
        ));
        let rejected = engine
            .reject(&state, Role::Procurement, "budget", &actor("pia"))
            .unwrap()
            .state;
        assert!(matches!(
            engine.amend(&rejected, Role::Admin, Role::Procurement, Some("x".into()), None, &actor("root")),
            Err(TransitionError::InvalidStage { .. })
        ));
    }

    fn approved() -> WorkflowState {
        let engine = TransitionEngine::new();
        let mut state = through_operations_manager();
        for role in [Role::BusinessDevelopment, Role::Procurement, Role::GeneralManager] {
            state = engine
                .complete(&state, role, None, sig("ok"), &actor("x"))
                .unwrap()
                .state;
        }
        state
    }

    #[test]
    fn test_resigning_reopened_upstream_stage_approves_again() {
        let engine = TransitionEngine::new();
        let reopened = engine
            .reopen(&approved(), Role::Admin, Role::Supervisor, &actor("root"))
            .unwrap()
            .state;
        assert_eq!(reopened.overall_status, OverallStatus::InProgress);
        assert_eq!(reopened.active_roles(), vec![Role::Supervisor]);

        let resigned = engine
            .complete(&reopened, Role::Supervisor, None, sig("S1b"), &actor("sam"))
            .unwrap()
            .state;
        assert_eq!(resigned.overall_status, OverallStatus::Approved);
        assert!(resigned.active_roles().is_empty());
    }

    #[test]
    fn test_reopen_upstream_of_rejection_withdraws_it() {
        let engine = TransitionEngine::new();
        let rejected = engine
            .reject(&through_operations_manager(), Role::Procurement, "budget", &actor("pia"))
            .unwrap()
            .state;

        let reopened = engine
            .reopen(&rejected, Role::Admin, Role::Supervisor, &actor("root"))
            .unwrap()
            .state;
        let withdrawn = reopened.stage(Role::Procurement).unwrap();
        assert_eq!(withdrawn.status, StageStatus::Pending);
        assert!(withdrawn.comments.is_none());
        assert!(withdrawn.completed_by.is_none());
        assert_eq!(reopened.active_roles(), vec![Role::Supervisor]);

        let mut state = reopened;
        for role in [
            Role::Supervisor,
            Role::BusinessDevelopment,
            Role::Procurement,
            Role::GeneralManager,
        ] {
            assert!(!state.active_roles().is_empty());
            state = engine
                .complete(&state, role, None, sig("again"), &actor("x"))
                .unwrap()
                .state;
        }
        assert_eq!(state.overall_status, OverallStatus::Approved);
    }

    #[test]
    fn test_amend_cannot_sign_open_stage() {
        let engine = TransitionEngine::new();
        let state = through_operations_manager();
        for open in [Role::Procurement, Role::GeneralManager] {
            let err = engine
                .amend(&state, Role::Admin, open, None, sig("forged"), &actor("root"))
                .unwrap_err();
            assert!(matches!(err, TransitionError::InvalidStage { role, .. } if role == open));
        }

        // comments on an open stage are still editable
        let amended = engine
            .amend(
                &state,
                Role::Admin,
                Role::Procurement,
                Some("see attached quote".to_string()),
                None,
                &actor("root"),
            )
            .unwrap();
        let record = amended.state.stage(Role::Procurement).unwrap();
        assert_eq!(record.status, StageStatus::Active);
        assert!(record.signature.is_none());

        let corrected = engine
            .amend(&state, Role::Admin, Role::Supervisor, None, sig("S1-fixed"), &actor("root"))
            .unwrap();
        assert_eq!(
            corrected.state.stage(Role::Supervisor).unwrap().signature,
            sig("S1-fixed")
        );
    }
}
