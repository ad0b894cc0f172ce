//! End-to-end behaviour of the review chain
//!
//! Covers the reference scenarios: fresh submission, first sign-off,
//! fork into parallel branches, join waiting on both branches, and
//! rejection terminating the chain.

use inspection_review::{
    Access, AccessPolicy, ErrorKind, OverallStatus, Role, Signature, StageStatus, TransitionEngine,
    TransitionError,
};

mod fixtures;
use fixtures::*;

#[tokio::test]
async fn scenario_a_fresh_submission_has_only_supervisor_active() {
    let (guard, id) = guard_with_submission("INSP-A").await;
    let state = guard.store().load(&id).await.unwrap();

    assert_eq!(state.active_roles(), vec![Role::Supervisor]);
    for role in Role::STAGES.iter().skip(1) {
        assert_eq!(state.status_of(*role), Some(StageStatus::Pending));
    }

    let policy = AccessPolicy::new();
    for viewer in Role::STAGES.iter().skip(1) {
        let view = policy.resolve(&state, *viewer);
        assert!(
            view.stages.iter().all(|s| s.access == Access::Hidden),
            "{viewer} should see nothing yet"
        );
    }
}

#[tokio::test]
async fn scenario_b_supervisor_signoff_activates_operations() {
    let (guard, id) = guard_with_submission("INSP-B").await;
    let transition = guard
        .apply(&id, 1, sign_as(Role::Supervisor, "S1"))
        .await
        .unwrap();

    assert_eq!(transition.activated, vec![Role::OperationsManager]);
    let policy = AccessPolicy::new();
    for viewer in Role::STAGES {
        let view = policy.resolve(&transition.state, viewer);
        assert_eq!(view.access_for(Role::Supervisor), Some(Access::ReadOnlyVisible));
    }
}

#[tokio::test]
async fn scenario_c_operations_signoff_forks_both_branches() {
    let (guard, id) = guard_with_submission("INSP-C").await;
    let state = advance_to_fork(&guard, &id).await;

    assert_eq!(
        state.active_roles(),
        vec![Role::BusinessDevelopment, Role::Procurement]
    );
    assert_eq!(state.status_of(Role::GeneralManager), Some(StageStatus::Pending));
}

#[tokio::test]
async fn scenario_d_join_waits_for_procurement() {
    let (guard, id) = guard_with_submission("INSP-D").await;
    advance_to_fork(&guard, &id).await;

    let after_bd = guard
        .apply_with_retry(&id, sign_as(Role::BusinessDevelopment, "S3"))
        .await
        .unwrap();
    assert!(after_bd.activated.is_empty());
    assert_eq!(
        after_bd.state.status_of(Role::GeneralManager),
        Some(StageStatus::Pending)
    );

    let after_proc = guard
        .apply_with_retry(&id, sign_as(Role::Procurement, "S4"))
        .await
        .unwrap();
    assert_eq!(after_proc.activated, vec![Role::GeneralManager]);

    let done = guard
        .apply_with_retry(&id, sign_as(Role::GeneralManager, "S5"))
        .await
        .unwrap();
    assert_eq!(done.state.overall_status, OverallStatus::Approved);
}

#[tokio::test]
async fn scenario_e_rejection_terminates_chain() {
    let (guard, id) = guard_with_submission("INSP-E").await;
    advance_to_fork(&guard, &id).await;

    let rejected = guard
        .apply_with_retry(&id, reject_as(Role::Procurement, "budget"))
        .await
        .unwrap();
    assert_eq!(rejected.state.overall_status, OverallStatus::Rejected);
    assert_eq!(
        rejected.state.stage(Role::Procurement).unwrap().comments.as_deref(),
        Some("budget")
    );

    let err = guard
        .apply_with_retry(&id, sign_as(Role::BusinessDevelopment, "S3"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidStage);

    let stored = guard.store().load(&id).await.unwrap();
    assert_ne!(stored.status_of(Role::GeneralManager), Some(StageStatus::Active));
    assert_eq!(stored.version, rejected.state.version);
}

#[tokio::test]
async fn closed_stages_are_never_overwritten_by_normal_calls() {
    let (guard, id) = guard_with_submission("INSP-IMM").await;
    let state = advance_to_fork(&guard, &id).await;
    let engine = TransitionEngine::new();

    for role in [Role::Supervisor, Role::OperationsManager] {
        let before = state.stage(role).unwrap().clone();
        assert!(matches!(
            engine.complete(&state, role, None, Some(Signature::new("again")), &actor_for(role)),
            Err(TransitionError::InvalidStage { .. })
        ));
        assert!(matches!(
            engine.reject(&state, role, "changed my mind", &actor_for(role)),
            Err(TransitionError::InvalidStage { .. })
        ));
        assert_eq!(state.stage(role).unwrap(), &before);
    }
}

#[tokio::test]
async fn visibility_only_grows_through_normal_flow() {
    let (guard, id) = guard_with_submission("INSP-VIS").await;
    let policy = AccessPolicy::new();
    let steps = [
        sign_as(Role::Supervisor, "S1"),
        sign_as(Role::OperationsManager, "S2"),
        sign_as(Role::Procurement, "S3"),
        sign_as(Role::BusinessDevelopment, "S4"),
        sign_as(Role::GeneralManager, "S5"),
    ];

    let mut visible_before: Vec<Role> = Vec::new();
    for step in steps {
        let state = guard.apply_with_retry(&id, step).await.unwrap().state;
        let view = policy.resolve(&state, Role::Supervisor);
        let visible: Vec<Role> = view
            .stages
            .iter()
            .filter(|s| s.access == Access::ReadOnlyVisible)
            .map(|s| s.role)
            .collect();
        assert!(visible_before.iter().all(|r| visible.contains(r)));
        visible_before = visible;
    }
    assert_eq!(visible_before.len(), 5);
}

#[tokio::test]
async fn admin_reopen_is_audited_as_override() {
    let (guard, id) = guard_with_submission("INSP-ADM").await;
    advance_to_fork(&guard, &id).await;
    guard
        .apply_with_retry(&id, reject_as(Role::Procurement, "budget"))
        .await
        .unwrap();

    let reopened = guard
        .apply_with_retry(&id, |engine, state| {
            engine.reopen(state, Role::Admin, Role::Procurement, &actor_for(Role::Admin))
        })
        .await
        .unwrap();
    assert_eq!(reopened.state.overall_status, OverallStatus::InProgress);

    let overrides: Vec<_> = reopened
        .state
        .history
        .iter()
        .filter(|entry| entry.is_override())
        .collect();
    assert_eq!(overrides.len(), 1);
    assert_eq!(overrides[0].stage, Role::Procurement);

    let finished = guard
        .apply_with_retry(&id, sign_as(Role::Procurement, "S4"))
        .await
        .unwrap();
    assert_eq!(
        finished.state.status_of(Role::BusinessDevelopment),
        Some(StageStatus::Active)
    );
}
