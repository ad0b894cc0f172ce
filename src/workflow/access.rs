// Who may see or edit which stage
//
// Closed stages cascade to every participant read-only. Open stages are
// private to their owner. Admin sees everything as editable, but edits made
// from that view go through `TransitionEngine::amend` and are tagged as
// overrides in the history.

use serde::{Deserialize, Serialize};

use super::roles::Role;
use super::state::{OverallStatus, StageRecord, StageStatus, SubmissionId, WorkflowState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    Editable,
    ReadOnlyVisible,
    Hidden,
}

/// One stage as presented to a particular role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageView {
    pub role: Role,
    pub access: Access,
    /// Withheld entirely when the stage is hidden
    pub record: Option<StageRecord>,
    /// Editable only through an administrative override
    pub administrative: bool,
}

/// Everything a role is allowed to see of one submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyView {
    pub submission_id: SubmissionId,
    pub version: u64,
    pub overall_status: OverallStatus,
    pub acting_role: Role,
    pub stages: Vec<StageView>,
}

impl PolicyView {
    pub fn access_for(&self, role: Role) -> Option<Access> {
        self.stages
            .iter()
            .find(|view| view.role == role)
            .map(|view| view.access)
    }

    /// The stage the acting role may sign right now, if any
    pub fn editable_stage(&self) -> Option<&StageView> {
        self.stages
            .iter()
            .find(|view| view.access == Access::Editable && !view.administrative)
    }

    /// Closed stages visible to the acting role, in chain order
    pub fn previous_reviews(&self) -> impl Iterator<Item = &StageRecord> {
        self.stages
            .iter()
            .filter(|view| view.access == Access::ReadOnlyVisible)
            .filter_map(|view| view.record.as_ref())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AccessPolicy;

impl AccessPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Access decision for a single record
    pub fn access(&self, record: &StageRecord, acting_role: Role) -> Access {
        if acting_role.is_admin() {
            return Access::Editable;
        }
        match record.status {
            StageStatus::Completed | StageStatus::Rejected => Access::ReadOnlyVisible,
            StageStatus::Active if record.role == acting_role => Access::Editable,
            StageStatus::Active | StageStatus::Pending => Access::Hidden,
        }
    }

    pub fn resolve(&self, state: &WorkflowState, acting_role: Role) -> PolicyView {
        let stages = state
            .stages
            .iter()
            .map(|record| {
                let access = self.access(record, acting_role);
                StageView {
                    role: record.role,
                    access,
                    record: (access != Access::Hidden).then(|| record.clone()),
                    administrative: acting_role.is_admin(),
                }
            })
            .collect();

        PolicyView {
            submission_id: state.submission_id.clone(),
            version: state.version,
            overall_status: state.overall_status,
            acting_role,
            stages,
        }
    }
}
