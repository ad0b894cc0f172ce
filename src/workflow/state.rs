// Per-submission workflow record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::roles::Role;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub String);

impl SubmissionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubmissionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Authenticated identity of whoever performed an action
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl PartialEq<str> for ActorId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque signature payload or a reference to a stored signature image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(String);

impl Signature {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    Active,
    Completed,
    Rejected,
}

impl StageStatus {
    /// Completed or rejected; the record is frozen for normal callers
    pub fn is_closed(&self) -> bool {
        matches!(self, StageStatus::Completed | StageStatus::Rejected)
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StageStatus::Pending => "pending",
            StageStatus::Active => "active",
            StageStatus::Completed => "completed",
            StageStatus::Rejected => "rejected",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    InProgress,
    Approved,
    Rejected,
}

impl OverallStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OverallStatus::InProgress)
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OverallStatus::InProgress => "in_progress",
            OverallStatus::Approved => "approved",
            OverallStatus::Rejected => "rejected",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    pub role: Role,
    pub status: StageStatus,
    pub comments: Option<String>,
    pub signature: Option<Signature>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<ActorId>,
}

impl StageRecord {
    pub fn pending(role: Role) -> Self {
        Self {
            role,
            status: StageStatus::Pending,
            comments: None,
            signature: None,
            completed_at: None,
            completed_by: None,
        }
    }

    pub(crate) fn clear_decision(&mut self) {
        self.comments = None;
        self.signature = None;
        self.completed_at = None;
        self.completed_by = None;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Completed,
    Rejected { reason: String },
    /// Administrative override: a closed stage was put back in play
    Reopened { previous: StageRecord },
    /// Administrative override: stage data edited outside the normal chain
    AdministrativeEdit { previous: StageRecord },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub at: DateTime<Utc>,
    pub actor: ActorId,
    pub acting_role: Role,
    pub stage: Role,
    /// Workflow version produced by this entry
    pub version: u64,
    #[serde(flatten)]
    pub action: AuditAction,
}

impl AuditEntry {
    pub fn is_override(&self) -> bool {
        matches!(
            self.action,
            AuditAction::Reopened { .. } | AuditAction::AdministrativeEdit { .. }
        )
    }
}

/// Review state of one submission. Mutated only by the transition engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub submission_id: SubmissionId,
    /// One record per stage role, in chain order
    pub stages: Vec<StageRecord>,
    pub overall_status: OverallStatus,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub history: Vec<AuditEntry>,
}

impl WorkflowState {
    pub(crate) fn fresh(submission_id: SubmissionId, at: DateTime<Utc>) -> Self {
        Self {
            submission_id,
            stages: Role::STAGES.iter().copied().map(StageRecord::pending).collect(),
            overall_status: OverallStatus::InProgress,
            version: 0,
            created_at: at,
            updated_at: at,
            history: Vec::new(),
        }
    }

    pub fn stage(&self, role: Role) -> Option<&StageRecord> {
        self.stages.iter().find(|record| record.role == role)
    }

    pub(crate) fn stage_mut(&mut self, role: Role) -> Option<&mut StageRecord> {
        self.stages.iter_mut().find(|record| record.role == role)
    }

    pub fn status_of(&self, role: Role) -> Option<StageStatus> {
        self.stage(role).map(|record| record.status)
    }

    pub fn active_roles(&self) -> Vec<Role> {
        self.stages
            .iter()
            .filter(|record| record.status == StageStatus::Active)
            .map(|record| record.role)
            .collect()
    }

    /// Closed stages in chain order ("previous reviews")
    pub fn closed_stages(&self) -> impl Iterator<Item = &StageRecord> {
        self.stages.iter().filter(|record| record.status.is_closed())
    }

    pub fn is_terminal(&self) -> bool {
        self.overall_status.is_terminal()
    }

    pub fn last_entry(&self) -> Option<&AuditEntry> {
        self.history.last()
    }
}
