use anyhow::Result;

use super::sign::print_outcome;
use super::{with_coordinator, Command};
use crate::config::ReviewConfig;
use crate::coordinator::StageSubmission;
use crate::workflow::{ActorId, Role, Signature, SubmissionId};

pub struct ReopenCommand {
    pub config: ReviewConfig,
    pub submission_id: SubmissionId,
    pub expected_version: Option<u64>,
    pub role: Role,
    pub stage: Role,
    pub actor: ActorId,
}

impl ReopenCommand {
    pub fn new(config: ReviewConfig, submission_id: &str, role: Role, stage: Role, actor: &str) -> Self {
        Self {
            config,
            submission_id: SubmissionId::new(submission_id),
            expected_version: None,
            role,
            stage,
            actor: ActorId::new(actor),
        }
    }

    pub fn with_expected_version(mut self, version: Option<u64>) -> Self {
        self.expected_version = version;
        self
    }
}

impl Command for ReopenCommand {
    async fn execute(&self) -> Result<()> {
        with_coordinator(&self.config, |coordinator| async move {
            let transition = coordinator
                .reopen(
                    &self.submission_id,
                    self.expected_version,
                    self.role,
                    self.stage,
                    self.actor.clone(),
                )
                .await?;
            println!("⚠️  {} reopened by {} (administrative override)", self.stage, self.actor);
            print_outcome(&transition);
            Ok(())
        })
        .await
    }
}

pub struct AmendCommand {
    pub config: ReviewConfig,
    pub submission_id: SubmissionId,
    pub expected_version: Option<u64>,
    pub stage: Role,
    pub edit: StageSubmission,
}

impl AmendCommand {
    pub fn new(config: ReviewConfig, submission_id: &str, role: Role, stage: Role, actor: &str) -> Self {
        Self {
            config,
            submission_id: SubmissionId::new(submission_id),
            expected_version: None,
            stage,
            edit: StageSubmission {
                acting_role: role,
                actor: ActorId::new(actor),
                comments: None,
                signature: None,
            },
        }
    }

    pub fn with_changes(mut self, comments: Option<String>, signature: Option<String>) -> Self {
        self.edit.comments = comments;
        self.edit.signature = signature.map(Signature::new);
        self
    }

    pub fn with_expected_version(mut self, version: Option<u64>) -> Self {
        self.expected_version = version;
        self
    }
}

impl Command for AmendCommand {
    async fn execute(&self) -> Result<()> {
        with_coordinator(&self.config, |coordinator| async move {
            let transition = coordinator
                .amend(
                    &self.submission_id,
                    self.expected_version,
                    self.edit.acting_role,
                    self.stage,
                    self.edit.clone(),
                )
                .await?;
            println!("⚠️  {} amended by {} (administrative override)", self.stage, self.edit.actor);
            print_outcome(&transition);
            Ok(())
        })
        .await
    }
}
