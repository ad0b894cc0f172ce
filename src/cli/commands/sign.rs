use anyhow::Result;

use super::{with_coordinator, Command};
use crate::config::ReviewConfig;
use crate::coordinator::StageSubmission;
use crate::workflow::{ActorId, Role, Signature, SubmissionId, Transition};

pub struct CompleteCommand {
    pub config: ReviewConfig,
    pub submission_id: SubmissionId,
    pub expected_version: Option<u64>,
    pub submission: StageSubmission,
}

impl CompleteCommand {
    pub fn new(
        config: ReviewConfig,
        submission_id: &str,
        role: Role,
        actor: &str,
        signature: String,
    ) -> Self {
        Self {
            config,
            submission_id: SubmissionId::new(submission_id),
            expected_version: None,
            submission: StageSubmission {
                acting_role: role,
                actor: ActorId::new(actor),
                comments: None,
                signature: Some(Signature::new(signature)),
            },
        }
    }

    pub fn with_comments(mut self, comments: Option<String>) -> Self {
        self.submission.comments = comments;
        self
    }

    pub fn with_expected_version(mut self, version: Option<u64>) -> Self {
        self.expected_version = version;
        self
    }
}

impl Command for CompleteCommand {
    async fn execute(&self) -> Result<()> {
        with_coordinator(&self.config, |coordinator| async move {
            let transition = coordinator
                .complete(
                    &self.submission_id,
                    self.expected_version,
                    self.submission.clone(),
                )
                .await?;
            println!("✅ {} signed off", self.submission.acting_role);
            print_outcome(&transition);
            Ok(())
        })
        .await
    }
}

pub struct RejectCommand {
    pub config: ReviewConfig,
    pub submission_id: SubmissionId,
    pub expected_version: Option<u64>,
    pub role: Role,
    pub actor: ActorId,
    pub reason: String,
}

impl RejectCommand {
    pub fn new(config: ReviewConfig, submission_id: &str, role: Role, actor: &str, reason: String) -> Self {
        Self {
            config,
            submission_id: SubmissionId::new(submission_id),
            expected_version: None,
            role,
            actor: ActorId::new(actor),
            reason,
        }
    }

    pub fn with_expected_version(mut self, version: Option<u64>) -> Self {
        self.expected_version = version;
        self
    }
}

impl Command for RejectCommand {
    async fn execute(&self) -> Result<()> {
        with_coordinator(&self.config, |coordinator| async move {
            let transition = coordinator
                .reject(
                    &self.submission_id,
                    self.expected_version,
                    self.role,
                    self.actor.clone(),
                    self.reason.clone(),
                )
                .await?;
            println!("❌ {} rejected the report: {}", self.role, self.reason);
            print_outcome(&transition);
            Ok(())
        })
        .await
    }
}

pub(crate) fn print_outcome(transition: &Transition) {
    println!(
        "   📋 {} is now {} (version {})",
        transition.state.submission_id, transition.state.overall_status, transition.state.version
    );
    for role in &transition.activated {
        println!("   ➡️  Awaiting {role}");
    }
}
