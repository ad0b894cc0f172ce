use anyhow::Result;

use super::{with_coordinator, Command};
use crate::config::ReviewConfig;
use crate::workflow::{ActorId, Signoff, SubmissionId};

pub struct SubmitCommand {
    pub config: ReviewConfig,
    pub submission_id: SubmissionId,
    pub actor: ActorId,
    pub signoff: Option<Signoff>,
}

impl SubmitCommand {
    pub fn new(config: ReviewConfig, submission_id: &str, actor: &str) -> Self {
        Self {
            config,
            submission_id: SubmissionId::new(submission_id),
            actor: ActorId::new(actor),
            signoff: None,
        }
    }

    /// Sign the supervisor stage as part of filing
    pub fn with_signoff(mut self, signature: Option<String>, comments: Option<String>) -> Self {
        self.signoff = signature.map(|signature| Signoff {
            comments,
            signature: crate::workflow::Signature::new(signature),
        });
        self
    }
}

impl Command for SubmitCommand {
    async fn execute(&self) -> Result<()> {
        with_coordinator(&self.config, |coordinator| async move {
            let transition = coordinator
                .submit(
                    self.submission_id.clone(),
                    self.actor.clone(),
                    self.signoff.clone(),
                )
                .await?;
            println!(
                "📋 Submission {} entered review (version {})",
                transition.state.submission_id, transition.state.version
            );
            for role in &transition.activated {
                println!("   ➡️  Awaiting {role}");
            }
            Ok(())
        })
        .await
    }
}
