use anyhow::Result;

use super::{with_coordinator, Command};
use crate::config::ReviewConfig;
use crate::workflow::{Access, AuditAction, PolicyView, Role, SubmissionId};

pub struct ShowCommand {
    pub config: ReviewConfig,
    pub submission_id: SubmissionId,
    pub role: Role,
}

impl ShowCommand {
    pub fn new(config: ReviewConfig, submission_id: &str, role: Role) -> Self {
        Self {
            config,
            submission_id: SubmissionId::new(submission_id),
            role,
        }
    }
}

impl Command for ShowCommand {
    async fn execute(&self) -> Result<()> {
        with_coordinator(&self.config, |coordinator| async move {
            let view = coordinator.view(&self.submission_id, self.role).await?;
            print_view(&view);
            Ok(())
        })
        .await
    }
}

fn print_view(view: &PolicyView) {
    println!(
        "📋 Submission {} (version {}, {}) as {}",
        view.submission_id, view.version, view.overall_status, view.acting_role
    );
    for stage in &view.stages {
        match (&stage.access, &stage.record) {
            (Access::Hidden, _) | (_, None) => {
                println!("   🔒 {:<22} hidden", stage.role.as_str());
            }
            (access, Some(record)) => {
                let marker = match access {
                    Access::Editable if stage.administrative => "🛠️ ",
                    Access::Editable => "✏️ ",
                    _ => "👁️ ",
                };
                println!("   {} {:<22} {}", marker, stage.role.as_str(), record.status);
                if let Some(comments) = &record.comments {
                    println!("      💬 {comments}");
                }
                if let (Some(by), Some(at)) = (&record.completed_by, &record.completed_at) {
                    println!("      ✍️  {} at {}", by, at.to_rfc3339());
                }
            }
        }
    }
}

pub struct HistoryCommand {
    pub config: ReviewConfig,
    pub submission_id: SubmissionId,
}

impl HistoryCommand {
    pub fn new(config: ReviewConfig, submission_id: &str) -> Self {
        Self {
            config,
            submission_id: SubmissionId::new(submission_id),
        }
    }
}

impl Command for HistoryCommand {
    async fn execute(&self) -> Result<()> {
        with_coordinator(&self.config, |coordinator| async move {
            let state = coordinator.load(&self.submission_id).await?;
            println!("📜 History of {}", state.submission_id);
            for entry in &state.history {
                let what = match &entry.action {
                    AuditAction::Created => "created".to_string(),
                    AuditAction::Completed => "signed".to_string(),
                    AuditAction::Rejected { reason } => format!("rejected: {reason}"),
                    AuditAction::Reopened { previous } => {
                        format!("REOPENED (was {})", previous.status)
                    }
                    AuditAction::AdministrativeEdit { .. } => "ADMIN EDIT".to_string(),
                };
                let flag = if entry.is_override() { "⚠️ " } else { "  " };
                println!(
                    "{} v{:<3} {} {:<22} by {} ({}) {}",
                    flag,
                    entry.version,
                    entry.at.to_rfc3339(),
                    entry.stage.as_str(),
                    entry.actor,
                    entry.acting_role,
                    what
                );
            }
            Ok(())
        })
        .await
    }
}

pub struct ListCommand {
    pub config: ReviewConfig,
    pub awaiting: Option<Role>,
}

impl ListCommand {
    pub fn new(config: ReviewConfig, awaiting: Option<Role>) -> Self {
        Self { config, awaiting }
    }
}

impl Command for ListCommand {
    async fn execute(&self) -> Result<()> {
        with_coordinator(&self.config, |coordinator| async move {
            let states = coordinator.list(self.awaiting).await?;
            if states.is_empty() {
                println!("📭 No submissions");
                return Ok(());
            }
            for state in &states {
                let active = state.active_roles();
                let awaiting: Vec<&str> = active.iter().map(|r| r.as_str()).collect();
                println!(
                    "📋 {:<20} v{:<3} {:<12} {}",
                    state.submission_id.as_str(),
                    state.version,
                    state.overall_status.to_string(),
                    awaiting.join(", ")
                );
            }
            Ok(())
        })
        .await
    }
}
