// Collaborators outside the engine: who fills a role, and how they hear
// that a stage is waiting on them. The engine itself sends nothing.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};

#[cfg(test)]
use mockall::automock;

use crate::workflow::{ActorId, Role, SubmissionId};

/// A stage that just became active, with the people who should act on it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub submission_id: SubmissionId,
    pub role: Role,
    pub recipients: Vec<ActorId>,
    pub version: u64,
}

/// Delivery channel for stage activations (email, push, ...)
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, notification: &Notification) -> Result<()>;
}

/// Dispatcher that only records the hand-off in the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDispatcher;

#[async_trait]
impl NotificationDispatcher for LogDispatcher {
    async fn dispatch(&self, notification: &Notification) -> Result<()> {
        info!(
            submission_id = %notification.submission_id,
            role = %notification.role,
            recipients = ?notification.recipients,
            version = notification.version,
            "Stage awaiting review"
        );
        Ok(())
    }
}

/// Maps a role to the user accounts that may fill it
#[cfg_attr(test, automock)]
pub trait RoleDirectory: Send + Sync {
    /// Members in preference order
    fn members(&self, role: Role) -> Vec<ActorId>;

    /// The first account holding the role, if any
    fn first_available(&self, role: Role) -> Option<ActorId> {
        self.members(role).into_iter().next()
    }
}

/// Directory built from static configuration
#[derive(Debug, Default, Clone)]
pub struct StaticRoleDirectory {
    members: HashMap<Role, Vec<ActorId>>,
}

impl StaticRoleDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_member(mut self, role: Role, actor: impl Into<String>) -> Self {
        self.members
            .entry(role)
            .or_default()
            .push(ActorId::new(actor));
        self
    }

    /// Build from the `[directory]` config table. Unknown role names are
    /// skipped with a warning.
    pub fn from_config(entries: &HashMap<String, Vec<String>>) -> Self {
        let mut directory = Self::new();
        for (name, actors) in entries {
            match name.parse::<Role>() {
                Ok(role) => {
                    for actor in actors {
                        directory = directory.with_member(role, actor.clone());
                    }
                }
                Err(e) => warn!(role = %name, "Ignoring directory entry: {}", e),
            }
        }
        directory
    }
}

impl RoleDirectory for StaticRoleDirectory {
    fn members(&self, role: Role) -> Vec<ActorId> {
        self.members.get(&role).cloned().unwrap_or_default()
    }
}
