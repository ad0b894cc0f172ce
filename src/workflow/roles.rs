// Review chain roles and the fixed stage topology
//
// supervisor -> operations_manager -> {business_development, procurement} -> general_manager

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Participant kinds. Declaration order is chain order, so `Ord` sorts
/// stages the way reports render them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Supervisor,
    OperationsManager,
    BusinessDevelopment,
    Procurement,
    GeneralManager,
    /// Cross-cutting role; owns no stage of its own.
    Admin,
}

impl Role {
    /// Every role that owns a stage, in chain order
    pub const STAGES: [Role; 5] = [
        Role::Supervisor,
        Role::OperationsManager,
        Role::BusinessDevelopment,
        Role::Procurement,
        Role::GeneralManager,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Supervisor => "supervisor",
            Role::OperationsManager => "operations_manager",
            Role::BusinessDevelopment => "business_development",
            Role::Procurement => "procurement",
            Role::GeneralManager => "general_manager",
            Role::Admin => "admin",
        }
    }

    pub fn is_stage(&self) -> bool {
        !matches!(self, Role::Admin)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    /// Accepts the canonical snake_case name as well as designation strings
    /// such as "Operations Manager" or "general-manager".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '-' => '_',
                other => other.to_ascii_lowercase(),
            })
            .collect();

        match normalized.as_str() {
            "supervisor" => Ok(Role::Supervisor),
            "operations_manager" => Ok(Role::OperationsManager),
            "business_development" => Ok(Role::BusinessDevelopment),
            "procurement" => Ok(Role::Procurement),
            "general_manager" => Ok(Role::GeneralManager),
            "admin" => Ok(Role::Admin),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

/// Static description of one position in the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSpec {
    pub role: Role,
    pub predecessors: &'static [Role],
    /// Member of a parallel branch that shares its predecessor with a sibling
    pub fan_out_branch: bool,
}

static CHAIN: [StageSpec; 5] = [
    StageSpec {
        role: Role::Supervisor,
        predecessors: &[],
        fan_out_branch: false,
    },
    StageSpec {
        role: Role::OperationsManager,
        predecessors: &[Role::Supervisor],
        fan_out_branch: false,
    },
    StageSpec {
        role: Role::BusinessDevelopment,
        predecessors: &[Role::OperationsManager],
        fan_out_branch: true,
    },
    StageSpec {
        role: Role::Procurement,
        predecessors: &[Role::OperationsManager],
        fan_out_branch: true,
    },
    StageSpec {
        role: Role::GeneralManager,
        predecessors: &[Role::BusinessDevelopment, Role::Procurement],
        fan_out_branch: false,
    },
];

/// Read-only queries over the fixed chain. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleGraph;

impl RoleGraph {
    /// Full stage list in chain order, used for rendering previous reviews
    pub fn stages() -> &'static [StageSpec] {
        &CHAIN
    }

    pub fn spec(role: Role) -> Option<&'static StageSpec> {
        CHAIN.iter().find(|spec| spec.role == role)
    }

    pub fn predecessors(role: Role) -> BTreeSet<Role> {
        Self::spec(role)
            .map(|spec| spec.predecessors.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn successors(role: Role) -> BTreeSet<Role> {
        CHAIN
            .iter()
            .filter(|spec| spec.predecessors.contains(&role))
            .map(|spec| spec.role)
            .collect()
    }

    /// True only for the stage whose successors run in parallel
    pub fn is_fork_point(role: Role) -> bool {
        Self::successors(role).len() > 1
    }

    /// True only for the stage that waits on more than one predecessor
    pub fn is_join_point(role: Role) -> bool {
        Self::predecessors(role).len() > 1
    }

    /// Every stage that must be completed before `role` may become active
    pub fn ancestors(role: Role) -> BTreeSet<Role> {
        let mut found = BTreeSet::new();
        let mut frontier: Vec<Role> = Self::predecessors(role).into_iter().collect();
        while let Some(next) = frontier.pop() {
            if found.insert(next) {
                frontier.extend(Self::predecessors(next));
            }
        }
        found
    }

    /// Every stage reachable after `role`
    pub fn descendants(role: Role) -> BTreeSet<Role> {
        let mut found = BTreeSet::new();
        let mut frontier: Vec<Role> = Self::successors(role).into_iter().collect();
        while let Some(next) = frontier.pop() {
            if found.insert(next) {
                frontier.extend(Self::successors(next));
            }
        }
        found
    }

    /// Parallel branch members sharing `role`'s predecessors
    pub fn siblings(role: Role) -> BTreeSet<Role> {
        let Some(spec) = Self::spec(role) else {
            return BTreeSet::new();
        };
        if !spec.fan_out_branch {
            return BTreeSet::new();
        }
        CHAIN
            .iter()
            .filter(|other| {
                other.role != role && other.fan_out_branch && other.predecessors == spec.predecessors
            })
            .map(|other| other.role)
            .collect()
    }
}
