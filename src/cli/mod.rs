use clap::{Parser, Subcommand};

use crate::workflow::Role;

pub mod commands;

#[derive(Parser)]
#[command(name = "inspection-review")]
#[command(about = "Route inspection reports through the reviewer sign-off chain")]
#[command(long_about = "Moves an inspection report from supervisor through operations, \
                       business development and procurement to the general manager. \
                       Each reviewer signs once; closed stages are visible to everyone.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// File a new inspection report and open its review chain
    Create {
        /// Submission identifier
        #[arg(long)]
        id: String,
        /// Supervisor filing the report
        #[arg(long)]
        actor: String,
        /// Sign the supervisor stage immediately
        #[arg(long, help = "Supervisor signature; signs the first stage at submission time")]
        signature: Option<String>,
        #[arg(long)]
        comments: Option<String>,
    },
    /// Show a submission as a given role is allowed to see it
    Show {
        #[arg(long)]
        id: String,
        /// Role viewing the submission
        #[arg(long)]
        role: Role,
    },
    /// List stored submissions with their status
    List {
        /// Only submissions with an active stage for this role
        #[arg(long)]
        awaiting: Option<Role>,
    },
    /// Print the audit history of a submission
    History {
        #[arg(long)]
        id: String,
    },
    /// Sign off the acting role's active stage
    Complete {
        #[arg(long)]
        id: String,
        #[arg(long)]
        role: Role,
        #[arg(long)]
        actor: String,
        #[arg(long)]
        signature: String,
        #[arg(long)]
        comments: Option<String>,
        /// Version last read; the write fails if the submission moved on
        #[arg(long)]
        expected_version: Option<u64>,
    },
    /// Reject the document at the acting role's active stage
    Reject {
        #[arg(long)]
        id: String,
        #[arg(long)]
        role: Role,
        #[arg(long)]
        actor: String,
        #[arg(long)]
        reason: String,
        #[arg(long)]
        expected_version: Option<u64>,
    },
    /// Put a closed stage back in play (admin override)
    Reopen {
        #[arg(long)]
        id: String,
        /// Stage to reopen
        #[arg(long)]
        stage: Role,
        #[arg(long, default_value = "admin")]
        role: Role,
        #[arg(long)]
        actor: String,
        #[arg(long)]
        expected_version: Option<u64>,
    },
    /// Edit a stage's comments or signature (admin override)
    Amend {
        #[arg(long)]
        id: String,
        #[arg(long)]
        stage: Role,
        #[arg(long, default_value = "admin")]
        role: Role,
        #[arg(long)]
        actor: String,
        #[arg(long)]
        signature: Option<String>,
        #[arg(long)]
        comments: Option<String>,
        #[arg(long)]
        expected_version: Option<u64>,
    },
}
