use anyhow::Result;
use clap::Parser;

use inspection_review::cli::commands::admin::{AmendCommand, ReopenCommand};
use inspection_review::cli::commands::show::{HistoryCommand, ListCommand, ShowCommand};
use inspection_review::cli::commands::sign::{CompleteCommand, RejectCommand};
use inspection_review::cli::commands::submit::SubmitCommand;
use inspection_review::cli::commands::Command;
use inspection_review::cli::{Cli, Commands};
use inspection_review::{config, init_telemetry, review_metrics, shutdown_telemetry};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config()?.clone();
    init_telemetry(&config.observability)?;

    let result = tokio::runtime::Runtime::new()?.block_on(async {
        match cli.command {
            Commands::Create {
                id,
                actor,
                signature,
                comments,
            } => {
                SubmitCommand::new(config, &id, &actor)
                    .with_signoff(signature, comments)
                    .execute()
                    .await
            }
            Commands::Show { id, role } => ShowCommand::new(config, &id, role).execute().await,
            Commands::List { awaiting } => ListCommand::new(config, awaiting).execute().await,
            Commands::History { id } => HistoryCommand::new(config, &id).execute().await,
            Commands::Complete {
                id,
                role,
                actor,
                signature,
                comments,
                expected_version,
            } => {
                CompleteCommand::new(config, &id, role, &actor, signature)
                    .with_comments(comments)
                    .with_expected_version(expected_version)
                    .execute()
                    .await
            }
            Commands::Reject {
                id,
                role,
                actor,
                reason,
                expected_version,
            } => {
                RejectCommand::new(config, &id, role, &actor, reason)
                    .with_expected_version(expected_version)
                    .execute()
                    .await
            }
            Commands::Reopen {
                id,
                stage,
                role,
                actor,
                expected_version,
            } => {
                ReopenCommand::new(config, &id, role, stage, &actor)
                    .with_expected_version(expected_version)
                    .execute()
                    .await
            }
            Commands::Amend {
                id,
                stage,
                role,
                actor,
                signature,
                comments,
                expected_version,
            } => {
                AmendCommand::new(config, &id, role, stage, &actor)
                    .with_changes(comments, signature)
                    .with_expected_version(expected_version)
                    .execute()
                    .await
            }
        }
    });

    review_metrics().log_stats();
    shutdown_telemetry();
    result
}
