//! Profile Companion - guided interest selection and photo reporting
//!
//! A terminal companion for a community photo service:
//! - Pick the interests shown on your profile (saved locally and on your
//!   profile record)
//! - Report photos to the review team, with offline queueing when the
//!   backend is unreachable

mod api;
mod config;
mod flow;
mod idempotency;
mod interests;
mod prompts;
mod report;
mod services;
mod storage;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;

use crate::config::Config;

/// Profile Companion - manage your community profile from the terminal
#[derive(Parser)]
#[command(name = "profile-companion")]
#[command(author = "ProfileKit")]
#[command(version)]
#[command(about = "Pick profile interests and report photos for review")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Choose the interests shown on your profile (up to five)
    Interests,

    /// Report a photo for moderation review
    Report {
        /// URL of the photo being reported
        image_url: String,

        /// Account ID of the photo's owner
        subject_user_id: String,
    },

    /// Retry reports that were saved while offline
    Sync,

    /// List the reports you have sent
    Reports,

    /// Show or edit configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the active configuration and its location
    Show,

    /// Create a default config file if none exists
    Init,

    /// Set the account ID used on submissions
    SetUser {
        /// Your account ID
        user_id: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Interests => {
            let rt = tokio::runtime::Runtime::new()?;
            interests::cli::run_interests_flow(&rt)
        }
        Commands::Report {
            image_url,
            subject_user_id,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            report::cli::run_report_flow(&rt, &image_url, &subject_user_id)
        }
        Commands::Sync => {
            let rt = tokio::runtime::Runtime::new()?;
            report::cli::run_sync_flow(&rt)
        }
        Commands::Reports => report::cli::run_reports_list(),
        Commands::Config { action } => run_config_action(action),
    }
}

fn run_config_action(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = Config::load()?;
            let path = Config::config_path()?;
            println!("{} {}", "Config file:".bright_white(), path.display());
            println!(
                "{} {}",
                "API base URL:".bright_white(),
                config.api.base_url
            );
            println!(
                "{} {}",
                "Timeout (s):".bright_white(),
                config.api.timeout_seconds
            );
            println!(
                "{} {}",
                "Verify SSL:".bright_white(),
                config.api.verify_ssl
            );
            println!(
                "{} {}",
                "Account ID:".bright_white(),
                config.user.actor_id().unwrap_or("(not set)")
            );
            Ok(())
        }
        ConfigAction::Init => {
            Config::init()?;
            let path = Config::config_path()?;
            println!(
                "{}",
                format!("Config ready at {}", path.display()).bright_green()
            );
            Ok(())
        }
        ConfigAction::SetUser { user_id } => {
            let trimmed = user_id.trim();
            if trimmed.is_empty() {
                println!("{}", "Account ID cannot be empty.".bright_red());
                return Ok(());
            }
            let mut config = Config::load()?;
            config.user.user_id = Some(trimmed.to_string());
            config.save()?;
            println!(
                "{}",
                format!("Submissions will be made as {trimmed}.").bright_green()
            );
            Ok(())
        }
    }
}
