use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;

use crate::api::ApiClient;
use crate::config::Config;
use crate::flow::selection::{SelectionSet, ToggleOutcome};
use crate::flow::{FlowEvent, SubmissionFlow, SubmissionResult};
use crate::interests::catalog::{find_interest, INTEREST_CATALOG};
use crate::interests::{self, ProfileRecordSubmitter, MAX_INTERESTS};
use crate::prompts::prompt_line;
use crate::services::{NoRefresh, RecordStore};
use crate::storage::LocalStorage;

const SUCCESS_MESSAGE: &str = "Interests saved.";

pub(crate) fn run_interests_flow(rt: &tokio::runtime::Runtime) -> Result<()> {
    let config = Config::load()?;
    let Some(user_id) = config.user.actor_id().map(str::to_string) else {
        println!(
            "{}",
            "No account ID configured. Run `profile-companion config set-user <id>` first."
                .bright_red()
        );
        return Ok(());
    };

    let storage = Arc::new(LocalStorage::new()?);
    let mut selection = interests::load_saved_selection(&*storage);

    println!();
    println!("{}", "Your interests".bright_cyan().bold());
    println!(
        "  {}",
        format!("Pick up to {MAX_INTERESTS}. They are shown on your profile.").bright_black()
    );

    loop {
        println!();
        render_catalog(&selection);
        println!(
            "  {}",
            format!(
                "Selected ({}/{}): {}",
                selection.len(),
                selection.limit(),
                if selection.is_empty() {
                    "none".to_string()
                } else {
                    selection.items().join(", ")
                }
            )
            .bright_white()
        );
        if selection.is_full() {
            println!(
                "  {}",
                "Selection is full. Toggle one off to make room.".bright_black()
            );
        }

        let input = prompt_line("Toggle a number or name, s to save, q to cancel: ")?;
        match input.as_str() {
            "q" | "Q" => {
                println!("{}", "Cancelled. Nothing was saved.".bright_yellow());
                return Ok(());
            }
            "s" | "S" => break,
            other => {
                let name = match other.parse::<usize>() {
                    Ok(n) if n >= 1 && n <= INTEREST_CATALOG.len() => {
                        Some(INTEREST_CATALOG[n - 1].name)
                    }
                    Ok(_) => None,
                    Err(_) => find_interest(other).map(|entry| entry.name),
                };
                match name {
                    Some(name) => match selection.toggle(name) {
                        ToggleOutcome::Added | ToggleOutcome::Removed => {}
                        ToggleOutcome::LimitReached => {
                            println!(
                                "{}",
                                format!(
                                    "You can pick at most {MAX_INTERESTS} interests. Remove one first."
                                )
                                .bright_yellow()
                            );
                        }
                    },
                    None => println!("{}", "Invalid choice. Try again.".bright_red()),
                }
            }
        }
    }

    println!();
    println!("{}", "Saving interests...".bright_cyan());

    let api = Arc::new(ApiClient::new());
    let result = rt.block_on(save_and_watch(&user_id, &selection, api));

    if result.is_ok() {
        // Local copy only after the profile record took the write.
        interests::persist_selection(&*storage, &selection)?;
    }
    Ok(())
}

async fn save_and_watch(
    user_id: &str,
    selection: &SelectionSet,
    store: Arc<dyn RecordStore>,
) -> SubmissionResult {
    let submitter = Arc::new(ProfileRecordSubmitter::new(store));
    let (flow, mut events) = SubmissionFlow::new(submitter, Arc::new(NoRefresh), SUCCESS_MESSAGE);

    let result = flow
        .submit(interests::build_save_request(user_id, selection))
        .await;

    while let Some(event) = events.recv().await {
        match event {
            FlowEvent::BannerShown(banner) => {
                if result.is_ok() {
                    println!("{}", format!("✓ {}", banner.message).bright_green());
                } else {
                    println!("{}", format!("✗ {}", banner.message).bright_red());
                }
            }
            FlowEvent::RefreshRequested | FlowEvent::DismissRequested => {}
            FlowEvent::BannerCleared => break,
        }
    }

    result
}

fn render_catalog(selection: &SelectionSet) {
    let mut current_category = None;
    for (i, entry) in INTEREST_CATALOG.iter().enumerate() {
        if current_category != Some(entry.category) {
            current_category = Some(entry.category);
            println!("  {}", entry.category.to_string().bright_cyan());
        }
        let mark = if selection.contains(entry.name) {
            "[x]"
        } else {
            "[ ]"
        };
        println!(
            "  {} {} {}",
            format!("{:>2}.", i + 1).bright_black(),
            mark.bright_cyan(),
            entry.name
        );
    }
}
