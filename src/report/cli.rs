use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;

use crate::api::ApiClient;
use crate::config::Config;
use crate::flow::{FlowError, FlowEvent, SubmissionFlow, SubmissionResult};
use crate::idempotency;
use crate::prompts::{prompt_line, prompt_yes_no};
use crate::report::{ReasonFlag, ReasonFlags, ReportSubmission, ReportSubmitter};
use crate::services::{AggregateRefresh, ReportService};
use crate::storage::{LocalStorage, SentReportsCache};

const SUCCESS_MESSAGE: &str = "Report sent. Thank you for helping keep the community safe.";

pub(crate) fn run_report_flow(
    rt: &tokio::runtime::Runtime,
    image_url: &str,
    subject_user_id: &str,
) -> Result<()> {
    let config = Config::load()?;
    let Some(actor_id) = config.user.actor_id().map(str::to_string) else {
        println!(
            "{}",
            "No account ID configured. Run `profile-companion config set-user <id>` first."
                .bright_red()
        );
        return Ok(());
    };

    println!();
    println!("{}", "Report photo".bright_cyan().bold());
    println!(
        "  {}",
        "Reports go to the review team. The photo's owner is not told who reported it."
            .bright_black()
    );
    println!();

    let flags = prompt_reason_flags()?;

    let report = ReportSubmission {
        image_url: image_url.to_string(),
        subject_user_id: subject_user_id.to_string(),
        reporter_id: actor_id,
        flags,
    };

    if let Err(errors) = report.validate() {
        println!("{}", "Validation issues:".bright_red());
        for e in errors {
            println!("  - {}", e.bright_red());
        }
        return Ok(());
    }

    println!();
    println!("  {} {}", "Photo:".bright_white(), report.image_url);
    println!("  {} {}", "Reason:".bright_white(), report.flags.reason_string());
    println!();
    if !prompt_yes_no("Send this report? [Y/n]: ", true)? {
        println!("{}", "Cancelled.".bright_yellow());
        return Ok(());
    }

    let storage = Arc::new(LocalStorage::new()?);
    let reports_cache = Arc::new(SentReportsCache::new(storage.clone()));
    let api = Arc::new(ApiClient::new());
    let idempotency_key = idempotency::new_report_key();

    println!();
    println!("{}", "Submitting report...".bright_cyan());

    let result = rt.block_on(submit_and_watch(
        &report,
        &idempotency_key,
        api,
        reports_cache,
    ));

    match result {
        Ok(()) => {
            storage.record_sent_report(&report)?;
            Ok(())
        }
        Err(FlowError::Remote(err)) if err.is_transport() => {
            let save = prompt_yes_no(
                "Could not reach the service. Save this report and retry later with `profile-companion sync`? [Y/n]: ",
                true,
            )?;
            if save {
                let _pending_id = storage.save_pending_report(&report, &idempotency_key)?;
                println!(
                    "{}",
                    "⚠ Saved locally. Run `profile-companion sync` when you are back online."
                        .bright_yellow()
                );
            }
            Ok(())
        }
        Err(_) => {
            // The failure banner already showed the message; nothing else to do.
            Ok(())
        }
    }
}

/// Run one submission through a fresh flow and print its feedback events
/// until the banner clears.
async fn submit_and_watch(
    report: &ReportSubmission,
    idempotency_key: &str,
    service: Arc<dyn ReportService>,
    refresh: Arc<dyn AggregateRefresh>,
) -> SubmissionResult {
    let submitter = Arc::new(ReportSubmitter::new(service));
    let (flow, mut events) = SubmissionFlow::new(submitter, refresh, SUCCESS_MESSAGE);

    let result = flow.submit(report.to_request(idempotency_key)).await;

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

pub(crate) fn run_sync_flow(rt: &tokio::runtime::Runtime) -> Result<()> {
    let storage = Arc::new(LocalStorage::new()?);
    let pending = storage.load_pending_reports()?;

    if pending.is_empty() {
        println!("{}", "Nothing to sync.".bright_black());
        return Ok(());
    }

    println!(
        "{}",
        format!("Retrying {} saved report(s)...", pending.len()).bright_cyan()
    );

    let reports_cache = Arc::new(SentReportsCache::new(storage.clone()));
    let api = Arc::new(ApiClient::new());
    let mut sent = 0usize;

    for item in pending {
        let result = rt.block_on(async {
            let submitter = Arc::new(ReportSubmitter::new(api.clone()));
            let (flow, _events) =
                SubmissionFlow::new(submitter, reports_cache.clone(), SUCCESS_MESSAGE);
            flow.submit(item.report.to_request(&item.idempotency_key))
                .await
        });

        match result {
            Ok(()) => {
                storage.record_sent_report(&item.report)?;
                storage.remove_pending_report(&item.id)?;
                sent += 1;
                println!(
                    "  {} {}",
                    "✓".bright_green(),
                    item.report.image_url.bright_white()
                );
            }
            Err(err) => {
                println!(
                    "  {} {} ({})",
                    "✗".bright_red(),
                    item.report.image_url.bright_white(),
                    err.to_string().bright_red()
                );
            }
        }
    }

    println!();
    println!("{}", format!("Sent {sent} report(s).").bright_green());
    Ok(())
}

pub(crate) fn run_reports_list() -> Result<()> {
    let storage = Arc::new(LocalStorage::new()?);
    let cache = SentReportsCache::new(storage.clone());

    let sent = cache.list()?;
    if sent.is_empty() {
        println!("{}", "You have not sent any reports.".bright_black());
        return Ok(());
    }

    println!("{}", format!("{} report(s) sent:", sent.len()).bright_cyan());
    for report in sent {
        println!(
            "  {} {} — {}",
            report.reported_at.format("%Y-%m-%d %H:%M").to_string().bright_black(),
            report.image_url.bright_white(),
            report.reason
        );
    }

    let pending = storage.load_pending_reports()?;
    if !pending.is_empty() {
        println!();
        println!(
            "{}",
            format!(
                "{} report(s) waiting to sync. Run `profile-companion sync`.",
                pending.len()
            )
            .bright_yellow()
        );
    }
    Ok(())
}

fn prompt_reason_flags() -> Result<ReasonFlags> {
    let mut flags = ReasonFlags::default();

    loop {
        println!("{}", "Why are you reporting this photo?".bright_white());
        for (i, flag) in ReasonFlag::ALL.iter().enumerate() {
            let mark = if flags.is_set(*flag) { "[x]" } else { "[ ]" };
            println!(
                "  {} {} {} — {}",
                format!("{:>2}.", i + 1).bright_black(),
                mark.bright_cyan(),
                flag.label(),
                flag.hint().bright_black()
            );
        }
        if !flags.any() {
            println!(
                "  {}",
                "With nothing ticked the report is filed as \"Inappropriate content\"."
                    .bright_black()
            );
        }

        let input = prompt_line("Toggle a number, or press Enter to continue: ")?;
        if input.is_empty() {
            return Ok(flags);
        }
        match input.parse::<usize>() {
            Ok(n) if n >= 1 && n <= ReasonFlag::ALL.len() => {
                flags.toggle(ReasonFlag::ALL[n - 1]);
            }
            _ => println!("{}", "Invalid choice. Try again.".bright_red()),
        }
        println!();
    }
}
