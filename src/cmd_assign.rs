//! `assign` subcommand: one batch, start to finish.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use tracing::{info, warn};

use skillstar_browser::BrowserManager;
use skillstar_config::Config;
use skillstar_engine::{AssignmentHandler, CdpTree, FileCatalog};
use skillstar_queue::{Scheduler, SchedulerHandle, Task, TaskId, TaskRequest, TaskStatus, TaskTargets};

use crate::cli::AssignArgs;

pub(crate) async fn run(config: Config, args: AssignArgs) -> anyhow::Result<ExitCode> {
    info!("Starting Skillstar v{}", env!("CARGO_PKG_VERSION"));

    let catalog = FileCatalog::open(&args.catalog)
        .await
        .with_context(|| format!("opening catalog {}", args.catalog.display()))?;

    let browser = BrowserManager::new(config.browser.clone());
    let page = browser.page().await.context("opening browser page")?;

    let handler = AssignmentHandler::new(
        Arc::new(CdpTree::new(page)),
        Arc::new(catalog),
        &config,
    );
    let scheduler = Scheduler::spawn(Arc::new(handler), config.queue.clone());

    let request = TaskRequest::new(
        TaskTargets {
            student_ids: args.students,
            group_names: args.groups,
        },
        args.skills,
        args.action,
    );

    let outcome = match scheduler.submit(request).await {
        Ok(id) => follow(&scheduler, id, Duration::from_millis(args.poll_ms)).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = scheduler.shutdown().await {
        warn!("Scheduler shutdown failed: {}", e);
    }
    if let Err(e) = browser.shutdown().await {
        warn!("Browser shutdown failed: {}", e);
    }

    let task = outcome?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&task)?);
    } else {
        print_results(&task);
    }

    Ok(match task.status {
        TaskStatus::Completed if task.failed_count() == 0 => ExitCode::SUCCESS,
        TaskStatus::Completed | TaskStatus::Aborted => ExitCode::from(2),
        _ => ExitCode::FAILURE,
    })
}

/// Poll `id` until it is terminal, printing progress. Ctrl-C aborts the queue.
async fn follow(scheduler: &SchedulerHandle, id: TaskId, interval: Duration) -> anyhow::Result<Task> {
    let mut abort_sent = false;
    let mut last_progress = None;

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c(), if !abort_sent => {
                signal.context("listening for ctrl-c")?;
                let summary = scheduler.abort_all().await?;
                warn!(cleared = summary.cleared_count, "Abort requested");
                abort_sent = true;
            }
            _ = tokio::time::sleep(interval) => {
                let task = scheduler
                    .status(id)
                    .await?
                    .ok_or_else(|| anyhow!("task {} disappeared from the queue", id))?;

                let progress = (task.status, task.progress);
                if last_progress != Some(progress) {
                    let label = task.current_skill_label.as_deref().unwrap_or("-");
                    println!("[{:?}] {}/{} {}", task.status, task.progress, task.total, label);
                    last_progress = Some(progress);
                }

                if task.status.is_terminal() {
                    return Ok(task);
                }
            }
        }
    }
}

fn print_results(task: &Task) {
    println!();
    println!("{:<24} {:<10} {:<8} {}", "TARGET", "SKILL", "RESULT", "ERROR");
    println!("{}", "-".repeat(72));
    for record in &task.results {
        let target = if record.is_class_target {
            format!("{} (class)", record.target_name)
        } else {
            record.target_name.clone()
        };
        println!(
            "{:<24} {:<10} {:<8} {}",
            target,
            record.skill_code,
            if record.success { "ok" } else { "failed" },
            record.error.as_deref().unwrap_or("")
        );
    }
    println!();
    println!(
        "Task {} {:?}: {} succeeded, {} failed",
        task.id,
        task.status,
        task.succeeded_count(),
        task.failed_count()
    );
    if let Some(error) = &task.error {
        println!("Error: {}", error);
    }
}
