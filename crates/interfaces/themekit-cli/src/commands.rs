use std::sync::Arc;

use anyhow::{Context, Result};
use camino::Utf8Path;
use themekit_infra::net::default_http_client;
use themekit_infra::HttpRemoteClient;
use themekit_pipeline::{
    PullOptions, SyncEngine, SyncReport, TaskState, TaskSummary, WatchOptions,
};
use tokio::sync::watch;
use tracing::info;

use crate::progress::spawn_progress;
use crate::{ApiArgs, ThemeArgs};

fn build_engine(api: &ApiArgs, theme: &ThemeArgs) -> Result<SyncEngine> {
    let token = api
        .token
        .clone()
        .context("No access token: pass --token or set THEMEKIT_ACCESS_TOKEN")?;
    let client = default_http_client().context("Failed to build HTTP client")?;
    let remote = HttpRemoteClient::new(client, &api.api_host, token)
        .with_context(|| format!("Invalid API host `{}`", api.api_host))?;
    Ok(SyncEngine::new(
        theme.target(),
        theme.theme_dir.clone(),
        Arc::new(remote),
    ))
}

/// One line per task that did not complete.
pub fn outcome_lines(summaries: &[TaskSummary]) -> Vec<String> {
    summaries
        .iter()
        .filter_map(|s| match s.state {
            TaskState::Error => Some(format!(
                "   {}: {} (code {})",
                s.title,
                s.error.as_deref().unwrap_or("unknown error"),
                s.error_code.unwrap_or(themekit_pipeline::tasks::GENERIC_ERROR_CODE)
            )),
            TaskState::Cancelled => Some(format!(
                "   {}: {}",
                s.title,
                s.cancelled_reason.as_deref().unwrap_or("cancelled")
            )),
            TaskState::Pending | TaskState::Complete => None,
        })
        .collect()
}

fn print_report(label: &str, report: &SyncReport) {
    println!("\n:: {} Result", label);
    println!("   Completed: {}", report.count(TaskState::Complete));
    println!("   Errors:    {}", report.count(TaskState::Error));
    println!("   Cancelled: {}", report.count(TaskState::Cancelled));
    for line in outcome_lines(&report.summaries) {
        println!("{}", line);
    }
    if !report.healthy {
        println!("   Status:    Stopped (missing permissions)");
    }
}

fn finish(label: &str, report: &SyncReport) -> Result<()> {
    print_report(label, report);
    if report.has_failures() {
        anyhow::bail!(
            "{} of {} tasks did not complete",
            report.count(TaskState::Error) + report.count(TaskState::Cancelled),
            report.summaries.len()
        );
    }
    Ok(())
}

/// True when `dir` exists and holds at least one entry.
pub fn has_entries(dir: &Utf8Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

pub async fn cmd_push(
    api: &ApiArgs,
    theme: &ThemeArgs,
    omit_delete: bool,
    batch_size: usize,
) -> Result<()> {
    println!(":: Analyzing state...");
    println!("   Theme: {}", theme.theme_dir);
    println!("   Site:  {} / {}", theme.site_id, theme.theme_id);

    let engine = build_engine(api, theme)?;
    let plan = engine.plan_push(omit_delete).await?;

    println!("\n:: Push Plan");
    println!("   Create: {}", plan.delta.create.len());
    println!("   Update: {}", plan.delta.update.len());
    println!("   Delete: {}", plan.delta.delete.len());

    if !plan.delta.has_changes() {
        println!("   Status: Up to date");
        return Ok(());
    }

    let (tx, progress) = spawn_progress();
    let report = engine.execute_push(&plan, batch_size, Some(tx)).await?;
    progress.await.context("Progress renderer failed")?;

    finish("Push", &report)
}

pub async fn cmd_pull(
    api: &ApiArgs,
    theme: &ThemeArgs,
    yes: bool,
    batch_size: usize,
) -> Result<()> {
    if !yes && has_entries(&theme.theme_dir) {
        anyhow::bail!(
            "{} is not empty; re-run with --yes to replace its contents",
            theme.theme_dir
        );
    }

    println!(":: Pulling theme...");
    println!("   Site:  {} / {}", theme.site_id, theme.theme_id);
    println!("   Theme: {}", theme.theme_dir);

    let engine = build_engine(api, theme)?;
    let options = PullOptions {
        prepare_dir: true,
        batch_size,
    };

    let (tx, progress) = spawn_progress();
    let report = engine.pull(&options, Some(tx)).await?;
    progress.await.context("Progress renderer failed")?;

    finish("Pull", &report)
}

pub async fn cmd_watch(
    api: &ApiArgs,
    theme: &ThemeArgs,
    omit_delete: bool,
    skip_initial_push: bool,
) -> Result<()> {
    println!(":: Watching {} (Ctrl-C to stop)", theme.theme_dir);

    let engine = build_engine(api, theme)?;
    let options = WatchOptions {
        omit_delete,
        skip_initial_push,
        ..Default::default()
    };

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping watch");
            let _ = stop_tx.send(true);
        }
    });

    let (tx, progress) = spawn_progress();
    let report = engine.watch(&options, stop_rx, Some(tx)).await?;
    progress.await.context("Progress renderer failed")?;

    finish("Watch", &report)
}
