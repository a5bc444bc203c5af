use std::sync::Arc;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use themekit_core::diff::diff;
use themekit_core::remote::remote_state;
use themekit_core::{ResourceListing, ThemeTarget};
use themekit_infra::fs::{is_dir_valid_for_pull, prepare_dir_for_pull};
use themekit_infra::{ContentSource, DiskContentSource, FileIgnorer, RemoteClient};
use tokio::sync::mpsc::Sender;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::identity::PageIdentityStore;
use crate::sync::local::scan_local_state;
use crate::sync::{PullOptions, PushOptions, PushPlan, SyncError, SyncReport, WatchOptions};
use crate::tasks::{TaskManager, TaskManagerConfig, TaskSummary};
use crate::watcher::ThemeWatcher;

/// Push, pull and watch for one theme directory against one site theme.
pub struct SyncEngine {
    target: ThemeTarget,
    theme_dir: Utf8PathBuf,
    client: Arc<dyn RemoteClient>,
    content: Arc<dyn ContentSource>,
    task_timeout: Option<Duration>,
}

impl SyncEngine {
    pub fn new(
        target: ThemeTarget,
        theme_dir: impl Into<Utf8PathBuf>,
        client: Arc<dyn RemoteClient>,
    ) -> Self {
        let theme_dir = theme_dir.into();
        let content: Arc<dyn ContentSource> = Arc::new(DiskContentSource::new(theme_dir.clone()));
        Self {
            target,
            theme_dir,
            client,
            content,
            task_timeout: None,
        }
    }

    pub fn with_content_source(mut self, content: Arc<dyn ContentSource>) -> Self {
        self.content = content;
        self
    }

    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = Some(timeout);
        self
    }

    pub fn theme_dir(&self) -> &Utf8Path {
        &self.theme_dir
    }

    fn manager(&self, listing: &ResourceListing) -> TaskManager {
        let identity = Arc::new(PageIdentityStore::from_pages(&listing.pages));
        let mut config =
            TaskManagerConfig::new(self.target.clone(), self.client.clone(), self.content.clone())
                .with_identity(identity);
        config.task_timeout = self.task_timeout;
        TaskManager::new(config)
    }

    /// Scan the local tree and the remote listing concurrently and diff them.
    pub async fn plan_push(&self, omit_delete: bool) -> Result<PushPlan, SyncError> {
        let ignorer = FileIgnorer::from_ignore_file(&self.theme_dir);
        let (local, listing) = tokio::try_join!(
            scan_local_state(&self.theme_dir, ignorer),
            async {
                self.client
                    .fetch_listing(&self.target)
                    .await
                    .map_err(SyncError::from)
            }
        )?;

        let remote = remote_state(&listing);
        let delta = diff(&local, &remote, omit_delete);
        debug!(
            "Push delta: {} create, {} update, {} delete",
            delta.create.len(),
            delta.update.len(),
            delta.delete.len()
        );
        Ok(PushPlan { delta, listing })
    }

    pub async fn execute_push(
        &self,
        plan: &PushPlan,
        batch_size: usize,
        progress_tx: Option<Sender<Vec<TaskSummary>>>,
    ) -> Result<SyncReport, SyncError> {
        let mut manager = self.manager(&plan.listing);
        manager.add_tasks_from_delta(&plan.delta)?;
        let summaries = manager.execute(batch_size, progress_tx).await;
        Ok(SyncReport {
            summaries,
            healthy: manager.is_healthy(),
        })
    }

    pub async fn push(
        &self,
        options: &PushOptions,
        progress_tx: Option<Sender<Vec<TaskSummary>>>,
    ) -> Result<SyncReport, SyncError> {
        let plan = self.plan_push(options.omit_delete).await?;
        self.execute_push(&plan, options.batch_size, progress_tx)
            .await
    }

    pub async fn pull(
        &self,
        options: &PullOptions,
        progress_tx: Option<Sender<Vec<TaskSummary>>>,
    ) -> Result<SyncReport, SyncError> {
        if !is_dir_valid_for_pull(&self.theme_dir) {
            return Err(SyncError::Local(format!(
                "{} exists and is not a directory",
                self.theme_dir
            )));
        }

        let ignorer = FileIgnorer::from_ignore_file(&self.theme_dir);
        let listing = self.client.fetch_listing(&self.target).await?;

        if options.prepare_dir {
            prepare_dir_for_pull(&self.theme_dir, &ignorer)
                .map_err(|e| SyncError::Local(e.to_string()))?;
        }

        let mut manager = self.manager(&listing);
        manager.add_tasks_from_pull_listing(&listing, &ignorer)?;
        let summaries = manager.execute(options.batch_size, progress_tx).await;
        Ok(SyncReport {
            summaries,
            healthy: manager.is_healthy(),
        })
    }

    /// Push local changes continuously until `stop` turns true or a permission error
    /// makes the task manager unhealthy.
    ///
    /// The report collects the summaries of every executed round.
    pub async fn watch(
        &self,
        options: &WatchOptions,
        mut stop: watch::Receiver<bool>,
        progress_tx: Option<Sender<Vec<TaskSummary>>>,
    ) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::default();

        let listing = self.client.fetch_listing(&self.target).await?;
        let mut manager = self.manager(&listing);

        if !options.skip_initial_push {
            let ignorer = FileIgnorer::from_ignore_file(&self.theme_dir);
            let local = scan_local_state(&self.theme_dir, ignorer).await?;
            let delta = diff(&local, &remote_state(&listing), options.omit_delete);
            if delta.has_changes() {
                info!("Pushing out-of-sync files before watching");
                manager.add_tasks_from_delta(&delta)?;
                let summaries = manager
                    .execute(options.batch_size, progress_tx.clone())
                    .await;
                report.summaries.extend(summaries);
            }
        }

        if !manager.is_healthy() {
            warn!("Not starting watch: missing permissions");
            report.healthy = false;
            return Ok(report);
        }

        let mut watcher = ThemeWatcher::start(
            &self.theme_dir,
            FileIgnorer::from_ignore_file(&self.theme_dir),
            options.omit_delete,
        )?;

        let mut ticker = tokio::time::interval(options.poll_interval);
        let result = loop {
            if *stop.borrow() {
                break Ok(());
            }

            tokio::select! {
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break Ok(());
                    }
                }
                _ = ticker.tick() => {
                    if !watcher.has_pending_changes() {
                        continue;
                    }
                    let store = watcher.drain();
                    debug!("Draining {} pending changes", store.len());
                    if let Err(e) = manager.add_tasks_from_watcher_store(&store) {
                        break Err(SyncError::from(e));
                    }
                    let summaries = manager
                        .execute(options.batch_size, progress_tx.clone())
                        .await;
                    report.summaries.extend(summaries);

                    if !manager.is_healthy() {
                        warn!("Stopping watch: missing permissions");
                        break Ok(());
                    }
                }
            }
        };

        watcher.stop();
        report.healthy = manager.is_healthy();
        result.map(|_| report)
    }
}
