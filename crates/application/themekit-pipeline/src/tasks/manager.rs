use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use themekit_core::{Action, DeltaState, Direction, ResourceKind, ResourceListing, ThemeTarget};
use themekit_infra::{ContentSource, FileIgnorer, RemoteClient};
use tokio::sync::mpsc::Sender;
use tracing::{debug, error, info, warn};

use super::handlers::{handler_for, TaskContext};
use super::{factory, ordering, ErrorClass, ResourceTask, TaskError, TaskPayload, TaskState, TaskSummary};
use crate::identity::PageIdentityStore;
use crate::watcher::WatcherStore;

pub const PERMISSION_CANCELLED_REASON: &str = "Cancelled because of missing permissions";

#[derive(Debug, thiserror::Error)]
pub enum TaskManagerError {
    #[error("Task manager is not healthy; a permission error stopped further work")]
    NotHealthy,
}

pub struct TaskManagerConfig {
    pub target: ThemeTarget,
    pub client: Arc<dyn RemoteClient>,
    pub content: Arc<dyn ContentSource>,
    pub identity: Arc<PageIdentityStore>,
    /// Upper bound for one task's remote work. Elapsing counts as a generic error.
    pub task_timeout: Option<Duration>,
}

impl TaskManagerConfig {
    pub fn new(
        target: ThemeTarget,
        client: Arc<dyn RemoteClient>,
        content: Arc<dyn ContentSource>,
    ) -> Self {
        Self {
            target,
            client,
            content,
            identity: Arc::new(PageIdentityStore::new()),
            task_timeout: None,
        }
    }

    pub fn with_identity(mut self, identity: Arc<PageIdentityStore>) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = Some(timeout);
        self
    }
}

/// Owns the task queue and runs it in fixed-size concurrent batches.
///
/// The queue is single-use: `execute` clears it when the last batch settles.
/// A permission failure marks its direction unhealthy for the manager's lifetime
/// and cancels every pending task of that direction.
pub struct TaskManager {
    ctx: TaskContext,
    task_timeout: Option<Duration>,
    tasks: Vec<ResourceTask>,
    push_healthy: bool,
    pull_healthy: bool,
}

impl TaskManager {
    pub fn new(config: TaskManagerConfig) -> Self {
        Self {
            ctx: TaskContext {
                target: config.target,
                client: config.client,
                content: config.content,
                identity: config.identity,
            },
            task_timeout: config.task_timeout,
            tasks: Vec::new(),
            push_healthy: true,
            pull_healthy: true,
        }
    }

    pub fn identity(&self) -> &Arc<PageIdentityStore> {
        &self.ctx.identity
    }

    pub fn tasks(&self) -> &[ResourceTask] {
        &self.tasks
    }

    pub fn has_tasks(&self) -> bool {
        !self.tasks.is_empty()
    }

    pub fn is_healthy(&self) -> bool {
        self.push_healthy && self.pull_healthy
    }

    pub fn is_direction_healthy(&self, direction: Direction) -> bool {
        match direction {
            Direction::Push => self.push_healthy,
            Direction::Pull => self.pull_healthy,
        }
    }

    /// Normalize, merge by identity and reorder the queue.
    pub fn add_tasks(&mut self, payloads: Vec<TaskPayload>) -> Result<(), TaskManagerError> {
        if !self.is_healthy() {
            return Err(TaskManagerError::NotHealthy);
        }

        for payload in payloads {
            let payload = self.normalize(payload);
            let task = ResourceTask::new(payload, self.ctx.target.clone());
            match self
                .tasks
                .iter()
                .position(|t| t.payload.identity() == task.payload.identity())
            {
                Some(idx) => {
                    debug!("Superseding queued task for {}", task.payload.file_path);
                    self.tasks[idx] = task;
                }
                None => self.tasks.push(task),
            }
        }

        ordering::sort_tasks(&mut self.tasks);
        Ok(())
    }

    pub fn add_tasks_from_delta(&mut self, delta: &DeltaState) -> Result<(), TaskManagerError> {
        self.add_tasks(factory::from_delta(delta))
    }

    pub fn add_tasks_from_pull_listing(
        &mut self,
        listing: &ResourceListing,
        ignorer: &FileIgnorer,
    ) -> Result<(), TaskManagerError> {
        self.add_tasks(factory::from_pull_listing(listing, ignorer))
    }

    pub fn add_tasks_from_watcher_store(
        &mut self,
        store: &WatcherStore,
    ) -> Result<(), TaskManagerError> {
        self.add_tasks(factory::from_watcher_store(store))
    }

    /// A page the remote side cannot identify can only be created.
    fn normalize(&self, mut payload: TaskPayload) -> TaskPayload {
        if payload.kind == ResourceKind::Page
            && payload.action == Action::Update
            && self.ctx.identity.id_for_path(&payload.file_path).is_none()
        {
            debug!("No page id for {}, creating instead", payload.file_path);
            payload.action = Action::Create;
        }
        payload
    }

    pub fn summaries(&self) -> Vec<TaskSummary> {
        self.tasks.iter().map(ResourceTask::summary).collect()
    }

    /// Run every queued task, `batch_size` at a time.
    ///
    /// A snapshot is sent before the first batch and after each batch. The sender is
    /// dropped on return. The final snapshot is also returned.
    pub async fn execute(
        &mut self,
        batch_size: usize,
        progress_tx: Option<Sender<Vec<TaskSummary>>>,
    ) -> Vec<TaskSummary> {
        let batch_size = batch_size.max(1);
        self.emit(&progress_tx).await;

        let mut start = 0;
        while start < self.tasks.len() {
            let end = (start + batch_size).min(self.tasks.len());
            debug!("Executing tasks {}..{} of {}", start, end, self.tasks.len());
            self.execute_slice(start, end).await;
            self.emit(&progress_tx).await;
            start = end;
        }

        let summaries = self.summaries();
        self.tasks.clear();
        summaries
    }

    async fn emit(&self, progress_tx: &Option<Sender<Vec<TaskSummary>>>) {
        if let Some(tx) = progress_tx {
            let _ = tx.send(self.summaries()).await;
        }
    }

    async fn execute_slice(&mut self, start: usize, end: usize) {
        let ctx = &self.ctx;
        let timeout = self.task_timeout;
        let runs = self.tasks[start..end]
            .iter_mut()
            .filter(|task| task.state == TaskState::Pending)
            .map(|task| run_task(ctx, task, timeout));
        join_all(runs).await;

        self.handle_task_errors(start, end);
    }

    fn handle_task_errors(&mut self, start: usize, end: usize) {
        let mut push_denied = false;
        let mut pull_denied = false;
        for task in &self.tasks[start..end] {
            let denied = task
                .error
                .as_ref()
                .is_some_and(|e| e.class() == ErrorClass::Permission);
            if denied {
                match task.direction() {
                    Direction::Push => push_denied = true,
                    Direction::Pull => pull_denied = true,
                }
            }
        }

        if push_denied && self.push_healthy {
            warn!("Permission error during push; cancelling pending push tasks");
            self.push_healthy = false;
        }
        if pull_denied && self.pull_healthy {
            warn!("Permission error during pull; cancelling pending pull tasks");
            self.pull_healthy = false;
        }

        let (push_healthy, pull_healthy) = (self.push_healthy, self.pull_healthy);
        let mut cancelled = 0usize;
        for task in self.tasks.iter_mut() {
            if task.state != TaskState::Pending {
                continue;
            }
            let healthy = match task.direction() {
                Direction::Push => push_healthy,
                Direction::Pull => pull_healthy,
            };
            if !healthy {
                task.cancel(PERMISSION_CANCELLED_REASON);
                cancelled += 1;
            }
        }
        if cancelled > 0 {
            info!("Cancelled {} pending tasks", cancelled);
        }
    }
}

async fn run_task(ctx: &TaskContext, task: &mut ResourceTask, timeout: Option<Duration>) {
    let handler = handler_for(task.payload.kind, task.payload.action);

    let prepared = match handler.validate(ctx, &task.payload).await {
        Ok(prepared) => prepared,
        Err(e) => {
            warn!("{}: {}", task.title(), e);
            if let TaskError::Validation(v) = &e {
                debug!("Validation detail: {}", v.detail());
            }
            task.fail(e);
            return;
        }
    };

    let run = handler.execute(ctx, &task.payload, prepared);
    let result = match timeout {
        Some(limit) => tokio::time::timeout(limit, run)
            .await
            .unwrap_or(Err(TaskError::Timeout(limit))),
        None => run.await,
    };

    match result {
        Ok(()) => task.state = TaskState::Complete,
        Err(e) => {
            error!("{}: {}", task.title(), e);
            task.fail(e);
        }
    }
}
