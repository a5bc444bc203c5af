use std::time::Duration;

use themekit_config::{DEFAULT_PULL_BATCH_SIZE, DEFAULT_PUSH_BATCH_SIZE, WATCH_POLL_INTERVAL_MS};
use themekit_core::{DeltaState, ResourceListing};
use themekit_infra::RemoteError;

use crate::tasks::{TaskManagerError, TaskState, TaskSummary};

pub mod engine;
pub mod local;

pub use engine::SyncEngine;
pub use local::scan_local_state;

#[derive(Debug, Clone)]
pub struct PushOptions {
    /// Keep remote-only resources instead of deleting them.
    pub omit_delete: bool,
    pub batch_size: usize,
}

impl Default for PushOptions {
    fn default() -> Self {
        Self {
            omit_delete: false,
            batch_size: DEFAULT_PUSH_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PullOptions {
    /// Clear non-ignored top-level entries of the theme directory before downloading.
    pub prepare_dir: bool,
    pub batch_size: usize,
}

impl Default for PullOptions {
    fn default() -> Self {
        Self {
            prepare_dir: true,
            batch_size: DEFAULT_PULL_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Do not record local removals.
    pub omit_delete: bool,
    pub skip_initial_push: bool,
    pub batch_size: usize,
    pub poll_interval: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            omit_delete: false,
            skip_initial_push: false,
            batch_size: DEFAULT_PUSH_BATCH_SIZE,
            poll_interval: Duration::from_millis(WATCH_POLL_INTERVAL_MS),
        }
    }
}

/// Local vs remote comparison computed before a push.
#[derive(Debug, Clone)]
pub struct PushPlan {
    pub delta: DeltaState,
    pub listing: ResourceListing,
}

/// Outcome of a sync run: the final summary of every task, in execution order.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub summaries: Vec<TaskSummary>,
    pub healthy: bool,
}

impl SyncReport {
    pub fn count(&self, state: TaskState) -> usize {
        self.summaries.iter().filter(|s| s.state == state).count()
    }

    pub fn has_failures(&self) -> bool {
        self.summaries
            .iter()
            .any(|s| matches!(s.state, TaskState::Error | TaskState::Cancelled))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),
    #[error("Local state error: {0}")]
    Local(String),
    #[error("Task error: {0}")]
    Tasks(#[from] TaskManagerError),
    #[error("Watcher error: {0}")]
    Watcher(#[from] notify::Error),
}
