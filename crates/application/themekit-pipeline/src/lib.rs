pub mod identity;
pub mod sync;
pub mod tasks;
pub mod tracker;
pub mod watcher;

pub use identity::PageIdentityStore;
pub use sync::{
    PullOptions, PushOptions, PushPlan, SyncEngine, SyncError, SyncReport, WatchOptions,
};
pub use tasks::{
    ResourceTask, TaskManager, TaskManagerConfig, TaskManagerError, TaskPayload, TaskState,
    TaskSummary,
};
pub use tracker::{ProgressTracker, TaskProgressSnapshot};
pub use watcher::{ChangeAggregator, ThemeWatcher, WatcherStore};
