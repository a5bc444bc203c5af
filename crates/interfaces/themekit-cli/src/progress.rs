use indicatif::{ProgressBar, ProgressStyle};
use themekit_pipeline::{ProgressTracker, TaskProgressSnapshot, TaskState, TaskSummary};
use tokio::sync::mpsc::{self, Sender};
use tokio::task::JoinHandle;

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

/// Render task snapshots until the sender side is dropped.
///
/// The handle resolves to the counters of the last snapshot received.
pub fn spawn_progress() -> (Sender<Vec<TaskSummary>>, JoinHandle<TaskProgressSnapshot>) {
    let (tx, mut rx) = mpsc::channel::<Vec<TaskSummary>>(16);

    let handle = tokio::spawn(async move {
        let pb = ProgressBar::new(0);
        pb.set_style(bar_style());
        let mut tracker = ProgressTracker::new();

        while let Some(summaries) = rx.recv().await {
            tracker.update(&summaries);
            let snap = tracker.get_snapshot();
            pb.set_length(snap.total);
            pb.set_position(snap.finished());
            if let Some(next) = summaries.iter().find(|s| s.state == TaskState::Pending) {
                pb.set_message(next.title.clone());
            }
        }

        pb.finish_and_clear();
        tracker.get_snapshot()
    });

    (tx, handle)
}
