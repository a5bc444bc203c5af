use crate::tasks::{TaskState, TaskSummary};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskProgressSnapshot {
    pub total: u64,
    pub pending: u64,
    pub complete: u64,
    pub error: u64,
    pub cancelled: u64,
    /// Snapshots received so far; the first one precedes any batch.
    pub snapshots_seen: u64,
}

impl TaskProgressSnapshot {
    /// Tasks that reached a terminal state.
    pub fn finished(&self) -> u64 {
        self.complete + self.error + self.cancelled
    }
}

/// Folds the summary snapshots sent by the task manager into counters.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    current: TaskProgressSnapshot,
    last_titles: Vec<String>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, summaries: &[TaskSummary]) {
        let mut next = TaskProgressSnapshot {
            total: summaries.len() as u64,
            snapshots_seen: self.current.snapshots_seen + 1,
            ..Default::default()
        };
        for summary in summaries {
            match summary.state {
                TaskState::Pending => next.pending += 1,
                TaskState::Complete => next.complete += 1,
                TaskState::Error => next.error += 1,
                TaskState::Cancelled => next.cancelled += 1,
            }
        }
        self.current = next;
        self.last_titles = summaries.iter().map(|s| s.title.clone()).collect();
    }

    pub fn get_snapshot(&self) -> TaskProgressSnapshot {
        self.current.clone()
    }

    /// Titles from the most recent snapshot, in queue order.
    pub fn titles(&self) -> &[String] {
        &self.last_titles
    }
}
