//! Task model: payloads, task state, summaries and the error taxonomy.

use std::time::Duration;

use serde::Serialize;
use themekit_config::MAX_THEME_FILE_BYTE_SIZE;
use themekit_core::{Action, Direction, RemoteResource, ResourceKind, ThemeTarget};
use themekit_infra::{ContentError, RemoteError};

pub mod factory;
pub mod handlers;
pub mod manager;
pub mod ordering;

pub use manager::{TaskManager, TaskManagerConfig, TaskManagerError, PERMISSION_CANCELLED_REASON};

/// Code reported for failures outside the validation taxonomy.
pub const GENERIC_ERROR_CODE: u16 = 600;

/// Description of one unit of work before it is bound to a target.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskPayload {
    pub kind: ResourceKind,
    pub action: Action,
    pub file_path: String,
    /// Remote descriptor for downloads.
    pub resource: Option<RemoteResource>,
}

impl TaskPayload {
    pub fn push(kind: ResourceKind, action: Action, file_path: impl Into<String>) -> Self {
        Self {
            kind,
            action,
            file_path: file_path.into(),
            resource: None,
        }
    }

    pub fn download(file_path: impl Into<String>, resource: RemoteResource) -> Self {
        Self {
            kind: resource.kind(),
            action: Action::Download,
            file_path: file_path.into(),
            resource: Some(resource),
        }
    }

    /// Queue identity. At most one task per identity is queued at a time.
    pub fn identity(&self) -> (ResourceKind, &str) {
        (self.kind, self.file_path.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Pending,
    Complete,
    Error,
    Cancelled,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, TaskState::Pending)
    }
}

/// Local content that cannot be sent. The task ends in `error` without a remote call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    #[error("Unable to parse file contents for Site Page, please check that file is valid JSON.")]
    PageParse { path: String, reason: String },
    #[error(
        "Unable to parse file contents for Site Settings, please check that file is valid JSON."
    )]
    SettingsParse { path: String, reason: String },
    #[error("Unable to read file contents for Theme File. Please check file contents")]
    ThemeRead { path: String, reason: String },
    #[error(
        "Unable to parse file contents for Global Element, please check that file is valid JSON."
    )]
    GlobalElementParse { path: String, reason: String },
    #[error(
        "Files within /theme directory must be between 1 and {max} bytes",
        max = MAX_THEME_FILE_BYTE_SIZE
    )]
    ThemeSize { path: String, size: u64 },
}

impl ValidationError {
    pub fn code(&self) -> u16 {
        match self {
            ValidationError::PageParse { .. } => 100,
            ValidationError::SettingsParse { .. } => 101,
            ValidationError::ThemeRead { .. } => 102,
            ValidationError::GlobalElementParse { .. } => 103,
            ValidationError::ThemeSize { .. } => 201,
        }
    }

    /// Underlying cause, for logs.
    pub fn detail(&self) -> String {
        match self {
            ValidationError::PageParse { path, reason }
            | ValidationError::SettingsParse { path, reason }
            | ValidationError::ThemeRead { path, reason }
            | ValidationError::GlobalElementParse { path, reason } => format!("{path}: {reason}"),
            ValidationError::ThemeSize { path, size } => format!("{path}: {size} bytes"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Validation,
    Permission,
    Generic,
}

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error("Task timed out after {0:?}")]
    Timeout(Duration),
    #[error("{0}")]
    Generic(String),
}

impl TaskError {
    pub fn class(&self) -> ErrorClass {
        match self {
            TaskError::Validation(_) => ErrorClass::Validation,
            TaskError::Remote(e) if e.is_permission_error() => ErrorClass::Permission,
            _ => ErrorClass::Generic,
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            TaskError::Validation(e) => e.code(),
            _ => GENERIC_ERROR_CODE,
        }
    }
}

/// A payload bound to a site theme, plus its execution outcome.
#[derive(Debug)]
pub struct ResourceTask {
    pub payload: TaskPayload,
    pub target: ThemeTarget,
    pub state: TaskState,
    pub error: Option<TaskError>,
    pub cancelled_reason: Option<String>,
}

impl ResourceTask {
    pub fn new(payload: TaskPayload, target: ThemeTarget) -> Self {
        Self {
            payload,
            target,
            state: TaskState::Pending,
            error: None,
            cancelled_reason: None,
        }
    }

    pub fn direction(&self) -> Direction {
        self.payload.action.direction()
    }

    pub fn title(&self) -> String {
        let verb = match (self.payload.action, self.state) {
            (Action::Create, TaskState::Pending) => "creating",
            (Action::Update, TaskState::Pending) => "updating",
            (Action::Delete, TaskState::Pending) => "deleting",
            (Action::Download, TaskState::Pending) => "downloading",
            (_, TaskState::Complete) => "completed",
            (Action::Download, TaskState::Error) => "error downloading",
            (Action::Create | Action::Update | Action::Delete, TaskState::Error) => "error",
            (_, TaskState::Cancelled) => "cancelled",
        };
        format!("{verb} ... {}", self.payload.file_path)
    }

    pub fn fail(&mut self, error: TaskError) {
        self.state = TaskState::Error;
        self.error = Some(error);
    }

    pub fn cancel(&mut self, reason: impl Into<String>) {
        if self.state == TaskState::Pending {
            self.state = TaskState::Cancelled;
            self.cancelled_reason = Some(reason.into());
        }
    }

    pub fn summary(&self) -> TaskSummary {
        TaskSummary {
            kind: self.payload.kind,
            action: self.payload.action,
            file_path: self.payload.file_path.clone(),
            title: self.title(),
            state: self.state,
            error: self.error.as_ref().map(|e| e.to_string()),
            error_code: self.error.as_ref().map(TaskError::code),
            cancelled_reason: self.cancelled_reason.clone(),
        }
    }
}

/// Read-only projection of a task for progress reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSummary {
    pub kind: ResourceKind,
    pub action: Action,
    pub file_path: String,
    pub title: String,
    pub state: TaskState,
    pub error: Option<String>,
    pub error_code: Option<u16>,
    pub cancelled_reason: Option<String>,
}
