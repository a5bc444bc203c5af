use serde::Deserialize;

/// Failure of a remote call.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("{url} responded with status {status}: {message}")]
    Status {
        status: u16,
        url: String,
        message: String,
    },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to decode response from {url}: {reason}")]
    Decode { url: String, reason: String },
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl RemoteError {
    pub fn from_status(status: u16, url: impl Into<String>, message: impl Into<String>) -> Self {
        RemoteError::Status {
            status,
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Authorization failures (401/403). These stop every pending task of the
    /// same sync direction.
    pub fn is_permission_error(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub errors: Vec<ApiErrorEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorEntry {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub code: String,
    pub field: Option<String>,
    pub detail: Option<String>,
}

impl ApiErrorBody {
    /// One block per API error: category and code, then field and detail when present.
    pub fn message(&self) -> String {
        self.errors
            .iter()
            .map(|e| {
                let mut msg = format!("Category: {}\nCode: {}", e.category, e.code);
                if let Some(field) = &e.field {
                    msg.push_str(&format!(" Field: {field}"));
                }
                msg.push('\n');
                if let Some(detail) = &e.detail {
                    msg.push_str(&format!("Detail: {detail}"));
                }
                msg
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
