//! Theme-directory file access used by task handlers and pull preparation.

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use crate::ignorer::FileIgnorer;

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Path escapes the theme directory: {0}")]
    Traversal(String),
    #[error("Path is not valid UTF-8: {0}")]
    NonUtf8(String),
}

impl ContentError {
    fn io(path: &Utf8Path, source: std::io::Error) -> Self {
        ContentError::Io {
            path: path.to_string(),
            source,
        }
    }

    /// The underlying IO error kind, if any.
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            ContentError::Io { source, .. } => Some(source.kind()),
            _ => None,
        }
    }
}

/// Byte access to theme files addressed by normalized theme paths (`/theme/a.css`).
#[async_trait::async_trait]
pub trait ContentSource: Send + Sync {
    /// Size in bytes, or `None` when the file does not exist.
    async fn file_size(&self, path: &str) -> Result<Option<u64>, ContentError>;
    async fn read(&self, path: &str) -> Result<Vec<u8>, ContentError>;
    /// Write `content`, creating missing parent directories.
    async fn write(&self, path: &str, content: &[u8]) -> Result<(), ContentError>;
}

/// [`ContentSource`] rooted at a theme directory on disk.
#[derive(Debug, Clone)]
pub struct DiskContentSource {
    root: Utf8PathBuf,
}

impl DiskContentSource {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Resolve a theme path under the root, rejecting `..` components.
    pub fn resolve(&self, path: &str) -> Result<Utf8PathBuf, ContentError> {
        let relative = path.replace('\\', "/");
        let relative = relative.trim_start_matches('/');
        if relative.split('/').any(|c| c == "..") {
            return Err(ContentError::Traversal(path.to_string()));
        }
        if relative.len() > 1 && relative.chars().nth(1) == Some(':') {
            return Err(ContentError::Traversal(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait::async_trait]
impl ContentSource for DiskContentSource {
    async fn file_size(&self, path: &str) -> Result<Option<u64>, ContentError> {
        let full = self.resolve(path)?;
        match tokio::fs::metadata(&full).await {
            Ok(meta) if meta.is_file() => Ok(Some(meta.len())),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ContentError::io(&full, e)),
        }
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, ContentError> {
        let full = self.resolve(path)?;
        tokio::fs::read(&full)
            .await
            .map_err(|e| ContentError::io(&full, e))
    }

    async fn write(&self, path: &str, content: &[u8]) -> Result<(), ContentError> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ContentError::io(parent, e))?;
        }
        tokio::fs::write(&full, content)
            .await
            .map_err(|e| ContentError::io(&full, e))
    }
}

/// A pull target is valid when it is missing or an existing directory.
pub fn is_dir_valid_for_pull(root: &Utf8Path) -> bool {
    !root.exists() || root.is_dir()
}

/// Create `root`, or clear every top-level entry the ignorer does not protect.
pub fn prepare_dir_for_pull(root: &Utf8Path, ignorer: &FileIgnorer) -> Result<(), ContentError> {
    if !root.exists() {
        return std::fs::create_dir_all(root).map_err(|e| ContentError::io(root, e));
    }

    let entries = std::fs::read_dir(root).map_err(|e| ContentError::io(root, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| ContentError::io(root, e))?;
        let path = Utf8PathBuf::from_path_buf(entry.path())
            .map_err(|p| ContentError::NonUtf8(p.display().to_string()))?;
        let name = path.file_name().unwrap_or_default();
        if !ignorer.accepts(name) {
            debug!("Keeping ignored entry {}", path);
            continue;
        }

        let file_type = entry.file_type().map_err(|e| ContentError::io(&path, e))?;
        let result = if file_type.is_dir() {
            std::fs::remove_dir_all(&path)
        } else {
            std::fs::remove_file(&path)
        };
        result.map_err(|e| ContentError::io(&path, e))?;
    }
    Ok(())
}
