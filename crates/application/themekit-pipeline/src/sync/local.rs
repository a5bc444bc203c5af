use camino::{Utf8Path, Utf8PathBuf};
use rayon::prelude::*;
use themekit_core::path_utils::ThemePath;
use themekit_core::{FileState, ThemeState};
use themekit_infra::hashing::file_hash;
use themekit_infra::FileIgnorer;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::sync::SyncError;

/// Theme path of `fs_path` relative to `root`, with forward slashes and a leading `/`.
fn theme_path(root: &Utf8Path, fs_path: &std::path::Path) -> Option<String> {
    let relative = fs_path.strip_prefix(root.as_std_path()).ok()?;
    let relative = relative.to_str()?;
    if relative.is_empty() {
        return None;
    }
    Some(ThemePath::normalize(relative))
}

/// Collect the resource files under `root`, pruning ignored directories.
pub fn collect_resource_files(
    root: &Utf8Path,
    ignorer: &FileIgnorer,
) -> Vec<(Utf8PathBuf, String)> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root).follow_links(false).into_iter();
    let entries = walker.filter_entry(|entry| match theme_path(root, entry.path()) {
        Some(path) => ignorer.accepts(&path),
        None => true,
    });

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", root, e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(rel) = theme_path(root, entry.path()) else {
            continue;
        };
        if ThemePath::classify(&rel).is_none() {
            continue;
        }
        let Ok(fs_path) = Utf8PathBuf::from_path_buf(entry.into_path()) else {
            debug!("Skipping non UTF-8 path {}", rel);
            continue;
        };
        files.push((fs_path, rel));
    }
    files
}

/// Build the local snapshot: every accepted resource file, hashed in parallel.
pub async fn scan_local_state(
    root: &Utf8Path,
    ignorer: FileIgnorer,
) -> Result<ThemeState, SyncError> {
    let root = root.to_owned();
    tokio::task::spawn_blocking(move || {
        if !root.is_dir() {
            return Err(SyncError::Local(format!("{root} is not a directory")));
        }
        let files = collect_resource_files(&root, &ignorer);
        let states: Result<Vec<FileState>, SyncError> = files
            .par_iter()
            .map(|(fs_path, rel)| {
                file_hash(fs_path, rel)
                    .map(|hash| FileState::new(rel.clone(), hash))
                    .map_err(|e| SyncError::Local(format!("hash {fs_path} failed: {e}")))
            })
            .collect();
        let mut files = states?;
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(ThemeState { files })
    })
    .await
    .map_err(|e| SyncError::Local(format!("scan join failed: {e}")))?
}
