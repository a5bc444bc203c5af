//! Debounced filesystem change tracking for watch mode.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use camino::Utf8Path;
use chrono::{DateTime, Utc};
use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use themekit_core::path_utils::ThemePath;
use themekit_infra::FileIgnorer;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::sync::local::collect_resource_files;

/// Net pending local changes, keyed by normalized theme path.
///
/// A path is present in at most one of the three maps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatcherStore {
    pub create: BTreeMap<String, DateTime<Utc>>,
    pub update: BTreeMap<String, DateTime<Utc>>,
    pub delete: BTreeMap<String, DateTime<Utc>>,
}

impl WatcherStore {
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }

    pub fn len(&self) -> usize {
        self.create.len() + self.update.len() + self.delete.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEvent {
    Add,
    Change,
    Unlink,
}

/// Collapses raw add/change/unlink events into one pending action per path.
#[derive(Debug, Default)]
pub struct ChangeAggregator {
    store: WatcherStore,
}

impl ChangeAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: WatchEvent, path: &str) {
        match event {
            WatchEvent::Add => self.on_add(path),
            WatchEvent::Change => self.on_change(path),
            WatchEvent::Unlink => self.on_unlink(path),
        }
    }

    /// A pending update already covers a re-added file.
    pub fn on_add(&mut self, path: &str) {
        if self.store.update.contains_key(path) {
            return;
        }
        self.store.delete.remove(path);
        self.store.create.insert(path.to_string(), Utc::now());
    }

    /// A pending create already uploads the latest content.
    pub fn on_change(&mut self, path: &str) {
        if self.store.create.contains_key(path) {
            return;
        }
        self.store.delete.remove(path);
        self.store.update.insert(path.to_string(), Utc::now());
    }

    /// Removing a file that was only ever pending creation is a no-op remotely.
    pub fn on_unlink(&mut self, path: &str) {
        if self.store.create.remove(path).is_some() {
            return;
        }
        self.store.update.remove(path);
        self.store.delete.insert(path.to_string(), Utc::now());
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.store.is_empty()
    }

    /// Hand out the pending store and start over empty.
    pub fn drain(&mut self) -> WatcherStore {
        std::mem::take(&mut self.store)
    }
}

/// Translate a notify event into add/change/unlink events per path.
///
/// Metadata-only modifications are dropped. Renames the platform cannot attribute are
/// decided by whether the path still exists. Paths may name directories; the watch
/// filter expands those into their files.
pub fn map_event(event: &Event) -> Vec<(WatchEvent, PathBuf)> {
    let mut out = Vec::new();
    for path in &event.paths {
        let mapped = match event.kind {
            EventKind::Create(_) => Some(WatchEvent::Add),
            EventKind::Modify(ModifyKind::Metadata(_)) => None,
            EventKind::Modify(ModifyKind::Name(mode)) => match mode {
                RenameMode::From => Some(WatchEvent::Unlink),
                RenameMode::To => Some(WatchEvent::Add),
                RenameMode::Both => {
                    // paths = [from, to]
                    if Some(path) == event.paths.first() {
                        Some(WatchEvent::Unlink)
                    } else {
                        Some(WatchEvent::Add)
                    }
                }
                RenameMode::Any | RenameMode::Other => {
                    if path.exists() {
                        Some(WatchEvent::Add)
                    } else {
                        Some(WatchEvent::Unlink)
                    }
                }
            },
            EventKind::Modify(_) => Some(WatchEvent::Change),
            EventKind::Remove(_) => Some(WatchEvent::Unlink),
            EventKind::Any | EventKind::Access(_) | EventKind::Other => None,
        };

        if let Some(mapped) = mapped {
            out.push((mapped, path.clone()));
        }
    }
    out
}

/// Decides which absolute paths are theme resources and how they are named.
///
/// `known` holds every resource file currently on disk, so a removed or renamed-away
/// directory can be expanded into the files it held.
struct WatchFilter {
    roots: Vec<PathBuf>,
    ignorer: FileIgnorer,
    ignore_delete: bool,
    known: BTreeSet<String>,
}

impl WatchFilter {
    /// Normalized theme path of `path`, without checking what it names.
    fn relative(&self, path: &Path) -> Option<String> {
        let relative = self
            .roots
            .iter()
            .find_map(|root| path.strip_prefix(root).ok())?;
        let relative = relative.to_str()?;
        if relative.is_empty() {
            return None;
        }
        Some(ThemePath::normalize(relative))
    }

    fn accepts(&self, theme_path: &str) -> bool {
        theme_path != "/theme"
            && ThemePath::classify(theme_path).is_some()
            && self.ignorer.accepts(theme_path)
    }

    /// Resource files below `dir` on disk, skipping ignored subtrees.
    fn files_under(&self, dir: &Path) -> Vec<String> {
        WalkDir::new(dir)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                self.relative(entry.path())
                    .map_or(true, |p| self.ignorer.accepts(&p))
            })
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| self.relative(entry.path()))
            .filter(|p| self.accepts(p))
            .collect()
    }

    /// Known files at `theme_path` itself or below it.
    fn known_under(&self, theme_path: &str) -> Vec<String> {
        if self.known.contains(theme_path) {
            return vec![theme_path.to_string()];
        }
        let prefix = format!("{theme_path}/");
        self.known
            .range(prefix.clone()..)
            .take_while(|p| p.starts_with(&prefix))
            .cloned()
            .collect()
    }

    /// Per-file events for one mapped event, updating the known set.
    fn expand(&mut self, kind: WatchEvent, path: &Path) -> Vec<(WatchEvent, String)> {
        let Some(theme_path) = self.relative(path) else {
            return Vec::new();
        };

        match kind {
            WatchEvent::Add if path.is_dir() => {
                let files = self.files_under(path);
                self.known.extend(files.iter().cloned());
                files.into_iter().map(|p| (WatchEvent::Add, p)).collect()
            }
            WatchEvent::Add | WatchEvent::Change => {
                if path.is_dir() || !self.accepts(&theme_path) {
                    return Vec::new();
                }
                self.known.insert(theme_path.clone());
                vec![(kind, theme_path)]
            }
            WatchEvent::Unlink => {
                let removed = self.known_under(&theme_path);
                for p in &removed {
                    self.known.remove(p);
                }
                if removed.is_empty() {
                    debug!("No known files under removed {}", theme_path);
                }
                removed.into_iter().map(|p| (WatchEvent::Unlink, p)).collect()
            }
        }
    }

    fn record(&mut self, aggregator: &Mutex<ChangeAggregator>, event: &Event) {
        for (kind, path) in map_event(event) {
            for (kind, theme_path) in self.expand(kind, &path) {
                if kind == WatchEvent::Unlink && self.ignore_delete {
                    continue;
                }
                debug!("{:?} {}", kind, theme_path);
                aggregator
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .apply(kind, &theme_path);
            }
        }
    }
}

/// Watches a theme directory and aggregates its changes until drained.
pub struct ThemeWatcher {
    aggregator: Arc<Mutex<ChangeAggregator>>,
    watcher: Option<RecommendedWatcher>,
}

impl ThemeWatcher {
    /// Start watching `theme_dir` recursively. With `ignore_delete`, removals are not recorded.
    pub fn start(
        theme_dir: &Utf8Path,
        ignorer: FileIgnorer,
        ignore_delete: bool,
    ) -> Result<Self, notify::Error> {
        let aggregator = Arc::new(Mutex::new(ChangeAggregator::new()));

        let mut roots = vec![theme_dir.as_std_path().to_path_buf()];
        // Event paths are reported canonicalized on some platforms.
        if let Ok(canonical) = std::fs::canonicalize(theme_dir) {
            if canonical != roots[0] {
                roots.push(canonical);
            }
        }
        let known = collect_resource_files(theme_dir, &ignorer)
            .into_iter()
            .map(|(_, rel)| rel)
            .collect();
        let mut filter = WatchFilter {
            roots,
            ignorer,
            ignore_delete,
            known,
        };

        let sink = aggregator.clone();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => filter.record(&sink, &event),
                Err(e) => warn!("Theme watcher error: {}", e),
            },
            Config::default(),
        )?;
        watcher.watch(theme_dir.as_std_path(), RecursiveMode::Recursive)?;
        info!("Watching {}", theme_dir);

        Ok(Self {
            aggregator,
            watcher: Some(watcher),
        })
    }

    pub fn has_pending_changes(&self) -> bool {
        self.aggregator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .has_pending_changes()
    }

    pub fn drain(&self) -> WatcherStore {
        self.aggregator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
    }

    pub fn is_running(&self) -> bool {
        self.watcher.is_some()
    }

    /// Release the filesystem watch. Safe to call more than once.
    pub fn stop(&mut self) {
        if self.watcher.take().is_some() {
            info!("Theme watcher stopped");
        }
    }
}
