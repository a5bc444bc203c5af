//! Conversion of deltas, remote listings and watcher drains into task payloads.
//!
//! Paths that do not classify to a resource kind are dropped here.

use themekit_core::path_utils::ThemePath;
use themekit_core::{Action, DeltaState, RemoteResource, ResourceListing};
use themekit_infra::FileIgnorer;
use tracing::debug;

use super::TaskPayload;
use crate::watcher::WatcherStore;

fn push_payload(action: Action, path: &str) -> Option<TaskPayload> {
    let path = ThemePath::normalize(path);
    match ThemePath::classify(&path) {
        Some(kind) => Some(TaskPayload::push(kind, action, path)),
        None => {
            debug!("Skipping unclassified path {}", path);
            None
        }
    }
}

pub fn from_delta(delta: &DeltaState) -> Vec<TaskPayload> {
    delta
        .entries()
        .filter_map(|(action, file)| push_payload(action, &file.path))
        .collect()
}

pub fn from_watcher_store(store: &WatcherStore) -> Vec<TaskPayload> {
    let creates = store.create.keys().map(|p| (Action::Create, p));
    let updates = store.update.keys().map(|p| (Action::Update, p));
    let deletes = store.delete.keys().map(|p| (Action::Delete, p));
    creates
        .chain(updates)
        .chain(deletes)
        .filter_map(|(action, path)| push_payload(action, path))
        .collect()
}

/// One download per listed resource whose local target path the ignorer accepts.
pub fn from_pull_listing(listing: &ResourceListing, ignorer: &FileIgnorer) -> Vec<TaskPayload> {
    let resources = listing
        .theme_files
        .iter()
        .cloned()
        .map(RemoteResource::ThemeFile)
        .chain(
            listing
                .global_elements
                .iter()
                .cloned()
                .map(RemoteResource::GlobalElement),
        )
        .chain(listing.pages.iter().cloned().map(RemoteResource::Page))
        .chain(listing.settings.iter().cloned().map(RemoteResource::Setting));

    resources
        .filter_map(|resource| {
            let path = ThemePath::pull_path(&resource);
            if ignorer.accepts(&path) {
                Some(TaskPayload::download(path, resource))
            } else {
                debug!("Ignoring {}", path);
                None
            }
        })
        .collect()
}
