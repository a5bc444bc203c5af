use crate::{DeltaState, FileState, ThemeState};
use std::collections::{HashMap, HashSet};

/// Classify how `local` diverges from `remote`.
///
/// Local-only paths are created, paths whose hashes differ are updated, and
/// remote-only paths are deleted unless `omit_delete` is set.
pub fn diff(local: &ThemeState, remote: &ThemeState, omit_delete: bool) -> DeltaState {
    let mut delta = DeltaState::default();

    // First entry wins on duplicate paths, same as a front-to-back scan.
    let mut remote_by_path: HashMap<&str, &FileState> = HashMap::with_capacity(remote.files.len());
    for file in &remote.files {
        remote_by_path.entry(file.path.as_str()).or_insert(file);
    }

    for local_file in &local.files {
        match remote_by_path.get(local_file.path.as_str()) {
            Some(remote_file) => {
                if remote_file.hash != local_file.hash {
                    delta.update.push(local_file.clone());
                }
            }
            None => delta.create.push(local_file.clone()),
        }
    }

    if !omit_delete {
        let local_paths: HashSet<&str> = local.files.iter().map(|f| f.path.as_str()).collect();
        for remote_file in &remote.files {
            if !local_paths.contains(remote_file.path.as_str()) {
                delta.delete.push(remote_file.clone());
            }
        }
    }

    delta
}

pub fn has_changes(delta: &DeltaState) -> bool {
    delta.has_changes()
}
