use std::collections::HashSet;
use themekit_core::diff::{diff, has_changes};
use themekit_core::{FileState, ThemeState};

// --- Helper Functions to build snapshots easily ---

fn file(path: &str, hash: &str) -> FileState {
    FileState::new(path, Some(hash.to_string()))
}

fn snapshot(files: Vec<FileState>) -> ThemeState {
    ThemeState { files }
}

fn paths(files: &[FileState]) -> Vec<&str> {
    files.iter().map(|f| f.path.as_str()).collect()
}

// --- Tests ---

#[test]
fn test_identical_snapshots_produce_empty_delta() {
    let s = snapshot(vec![
        file("/theme/a.css", "H1"),
        file("/site/pages/home.json", "H2"),
        file("/site/settings/colors.json", "H3"),
    ]);

    let delta = diff(&s, &s, false);

    assert!(!has_changes(&delta));
    assert!(delta.create.is_empty());
    assert!(delta.update.is_empty());
    assert!(delta.delete.is_empty());
}

#[test]
fn test_end_to_end_update_and_delete() {
    let local = snapshot(vec![file("/theme/a.css", "H1")]);
    let remote = snapshot(vec![file("/theme/a.css", "H2"), file("/theme/b.css", "H3")]);

    let delta = diff(&local, &remote, false);

    assert!(delta.create.is_empty());
    assert_eq!(delta.update, vec![file("/theme/a.css", "H1")]);
    assert_eq!(delta.delete, vec![file("/theme/b.css", "H3")]);
    assert!(has_changes(&delta));
}

#[test]
fn test_local_only_file_is_created() {
    let local = snapshot(vec![file("/theme/new.js", "N")]);
    let remote = snapshot(vec![]);

    let delta = diff(&local, &remote, false);

    assert_eq!(paths(&delta.create), vec!["/theme/new.js"]);
    assert!(delta.update.is_empty());
    assert!(delta.delete.is_empty());
}

#[test]
fn test_omit_delete_drops_remote_only_files() {
    let local = snapshot(vec![file("/theme/a.css", "H1")]);
    let remote = snapshot(vec![file("/theme/a.css", "H1"), file("/theme/old.css", "O")]);

    let delta = diff(&local, &remote, true);

    assert!(!has_changes(&delta), "remote-only file must be absent entirely");
}

#[test]
fn test_equal_hash_suppresses_entry() {
    let local = snapshot(vec![file("/site/pages/home.json", "same")]);
    let remote = snapshot(vec![file("/site/pages/home.json", "same")]);

    let delta = diff(&local, &remote, false);
    assert!(!has_changes(&delta));
}

#[test]
fn test_every_path_lands_in_at_most_one_list() {
    let local = snapshot(vec![
        file("/theme/a.css", "1"),
        file("/theme/b.css", "2"),
        file("/theme/c.css", "3"),
        file("/site/pages/p.json", "4"),
    ]);
    let remote = snapshot(vec![
        file("/theme/a.css", "1"),
        file("/theme/b.css", "changed"),
        file("/theme/d.css", "5"),
        file("/site/settings/s.json", "6"),
    ]);

    let delta = diff(&local, &remote, false);

    let mut seen = HashSet::new();
    for f in delta.create.iter().chain(&delta.update).chain(&delta.delete) {
        assert!(seen.insert(f.path.clone()), "{} appeared twice", f.path);
    }

    assert_eq!(paths(&delta.create), vec!["/theme/c.css", "/site/pages/p.json"]);
    assert_eq!(paths(&delta.update), vec!["/theme/b.css"]);
    assert_eq!(paths(&delta.delete), vec!["/theme/d.css", "/site/settings/s.json"]);
}

#[test]
fn test_delta_preserves_local_order() {
    let local = snapshot(vec![
        file("/theme/z.css", "1"),
        file("/theme/a.css", "2"),
        file("/theme/m.css", "3"),
    ]);
    let delta = diff(&local, &snapshot(vec![]), false);
    assert_eq!(
        paths(&delta.create),
        vec!["/theme/z.css", "/theme/a.css", "/theme/m.css"]
    );
}
