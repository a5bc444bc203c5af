//! Path filtering for local scans, watch events and pull task generation.

use ::ignore::gitignore::{Gitignore, GitignoreBuilder};
use camino::Utf8Path;
use themekit_config::{BASE_IGNORE_PATTERNS, IGNORE_FILE_PATH};
use themekit_core::path_utils::ThemePath;
use tracing::{debug, warn};

/// Gitignore-style matcher over theme-relative paths.
///
/// Always carries the base patterns; a `theme/.soignore` file adds more.
pub struct FileIgnorer {
    matcher: Gitignore,
}

impl FileIgnorer {
    /// Matcher with the base patterns plus `extra_patterns`.
    pub fn new(extra_patterns: &[&str]) -> Result<Self, ::ignore::Error> {
        let mut builder = GitignoreBuilder::new("");
        for pattern in BASE_IGNORE_PATTERNS.iter().chain(extra_patterns) {
            builder.add_line(None, pattern)?;
        }
        Ok(Self {
            matcher: builder.build()?,
        })
    }

    /// Base patterns only.
    pub fn base() -> Self {
        match Self::new(&[]) {
            Ok(ignorer) => ignorer,
            // The base patterns are static and valid; an empty matcher is the fallback.
            Err(_) => Self {
                matcher: Gitignore::empty(),
            },
        }
    }

    /// Load `theme/.soignore` under `theme_dir`. A missing or unreadable file
    /// falls back to the base patterns.
    pub fn from_ignore_file(theme_dir: &Utf8Path) -> Self {
        let ignore_file = theme_dir.join(IGNORE_FILE_PATH);
        let content = match std::fs::read_to_string(ignore_file.as_std_path()) {
            Ok(c) => c,
            Err(_) => {
                debug!("No ignore file at {}, using base patterns", ignore_file);
                return Self::base();
            }
        };

        let lines: Vec<&str> = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .collect();

        match Self::new(&lines) {
            Ok(ignorer) => ignorer,
            Err(e) => {
                warn!("Invalid pattern in {}: {}", ignore_file, e);
                Self::base()
            }
        }
    }

    /// True when no pattern matches `path` or any of its parent directories.
    pub fn accepts(&self, path: &str) -> bool {
        let relative = ThemePath::strip_leading_slash(path);
        if relative.is_empty() {
            return true;
        }
        !self
            .matcher
            .matched_path_or_any_parents(relative, false)
            .is_ignore()
    }
}

impl Default for FileIgnorer {
    fn default() -> Self {
        Self::base()
    }
}
