//! Central configuration constants for runtime limits and defaults.

/// Tasks executed concurrently per batch during a push.
pub const DEFAULT_PUSH_BATCH_SIZE: usize = 4;

/// Tasks executed concurrently per batch during a pull.
pub const DEFAULT_PULL_BATCH_SIZE: usize = 8;

/// Minimum allowed batch size.
pub const MIN_BATCH_SIZE: usize = 1;

/// Maximum allowed batch size.
pub const MAX_BATCH_SIZE: usize = 32;

/// How often watch mode drains pending filesystem changes (milliseconds).
pub const WATCH_POLL_INTERVAL_MS: u64 = 1500;

/// Upper bound (exclusive) for a theme file upload. 15 MiB.
pub const MAX_THEME_FILE_BYTE_SIZE: u64 = 15 * 1024 * 1024;

pub const DEFAULT_API_HOST: &str = "https://connect.squareup.com/";

/// Value sent in the `Square-Version` header.
pub const API_VERSION: &str = "2021-05-13";

/// Page size for paginated listings.
pub const LIST_PAGE_LIMIT: usize = 15;

/// Ignore file, relative to the theme directory.
pub const IGNORE_FILE_PATH: &str = "theme/.soignore";

/// Patterns that are always ignored, in gitignore syntax.
pub const BASE_IGNORE_PATTERNS: &[&str] = &[
    "_darcs",
    "CVS",
    "config.yml",
    "node_modules",
    ".git",
    ".DS_Store",
    ".soignore",
    ".dockerignore",
    ".gitmodules",
];

/// Clamp a batch size into the allowed range.
pub fn clamp_batch_size(v: usize) -> usize {
    v.clamp(MIN_BATCH_SIZE, MAX_BATCH_SIZE)
}
