pub mod fs;
pub mod hashing;
pub mod ignorer;
pub mod net;

// Re-exports for convenience
pub use fs::{ContentError, ContentSource, DiskContentSource};
pub use hashing::{binary_hash, file_hash, json_file_hash, HashError};
pub use ignorer::FileIgnorer;
pub use net::{HttpRemoteClient, RemoteClient, RemoteError};
