use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of raw bytes. Used for theme files.
pub fn content_hash(content: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_ref());
    hex::encode(hasher.finalize())
}

/// Digest of a structured resource.
///
/// Deliberately canonical: `serde_json::Value` objects keep their keys sorted, so the
/// digest covers content rather than the order keys were written in. Two documents that
/// differ only in key order hash identically and a reordered file is not pushed as an
/// update.
pub fn json_hash(value: &serde_json::Value) -> String {
    content_hash(value.to_string())
}
