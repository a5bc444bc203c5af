use camino::Utf8Path;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use themekit_core::hashing::json_hash;
use themekit_core::path_utils::ThemePath;

#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Streamed SHA-256 of a file on disk, lowercase hex.
pub fn binary_hash(fs_path: &Utf8Path) -> Result<String, HashError> {
    let file = File::open(fs_path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Digest of a JSON document on disk, independent of whitespace and key order.
pub fn json_file_hash(fs_path: &Utf8Path) -> Result<String, HashError> {
    let content = std::fs::read(fs_path)?;
    let value: serde_json::Value = serde_json::from_slice(&content)?;
    Ok(json_hash(&value))
}

/// Hash a local file the way the remote side reports it for `rel_path`.
///
/// Theme files hash their bytes. Structured resources hash their parsed JSON;
/// a local page file already holds `route` next to its properties, matching the
/// remote page document. A file that cannot be parsed hashes to `None`, which
/// always differs from a remote digest.
pub fn file_hash(fs_path: &Utf8Path, rel_path: &str) -> Result<Option<String>, HashError> {
    if ThemePath::is_theme_file(rel_path) {
        return binary_hash(fs_path).map(Some);
    }

    let content = std::fs::read(fs_path)?;
    Ok(serde_json::from_slice::<serde_json::Value>(&content)
        .ok()
        .map(|value| json_hash(&value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::tempdir;

    #[test]
    fn structured_files_hash_parsed_json() {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let a = root.join("a.json");
        let b = root.join("b.json");
        std::fs::write(&a, r#"{"x": 1, "y": [1, 2]}"#).unwrap();
        std::fs::write(&b, "{\n    \"y\": [1,2],\n    \"x\": 1\n}").unwrap();

        assert_eq!(
            file_hash(&a, "/site/settings/a.json").unwrap(),
            file_hash(&b, "/site/settings/b.json").unwrap()
        );
        assert_eq!(json_file_hash(&a).unwrap(), json_file_hash(&b).unwrap());
    }

    #[test]
    fn broken_json_hashes_to_none() {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let broken = root.join("home.json");
        std::fs::write(&broken, "{ not json").unwrap();
        assert_eq!(file_hash(&broken, "/site/pages/home.json").unwrap(), None);
    }

    #[test]
    fn theme_files_hash_raw_bytes() {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let css = root.join("a.css");
        std::fs::write(&css, "abc").unwrap();
        assert_eq!(
            file_hash(&css, "/theme/a.css").unwrap().as_deref(),
            Some("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
    }
}
