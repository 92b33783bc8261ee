//! Content fingerprint of a video file
//!
//! SHA-256 over the first `window` bytes only, so opening a multi-gigabyte
//! file stays instant. Edits past the window go unnoticed.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Default hashed prefix length
pub const DEFAULT_WINDOW: usize = 8192;

/// Hex characters kept from the digest
pub const FINGERPRINT_LEN: usize = 16;

/// Compute the fingerprint of `path`
///
/// Upper-case hex, truncated to [`FINGERPRINT_LEN`]. An unreadable file
/// yields an empty string, which never matches a stored fingerprint.
pub fn compute_fingerprint(path: &Path, window: usize) -> String {
    match read_prefix(path, window) {
        Ok(prefix) => {
            let digest = Sha256::digest(&prefix);
            let mut encoded = hex::encode_upper(digest);
            encoded.truncate(FINGERPRINT_LEN);
            encoded
        }
        Err(e) => {
            tracing::debug!("Cannot fingerprint {}: {}", path.display(), e);
            String::new()
        }
    }
}

fn read_prefix(path: &Path, window: usize) -> std::io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut prefix = Vec::with_capacity(window);
    file.take(window as u64).read_to_end(&mut prefix)?;
    Ok(prefix)
}

/// Case-insensitive comparison; an empty fingerprint never matches
pub fn fingerprints_match(actual: &str, expected: &str) -> bool {
    !actual.is_empty() && actual.eq_ignore_ascii_case(expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file_with(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn fingerprint_is_truncated_upper_hex() {
        let file = file_with(b"hello");
        let fingerprint = compute_fingerprint(file.path(), DEFAULT_WINDOW);

        // sha256("hello") = 2cf24dba5fb0a30e...
        assert_eq!(fingerprint, "2CF24DBA5FB0A30E");
    }

    #[test]
    fn bytes_past_window_are_ignored() {
        let mut a = vec![7u8; 100];
        let mut b = a.clone();
        a.extend_from_slice(b"tail one");
        b.extend_from_slice(b"different tail");

        let a = file_with(&a);
        let b = file_with(&b);

        assert_eq!(
            compute_fingerprint(a.path(), 100),
            compute_fingerprint(b.path(), 100)
        );
        assert_ne!(
            compute_fingerprint(a.path(), 200),
            compute_fingerprint(b.path(), 200)
        );
    }

    #[test]
    fn missing_file_fingerprints_empty() {
        let fingerprint = compute_fingerprint(Path::new("/definitely/not/here.mp4"), 16);
        assert!(fingerprint.is_empty());
    }

    #[test]
    fn match_ignores_case_but_not_empty() {
        assert!(fingerprints_match("2CF24DBA5FB0A30E", "2cf24dba5fb0a30e"));
        assert!(!fingerprints_match("2CF24DBA5FB0A30E", "2CF24DBA5FB0A30F"));
        assert!(!fingerprints_match("", ""));
    }
}
