//! Tarball integrity verification (spec §4.7 step 5, invariant 4).
//!
//! An `integrity` string is `<algo>-<base64(digest)>`; split on the first
//! `-`, compute `algo(bytes)`, and compare. `shasum` (a bare hex SHA-1) is
//! the registry's legacy fallback for packages published before
//! subresource-integrity strings existed — used only when `integrity` is
//! absent, same as the teacher's `verify_tarball_integrity`.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use sha1::{Digest as _, Sha1};
use sha2::{Sha256, Sha384, Sha512};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Verified,
    Mismatch,
    UnknownAlgorithm,
}

/// Verify `data` against an `<algo>-<base64>` integrity string.
pub fn verify_integrity(data: &[u8], integrity: &str) -> Verdict {
    let Some((algo, encoded)) = integrity.split_once('-') else {
        return Verdict::UnknownAlgorithm;
    };

    let Ok(expected) = STANDARD.decode(encoded) else {
        return Verdict::Mismatch;
    };

    let actual: Vec<u8> = match algo {
        "sha512" => Sha512::digest(data).to_vec(),
        "sha384" => Sha384::digest(data).to_vec(),
        "sha256" => Sha256::digest(data).to_vec(),
        _ => return Verdict::UnknownAlgorithm,
    };

    if actual == expected {
        Verdict::Verified
    } else {
        Verdict::Mismatch
    }
}

/// Verify `data` against a bare hex-encoded SHA-1 `shasum`, the registry's
/// legacy checksum field.
pub fn verify_shasum(data: &[u8], expected_hex: &str) -> bool {
    let mut hasher = Sha1::new();
    hasher.update(data);
    let actual = format!("{:x}", hasher.finalize());
    actual.eq_ignore_ascii_case(expected_hex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_matching_sha512() {
        let data = b"hello world";
        let digest = Sha512::digest(data);
        let integrity = format!("sha512-{}", STANDARD.encode(digest));
        assert_eq!(verify_integrity(data, &integrity), Verdict::Verified);
    }

    #[test]
    fn detects_mismatch() {
        let data = b"hello world";
        let digest = Sha512::digest(b"goodbye world");
        let integrity = format!("sha512-{}", STANDARD.encode(digest));
        assert_eq!(verify_integrity(data, &integrity), Verdict::Mismatch);
    }

    #[test]
    fn unknown_algorithm_is_reported() {
        assert_eq!(verify_integrity(b"x", "md5-abcd"), Verdict::UnknownAlgorithm);
    }

    #[test]
    fn malformed_integrity_string_is_mismatch_not_panic() {
        assert_eq!(verify_integrity(b"x", "not-a-valid-integrity-string!!"), Verdict::Mismatch);
    }

    #[test]
    fn shasum_roundtrip() {
        let data = b"hello world";
        let mut hasher = Sha1::new();
        hasher.update(data);
        let hex = format!("{:x}", hasher.finalize());
        assert!(verify_shasum(data, &hex));
        assert!(!verify_shasum(b"other", &hex));
    }
}
