//! Test fixtures for creating sample digests and cache content.

use sha2::{Digest as _, Sha256};
use tidycache_core::Digest;

/// Factory for digests shaped like the ones the cache key scheme produces.
pub struct DigestFixture;

impl DigestFixture {
    /// SHA-256 digest of `input`.
    pub fn sha256(input: &str) -> Digest {
        Digest::new(Sha256::digest(input.as_bytes()).to_vec())
            .expect("sha256 digests are never empty")
    }

    /// `count` distinct digests.
    pub fn many(count: usize) -> Vec<Digest> {
        (0..count)
            .map(|i| Self::sha256(&format!("src/unit_{i}.cpp")))
            .collect()
    }

    /// A raw digest from literal bytes.
    pub fn raw(bytes: &[u8]) -> Digest {
        Digest::new(bytes.to_vec()).expect("fixture digests are non-empty")
    }
}

/// Sample clang-tidy output stored as cache content.
pub fn tidy_output(file: &str) -> Vec<u8> {
    format!(
        "{file}:12:5: warning: use auto when initializing with new [modernize-use-auto]\n"
    )
    .into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_many_are_distinct() {
        let digests = DigestFixture::many(50);
        let keys: std::collections::HashSet<_> =
            digests.iter().map(|d| d.object_key()).collect();
        assert_eq!(keys.len(), 50);
    }

    #[test]
    fn test_raw_digest_key() {
        assert_eq!(DigestFixture::raw(&[0xAB, 0xCD]).object_key().as_str(), "abcd");
    }
}
