//! Digests and the object keys derived from them.
//!
//! A digest is produced by the caller's hashing scheme and is never parsed
//! here. Its object key is the lowercase hex encoding of the raw bytes; the
//! encoding must stay stable so independent writers can share a bucket.

use crate::{Error, Result};
use std::fmt;

/// Opaque, non-empty binary cache key.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Digest(Vec<u8>);

impl Digest {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(Error::InvalidDigest("digest must not be empty".into()));
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Store-native key for this digest.
    pub fn object_key(&self) -> ObjectKey {
        ObjectKey(hex::encode(&self.0))
    }
}

impl TryFrom<&[u8]> for Digest {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        Self::new(bytes)
    }
}

impl TryFrom<Vec<u8>> for Digest {
    type Error = Error;

    fn try_from(bytes: Vec<u8>) -> Result<Self> {
        Self::new(bytes)
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", hex::encode(&self.0))
    }
}

/// Lowercase hex text of a [`Digest`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey(String);

impl ObjectKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sha2::{Digest as _, Sha256};
    use std::collections::HashSet;

    #[test]
    fn test_empty_digest_rejected() {
        let err = Digest::new(Vec::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidDigest(_)));
        assert!(Digest::try_from(&[] as &[u8]).is_err());
    }

    #[test]
    fn test_object_key_is_lowercase_hex() {
        let digest = Digest::new(vec![0xAB, 0xCD, 0x01]).unwrap();
        assert_eq!(digest.object_key().as_str(), "abcd01");
    }

    #[test]
    fn test_object_key_keeps_leading_zeros() {
        let digest = Digest::new(vec![0x00, 0x01]).unwrap();
        assert_eq!(digest.object_key().to_string(), "0001");
    }

    #[test]
    fn test_object_key_deterministic() {
        let a = Digest::new(Sha256::digest(b"main.cpp").to_vec()).unwrap();
        let b = Digest::new(Sha256::digest(b"main.cpp").to_vec()).unwrap();
        assert_eq!(a.object_key(), b.object_key());
        assert_eq!(a.object_key().as_str().len(), 64);
    }

    #[test]
    fn test_object_keys_do_not_collide() {
        let keys: HashSet<ObjectKey> = (0..1000u32)
            .map(|i| {
                let hash = Sha256::digest(format!("translation-unit-{i}").as_bytes());
                Digest::new(hash.to_vec()).unwrap().object_key()
            })
            .collect();
        assert_eq!(keys.len(), 1000);
    }

    #[test]
    fn test_length_prefix_does_not_collide() {
        let short = Digest::new(vec![0x0a]).unwrap();
        let long = Digest::new(vec![0x00, 0xa0]).unwrap();
        assert_ne!(short.object_key(), long.object_key());
    }
}
