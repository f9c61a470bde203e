//! Request key hashing.

use sha2::{Digest, Sha256};

use crate::RequestKey;

/// Compute the primary-key hash for a normalized request key.
pub fn compute_key_hash(key: &RequestKey) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.method().as_bytes());
    hasher.update(b"\n");
    hasher.update(key.url().as_str().as_bytes());
    hex::encode(hasher.finalize())
}
