//! Claim hashing
//!
//! Domain-separated SHA-256 over a list of length-prefixed fields, used to
//! fingerprint crop batch claims for external anchoring.

use sha2::{Sha256, Digest};
use constant_time_eq::constant_time_eq_32;

/// Hash several fields under a domain tag
///
/// The domain, the field count and every field length are absorbed before
/// the field bytes, so no two distinct field lists share an encoding.
///
/// # Arguments
///
/// * `domain` - Domain tag (e.g., "CROPREGISTRY_BATCH")
/// * `fields` - Fields to hash, in order
///
/// # Returns
///
/// A 32-byte SHA-256 digest with domain separation
pub fn secure_hash_multiple(domain: &str, fields: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();

    hasher.update((domain.len() as u64).to_be_bytes());
    hasher.update(domain.as_bytes());
    hasher.update((fields.len() as u64).to_be_bytes());

    for field in fields {
        hasher.update((field.len() as u64).to_be_bytes());
        hasher.update(field);
    }

    let mut output = [0u8; 32];
    output.copy_from_slice(&hasher.finalize());
    output
}

/// Compare two hashes in constant time
///
/// # Arguments
///
/// * `expected` - Expected hash value
/// * `actual` - Actual hash value to verify
///
/// # Returns
///
/// True if the hashes match, false otherwise
pub fn verify_hash(expected: &[u8; 32], actual: &[u8; 32]) -> bool {
    constant_time_eq_32(expected, actual)
}
