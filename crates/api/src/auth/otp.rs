//! One-time verification codes for registration.
//!
//! Codes are 6 decimal digits, generated from the OS RNG. Only the SHA-256
//! digest is persisted, so a database leak does not expose codes that are
//! still deliverable.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Number of decimal digits in a verification code.
pub const CODE_LEN: usize = 6;

/// Generate a fresh verification code.
///
/// Returns `(plaintext, sha256_hex_hash)`. The plaintext goes to the email
/// notifier; only the hash may be persisted.
pub fn generate_code() -> (String, String) {
    let n: u32 = rand::rng().random_range(0..1_000_000);
    let plaintext = format!("{n:06}");
    let hash = hash_code(&plaintext);
    (plaintext, hash)
}

/// Compute the SHA-256 hex digest of a code.
pub fn hash_code(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Compare a submitted code against the stored digest.
pub fn code_matches(code: &str, stored_hash: &str) -> bool {
    hash_code(code) == stored_hash
}
