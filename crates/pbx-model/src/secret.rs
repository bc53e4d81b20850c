//! Secret hashing
//!
//! Extension passwords are stored as salted SHA-256 digests in the form
//! `sha256$<salt>$<digest>`, where the digest covers the salt followed by
//! the plaintext. The plaintext is only held transiently while rendering
//! engine configuration.
//!
//! A bare 64-character hex digest (unsalted) is still accepted by
//! [`secret_matches`] so older inventories keep verifying.

use sha2::{Digest, Sha256};
use uuid::Uuid;

const SCHEME: &str = "sha256";

fn digest(salt: &str, plaintext: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(plaintext.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Salted digest of a plaintext secret, with a fresh random salt.
pub fn hash_secret(plaintext: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    hash_secret_with_salt(plaintext, &salt)
}

/// Salted digest of `plaintext` using `salt`.
pub fn hash_secret_with_salt(plaintext: &str, salt: &str) -> String {
    format!("{}${}${}", SCHEME, salt, digest(salt, plaintext))
}

/// Whether `plaintext` hashes to `hash`.
pub fn secret_matches(plaintext: &str, hash: &str) -> bool {
    match hash.split('$').collect::<Vec<_>>().as_slice() {
        [SCHEME, salt, expected] => digest(salt, plaintext).eq_ignore_ascii_case(expected),
        [legacy] => digest("", plaintext).eq_ignore_ascii_case(legacy),
        _ => false,
    }
}
