//! Password hashing and verification using Argon2.
//!
//! Hashes are salted PHC strings: two hashes of the same password differ,
//! and the plaintext is unrecoverable. Verification of a merely-wrong
//! password returns `false` rather than an error.

use anyhow::{Result, anyhow};
use argon2::password_hash::rand_core::OsRng;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};

/// Hash a plaintext password with a freshly generated salt.
pub fn hash_password(plain: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| anyhow!("Failed to hash password: {err}"))
}

/// Verify a plaintext password against a stored PHC-string digest.
///
/// Returns `false` both for a wrong password and for a digest that cannot
/// be parsed.
pub fn verify_password(plain: &str, digest: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(digest) else {
        return false;
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashing_is_salted_and_both_digests_verify() {
        let a = hash_password("hunter2").unwrap();
        let b = hash_password("hunter2").unwrap();

        assert_ne!(a, b);
        assert!(verify_password("hunter2", &a));
        assert!(verify_password("hunter2", &b));
    }

    #[test]
    fn wrong_password_does_not_verify() {
        let digest = hash_password("hunter2").unwrap();
        assert!(!verify_password("hunter3", &digest));
    }

    #[test]
    fn unparseable_digest_is_false_not_an_error() {
        assert!(!verify_password("hunter2", "not-a-phc-string"));
    }

    #[test]
    fn digest_does_not_contain_plaintext() {
        let digest = hash_password("hunter2").unwrap();
        assert!(!digest.contains("hunter2"));
    }
}
