//! PBKDF2-HMAC-SHA256 password hashing.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// Iterations used for stored passwords.
pub const DEFAULT_ITERATIONS: u32 = 200_000;

/// Random salt length in bytes.
pub const SALT_LEN: usize = 16;

/// Derived key length in bytes (SHA-256 output).
pub const HASH_LEN: usize = 32;

/// Fresh random salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}

/// Derive the stored hash of a password.
pub fn hash_password(password: &str, salt: &[u8], iterations: u32) -> [u8; HASH_LEN] {
    let mut hash = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut hash);
    hash
}

/// Check a password against a stored salt and hash in constant time.
pub fn verify_password(password: &str, salt: &[u8], expected: &[u8], iterations: u32) -> bool {
    let candidate = hash_password(password, salt, iterations);
    candidate[..].ct_eq(expected).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_matches_only_same_password() {
        let salt = generate_salt();
        let hash = hash_password("secret", &salt, 10);

        assert!(verify_password("secret", &salt, &hash, 10));
        assert!(!verify_password("Secret", &salt, &hash, 10));
        assert!(!verify_password("secret", &salt, &hash, 11));
    }

    #[test]
    fn test_salt_changes_hash() {
        let first = hash_password("secret", &[1u8; SALT_LEN], 10);
        let second = hash_password("secret", &[2u8; SALT_LEN], 10);
        assert_ne!(first, second);
    }

    #[test]
    fn test_truncated_hash_never_verifies() {
        let salt = generate_salt();
        let hash = hash_password("secret", &salt, 10);
        assert!(!verify_password("secret", &salt, &hash[..16], 10));
    }

    #[test]
    fn test_known_vector() {
        // RFC 7914 section 11, first PBKDF2-HMAC-SHA256 vector.
        let hash = hash_password("passwd", b"salt", 1);
        assert_eq!(
            hash[..8],
            [0x55, 0xac, 0x04, 0x6e, 0x56, 0xe3, 0x08, 0x9f]
        );
    }
}
