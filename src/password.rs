use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use log::warn;

/// Hash a password using Argon2
///
/// Creates a salted Argon2id hash in PHC string format. Two calls with the
/// same password produce different strings; use [`verify_password`] to
/// compare.
///
/// # Errors
/// * Returns an error if the password hashing fails
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored hash
///
/// A stored hash that is not a valid PHC string never matches.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("stored password hash is malformed: {e}");
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_salted_and_verifies() {
        let first = hash_password("pw1").unwrap();
        let second = hash_password("pw1").unwrap();

        assert_ne!(first, "pw1");
        assert_ne!(first, second);
        assert!(first.starts_with("$argon2id$"));
        assert!(verify_password("pw1", &first));
        assert!(verify_password("pw1", &second));
        assert!(!verify_password("wrong", &first));
    }

    #[test]
    fn malformed_hash_never_matches() {
        assert!(!verify_password("pw1", "pw1"));
        assert!(!verify_password("", ""));
    }
}
