//! Password verification
//!
//! Hash algorithm selection belongs to whoever provisions the user mapping.
//! The core only needs a yes/no answer for `(plaintext, stored_hash)`, which
//! [`PasswordVerifier`] provides. [`PasswordAuthVerifier`] is the default and
//! accepts PHC-format hashes (argon2, scrypt, pbkdf2) via `password-auth`.

/// Checks a plaintext password against a stored hash.
pub trait PasswordVerifier: Send + Sync + 'static {
    /// `true` only if `password` matches `stored_hash`. Malformed hashes
    /// verify as `false`.
    fn verify(&self, password: &str, stored_hash: &str) -> bool;

    /// A well-formed hash that no real password is expected to match.
    ///
    /// Used for unknown usernames so that a miss costs the same as a wrong
    /// password.
    fn decoy_hash(&self) -> Option<&str> {
        None
    }
}

/// [`PasswordVerifier`] backed by the `password-auth` crate.
pub struct PasswordAuthVerifier {
    decoy_hash: String,
}

impl PasswordAuthVerifier {
    pub fn new() -> Self {
        Self {
            decoy_hash: password_auth::generate_hash("portcullis-decoy-password"),
        }
    }
}

impl Default for PasswordAuthVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordVerifier for PasswordAuthVerifier {
    fn verify(&self, password: &str, stored_hash: &str) -> bool {
        password_auth::verify_password(password, stored_hash).is_ok()
    }

    fn decoy_hash(&self) -> Option<&str> {
        Some(&self.decoy_hash)
    }
}

impl std::fmt::Debug for PasswordAuthVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordAuthVerifier").finish_non_exhaustive()
    }
}
