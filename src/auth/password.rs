//! bcrypt password hashing

use crate::error::{Error, Result};

/// bcrypt only looks at the first 72 bytes of its input
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Salted, deliberately slow password hashing
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password with a fresh random salt.
    ///
    /// Fails with `Validation` for passwords bcrypt cannot represent exactly:
    /// longer than [`MAX_PASSWORD_BYTES`] or containing a NUL byte.
    pub fn hash(&self, password: &str) -> Result<String> {
        if !is_hashable(password) {
            return Err(Error::Validation(format!(
                "password must be at most {} bytes and contain no NUL characters",
                MAX_PASSWORD_BYTES
            )));
        }
        Ok(bcrypt::hash(password, self.cost)?)
    }

    /// Check a password against a stored digest.
    ///
    /// A digest that bcrypt cannot parse counts as a mismatch, and so does a
    /// password bcrypt would silently truncate.
    pub fn verify(&self, password: &str, digest: &str) -> bool {
        if !is_hashable(password) {
            return false;
        }

        match bcrypt::verify(password, digest) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!("Stored password digest could not be parsed: {}", e);
                false
            }
        }
    }
}

/// bcrypt keys on the first 72 bytes of a NUL-terminated string; anything
/// outside that would collide with a different password.
fn is_hashable(password: &str) -> bool {
    password.len() <= MAX_PASSWORD_BYTES && !password.contains('\0')
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}
