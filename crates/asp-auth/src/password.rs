use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::error::{AuthError, AuthResult};

/// Argon2id password hashing.
///
/// Hashes are PHC strings carrying their own salt and parameters, so a
/// hash produced under one cost setting still verifies under another.
#[derive(Clone)]
pub struct Passwords {
    argon: Argon2<'static>,
}

impl Passwords {
    pub fn new(params: Params) -> Self {
        Self {
            argon: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    pub fn hash(&self, password: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AuthError::Hash(e.to_string()))
    }

    /// Returns `Ok(false)` on mismatch; malformed stored hashes are errors.
    pub fn verify(&self, password: &str, hash: &str) -> AuthResult<bool> {
        let parsed = PasswordHash::new(hash).map_err(|e| AuthError::Hash(e.to_string()))?;
        Ok(self
            .argon
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

impl Default for Passwords {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

impl std::fmt::Debug for Passwords {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Passwords").finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) fn cheap() -> Passwords {
    Passwords::new(Params::new(Params::MIN_M_COST, 1, 1, None).unwrap())
}
