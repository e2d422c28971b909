use std::sync::Arc;
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};

use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::error;

use crate::config::HashingConfig;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),
}

/// Argon2id hasher with a fixed work factor.
///
/// Verification reads the parameters embedded in the stored PHC string, so
/// hashes created under an older work factor keep verifying.
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    /// Hash under the configured work factor, verified against when there is no stored hash.
    decoy: Arc<str>,
    #[cfg(test)]
    verifications: Arc<AtomicUsize>,
}

const DECOY_PASSWORD: &str = "eventhub-decoy-password";

impl PasswordHasher {
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, PasswordError> {
        let params = Params::new(memory_kib, iterations, parallelism, None).map_err(|e| {
            error!(error = %e, memory_kib, iterations, parallelism, "argon2 params rejected");
            PasswordError::Hashing(e.to_string())
        })?;
        let mut hasher = Self {
            params,
            decoy: Arc::from(""),
            #[cfg(test)]
            verifications: Arc::default(),
        };
        hasher.decoy = Arc::from(hasher.hash(DECOY_PASSWORD)?);
        Ok(hasher)
    }

    pub fn from_config(cfg: &HashingConfig) -> Result<Self, PasswordError> {
        Self::new(cfg.memory_kib, cfg.iterations, cfg.parallelism)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, plain: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                PasswordError::Hashing(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    pub fn verify(&self, plain: &str, hash: &str) -> Result<bool, PasswordError> {
        #[cfg(test)]
        self.verifications.fetch_add(1, Ordering::SeqCst);

        let parsed = PasswordHash::new(hash).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            PasswordError::MalformedHash(e.to_string())
        })?;
        match self.argon2().verify_password(plain.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => {
                error!(error = %e, "argon2 verify_password error");
                Err(PasswordError::MalformedHash(e.to_string()))
            }
        }
    }

    /// Spend the same work as [`verify`](Self::verify) when there is no account to check.
    pub fn verify_decoy(&self, plain: &str) -> Result<(), PasswordError> {
        self.verify(plain, &self.decoy).map(|_| ())
    }

    #[cfg(test)]
    pub(crate) fn verifications(&self) -> usize {
        self.verifications.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimum-cost parameters keep the suite fast.
    fn hasher() -> PasswordHasher {
        PasswordHasher::new(Params::MIN_M_COST, 1, 1).expect("valid params")
    }

    #[test]
    fn hash_and_verify_roundtrip() {
        let h = hasher();
        let password = "Secur3P@ssw0rd!";
        let hash = h.hash(password).expect("hashing should succeed");
        assert_ne!(hash, password);
        assert!(h.verify(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let h = hasher();
        let a = h.hash("password1").expect("hash a");
        let b = h.hash("password1").expect("hash b");
        assert_ne!(a, b);
        assert!(h.verify("password1", &a).expect("verify a"));
        assert!(h.verify("password1", &b).expect("verify b"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let h = hasher();
        let hash = h.hash("correct-horse-battery-staple").expect("hash");
        assert!(!h.verify("wrong-password", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = hasher().verify("anything", "not-a-valid-hash").unwrap_err();
        assert!(matches!(err, PasswordError::MalformedHash(_)));
    }

    #[test]
    fn out_of_range_cost_is_rejected() {
        let err = PasswordHasher::new(1, 0, 1).err().expect("zero iterations rejected");
        assert!(matches!(err, PasswordError::Hashing(_)));
    }

    #[test]
    fn decoy_uses_configured_cost() {
        let h = PasswordHasher::new(Params::MIN_M_COST * 2, 2, 1).expect("params");
        let decoy = PasswordHash::new(&h.decoy).expect("decoy parses");
        let params = Params::try_from(&decoy).expect("decoy params");
        assert_eq!(params.m_cost(), Params::MIN_M_COST * 2);
        assert_eq!(params.t_cost(), 2);

        h.verify_decoy("password1").expect("decoy verify");
        assert_eq!(h.verifications(), 1);
    }

    #[test]
    fn hashes_from_another_cost_still_verify() {
        let weak = hasher();
        let hash = weak.hash("password1").expect("hash");
        let stronger = PasswordHasher::new(Params::MIN_M_COST * 2, 2, 1).expect("params");
        assert!(stronger.verify("password1", &hash).expect("verify"));
    }
}
