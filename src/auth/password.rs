use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashCost {
    /// 19 MiB, 2 iterations, 1 lane.
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("invalid hash parameters: {0}")]
    InvalidParams(String),

    #[error("hashing failed: {0}")]
    HashingFailed(String),

    #[error("hashing task failed: {0}")]
    TaskFailed(String),
}

/// Salted one-way password hashing.
///
/// `verify` takes its cost from the stored PHC string, so raising the cost
/// only affects new hashes.
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    // Verified against when the account does not exist, so unknown emails
    // cost the same as wrong passwords.
    dummy_hash: Arc<str>,
}

impl PasswordHasher {
    pub fn new(cost: HashCost) -> Result<Self, PasswordError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;

        let mut hasher = Self {
            params,
            dummy_hash: Arc::from(""),
        };
        let filler = SaltString::generate(&mut OsRng);
        hasher.dummy_hash = Arc::from(hasher.hash(filler.as_str())?);
        Ok(hasher)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    /// Fails closed: an unparseable stored hash never matches.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Stored password hash could not be parsed: {e}");
                return false;
            }
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// Hash on the blocking pool.
    pub async fn hash_async(&self, password: String) -> Result<String, PasswordError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| PasswordError::TaskFailed(e.to_string()))?
    }

    /// Verify on the blocking pool. With no stored hash the dummy hash is
    /// checked instead and the result is always `false`.
    pub async fn verify_async(&self, password: String, hash: Option<String>) -> bool {
        let hasher = self.clone();
        let outcome = tokio::task::spawn_blocking(move || match hash {
            Some(hash) => hasher.verify(&password, &hash),
            None => {
                let _ = hasher.verify(&password, &hasher.dummy_hash);
                false
            }
        })
        .await;

        match outcome {
            Ok(valid) => valid,
            Err(e) => {
                tracing::error!("Password verification task failed: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> PasswordHasher {
        PasswordHasher::new(HashCost {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    #[test]
    fn hash_is_not_the_plaintext_and_verifies() {
        let hasher = cheap();
        let hash = hasher.hash("correct horse").unwrap();

        assert_ne!(hash, "correct horse");
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("correct horse", &hash));
        assert!(!hasher.verify("wrong horse", &hash));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let hasher = cheap();
        let first = hasher.hash("correct horse").unwrap();
        let second = hasher.hash("correct horse").unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify("correct horse", &first));
        assert!(hasher.verify("correct horse", &second));
    }

    #[test]
    fn malformed_hash_fails_closed() {
        let hasher = cheap();
        assert!(!hasher.verify("anything", "not-a-phc-string"));
        assert!(!hasher.verify("anything", ""));
    }

    #[test]
    fn verify_uses_cost_from_stored_hash() {
        let hash = cheap().hash("correct horse").unwrap();
        let stronger = PasswordHasher::new(HashCost {
            memory_kib: 2048,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();
        assert!(stronger.verify("correct horse", &hash));
    }

    #[test]
    fn rejects_invalid_cost() {
        let result = PasswordHasher::new(HashCost {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        });
        assert!(matches!(result, Err(PasswordError::InvalidParams(_))));
    }

    #[tokio::test]
    async fn async_round_trip() {
        let hasher = cheap();
        let hash = hasher.hash_async("correct horse".to_string()).await.unwrap();

        assert!(hasher.verify_async("correct horse".to_string(), Some(hash.clone())).await);
        assert!(!hasher.verify_async("nope".to_string(), Some(hash)).await);
    }

    #[tokio::test]
    async fn missing_hash_never_verifies() {
        let hasher = cheap();
        assert!(!hasher.verify_async("correct horse".to_string(), None).await);
    }
}
