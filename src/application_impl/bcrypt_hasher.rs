use crate::application_port::{CredentialHasher, HashError};

pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        BcryptHasher { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

// bcrypt is deliberately slow; keep it off the async workers.
#[async_trait::async_trait]
impl CredentialHasher for BcryptHasher {
    async fn hash_password(&self, password: &str) -> Result<String, HashError> {
        let password = password.to_owned();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| HashError::InternalError(e.to_string()))?
            .map_err(|e| HashError::InternalError(e.to_string()))
    }

    async fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, HashError> {
        let password = password.to_owned();
        let password_hash = password_hash.to_owned();
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &password_hash))
            .await
            .map_err(|e| HashError::InternalError(e.to_string()))?
            .map_err(|e| HashError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn verifies_own_hash() {
        let hasher = BcryptHasher::new(4);
        let hash = hasher.hash_password("secret").await.unwrap();
        assert!(hash.starts_with("$2"));
        assert!(hasher.verify_password("secret", &hash).await.unwrap());
        assert!(!hasher.verify_password("Secret", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn accepts_hashes_from_other_bcrypt_implementations() {
        // $2a$ prefix as written by node bcrypt libraries
        let hash = bcrypt::hash_with_result("secret", 4)
            .unwrap()
            .format_for_version(bcrypt::Version::TwoA);
        let hasher = BcryptHasher::default();
        assert!(hasher.verify_password("secret", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn malformed_hash_is_an_error() {
        let hasher = BcryptHasher::new(4);
        let result = hasher.verify_password("secret", "plaintext-not-a-hash").await;
        assert!(matches!(result, Err(HashError::Malformed(_))));
    }
}
