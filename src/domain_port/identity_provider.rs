use crate::domain_model::*;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("identity provider rejected the credentials")]
    Rejected,
    #[error("identity provider has no such user")]
    NotFound,
    #[error("identity provider call timed out")]
    Timeout,
    #[error("identity provider transport error: {0}")]
    Transport(String),
    #[error("identity provider returned {status}: {body}")]
    Unexpected { status: u16, body: String },
}

/// External system that mints sessions and keeps its own copy of the password.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ProviderError>;

    /// Overwrite the provider-side password. Setting the same value twice is harmless.
    async fn set_password(
        &self,
        user: &ExternalUserId,
        password: &str,
    ) -> Result<(), ProviderError>;

    /// Create a confirmed provider account for an identity that has none yet.
    async fn create_user(&self, email: &str, password: &str)
    -> Result<ExternalUserId, ProviderError>;
}
