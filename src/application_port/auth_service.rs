use crate::domain_model::*;
use serde::Serialize;

/// Every variant surfaces to the caller as "unauthorized"; only the message differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LoginError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Account is not linked to a profile, please contact admin")]
    ProfileNotLinked,
    #[error("Account is pending admin approval")]
    NotVerified,
    #[error("Password is not set for this account, please contact admin")]
    PasswordNotSet,
    #[error("Login failed, please contact support")]
    LoginFailed,
}

#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("malformed password hash: {0}")]
    Malformed(String),
    #[error("hashing error: {0}")]
    InternalError(String),
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
    /// `None` asks the service to detect the role from the stored profiles.
    pub role: Option<LoginRole>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub identity: IdentitySummary,
    pub role: LoginRole,
    pub profile: RoleDetailPublic,
    pub session: Session,
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, HashError>;
    async fn verify_password(&self, password: &str, password_hash: &str)
    -> Result<bool, HashError>;
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn login(&self, request: LoginInput) -> Result<LoginResult, LoginError>;
}
