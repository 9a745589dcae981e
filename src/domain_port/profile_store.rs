use crate::domain_model::*;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store error: {0}")]
    Backend(String),
    #[error("store call timed out")]
    Timeout,
}

/// Read-only view of the role-scoped account tables.
#[async_trait::async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch the identity row for `email` under exactly `role`.
    /// A merchant lookup never returns a collaborator row with the same email.
    async fn find_profile(
        &self,
        email: &str,
        role: LoginRole,
    ) -> Result<Option<IdentityRecord>, StoreError>;

    /// Fetch the merchant or collaborator detail row by primary key.
    async fn find_detail(
        &self,
        role: LoginRole,
        id: DetailId,
    ) -> Result<Option<RoleDetail>, StoreError>;
}
