use crate::domain_model::*;
use crate::domain_port::*;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Reads the role-scoped account tables:
///
/// ```sql
/// users            (id uuid, email text, role text, auth_user_id text null,
///                   merchant_id uuid null, collaborator_id uuid null, full_name text null)
/// merchant_details (id uuid, business_name text, contact_email text, merchant_code text null,
///                   password_hash text null, is_verified bool)
/// collaborators    (id uuid, name text, email text, collaborator_code text null,
///                   password_hash text null, is_verified bool)
/// ```
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        PgProfileStore { pool }
    }

    fn row_to_identity(row: PgRow, role: LoginRole) -> Result<IdentityRecord, StoreError> {
        let id: Uuid = row
            .try_get("id")
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let email: String = row
            .try_get("email")
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let stored_role: String = row
            .try_get("role")
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let role_column: Role = stored_role
            .parse()
            .map_err(|e: UnknownRole| StoreError::Backend(e.to_string()))?;
        let auth_user_id: Option<String> = row
            .try_get("auth_user_id")
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let linked: Option<Uuid> = match role {
            LoginRole::Merchant => row.try_get::<Option<Uuid>, _>("merchant_id"),
            LoginRole::Collaborator => row.try_get::<Option<Uuid>, _>("collaborator_id"),
        }
        .map_err(|e| StoreError::Backend(e.to_string()))?;
        let full_name: Option<String> = row
            .try_get("full_name")
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(IdentityRecord {
            id: UserId(id),
            email,
            role: role_column,
            external_user_id: auth_user_id
                .filter(|id| !id.is_empty())
                .map(ExternalUserId),
            linked_detail_id: linked.map(DetailId),
            full_name,
        })
    }

    fn row_to_detail(row: PgRow, role: LoginRole) -> Result<RoleDetail, StoreError> {
        let id: Uuid = row
            .try_get("id")
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let display_name: String = row
            .try_get("display_name")
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let contact_email: String = row
            .try_get("contact_email")
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let code: Option<String> = row
            .try_get("code")
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let password_hash: Option<String> = row
            .try_get("password_hash")
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let verified: Option<bool> = row
            .try_get("is_verified")
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(RoleDetail {
            id: DetailId(id),
            role,
            display_name,
            contact_email,
            code,
            verified: verified.unwrap_or(false),
            password_hash,
        })
    }
}

#[async_trait::async_trait]
impl ProfileStore for PgProfileStore {
    async fn find_profile(
        &self,
        email: &str,
        role: LoginRole,
    ) -> Result<Option<IdentityRecord>, StoreError> {
        let row_opt: Option<PgRow> = sqlx::query(
            r#"
SELECT id, email, role, auth_user_id, merchant_id, collaborator_id, full_name
FROM users
WHERE lower(email) = lower($1) AND role = $2
LIMIT 1
"#,
        )
        .bind(email)
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        row_opt.map(|row| Self::row_to_identity(row, role)).transpose()
    }

    async fn find_detail(
        &self,
        role: LoginRole,
        id: DetailId,
    ) -> Result<Option<RoleDetail>, StoreError> {
        let query = match role {
            LoginRole::Merchant => {
                r#"
SELECT id, business_name AS display_name, contact_email, merchant_code AS code,
       password_hash, is_verified
FROM merchant_details
WHERE id = $1
"#
            }
            LoginRole::Collaborator => {
                r#"
SELECT id, name AS display_name, email AS contact_email, collaborator_code AS code,
       password_hash, is_verified
FROM collaborators
WHERE id = $1
"#
            }
        };

        let row_opt: Option<PgRow> = sqlx::query(query)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        row_opt.map(|row| Self::row_to_detail(row, role)).transpose()
    }
}
