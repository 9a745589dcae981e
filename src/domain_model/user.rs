use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct UserId(pub uuid::Uuid);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::from_str(s).map(UserId)
    }
}

/// Primary key of a merchant or collaborator detail row.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct DetailId(pub uuid::Uuid);

impl fmt::Display for DetailId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User id as known to the identity provider. Opaque to us.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalUserId(pub String);

impl fmt::Display for ExternalUserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Merchant,
    Collaborator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Merchant => "merchant",
            Role::Collaborator => "collaborator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl std::str::FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "merchant" => Ok(Role::Merchant),
            "collaborator" => Ok(Role::Collaborator),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Roles that own a detail record and sign in through the reconciliation flow.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginRole {
    Merchant,
    Collaborator,
}

impl LoginRole {
    /// Order tried when the caller does not say which role they log in as.
    pub const AUTO_DETECT_ORDER: [LoginRole; 2] = [LoginRole::Collaborator, LoginRole::Merchant];

    pub fn as_role(&self) -> Role {
        match self {
            LoginRole::Merchant => Role::Merchant,
            LoginRole::Collaborator => Role::Collaborator,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.as_role().as_str()
    }
}

impl fmt::Display for LoginRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row per person in the `users` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub id: UserId,
    pub email: String,
    pub role: Role,
    pub external_user_id: Option<ExternalUserId>,
    /// Foreign key into `merchant_details` or `collaborators`, depending on `role`.
    pub linked_detail_id: Option<DetailId>,
    pub full_name: Option<String>,
}

/// Role-specific record holding the authoritative password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleDetail {
    pub id: DetailId,
    pub role: LoginRole,
    pub display_name: String,
    pub contact_email: String,
    pub code: Option<String>,
    pub verified: bool,
    pub password_hash: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RoleDetailPublic {
    pub id: DetailId,
    pub display_name: String,
    pub contact_email: String,
    pub code: Option<String>,
    pub verified: bool,
}

impl From<&RoleDetail> for RoleDetailPublic {
    fn from(detail: &RoleDetail) -> Self {
        RoleDetailPublic {
            id: detail.id,
            display_name: detail.display_name.clone(),
            contact_email: detail.contact_email.clone(),
            code: detail.code.clone(),
            verified: detail.verified,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IdentitySummary {
    pub id: UserId,
    pub email: String,
    pub role: Role,
    pub full_name: Option<String>,
    pub external_user_id: Option<ExternalUserId>,
}

impl IdentitySummary {
    pub fn new(record: &IdentityRecord, external_user_id: Option<ExternalUserId>) -> Self {
        IdentitySummary {
            id: record.id,
            email: record.email.clone(),
            role: record.role,
            full_name: record.full_name.clone(),
            external_user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::Admin, Role::Merchant, Role::Collaborator] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn login_role_deserializes_lowercase() {
        let role: LoginRole = serde_json::from_str("\"collaborator\"").unwrap();
        assert_eq!(role, LoginRole::Collaborator);
        assert!(serde_json::from_str::<LoginRole>("\"admin\"").is_err());
    }

    #[test]
    fn public_detail_drops_password_hash() {
        let detail = RoleDetail {
            id: DetailId(uuid::Uuid::new_v4()),
            role: LoginRole::Merchant,
            display_name: "Blue Lagoon Tours".to_string(),
            contact_email: "ops@bluelagoon.test".to_string(),
            code: Some("M-0042".to_string()),
            verified: true,
            password_hash: Some("$2b$04$abc".to_string()),
        };
        let json = serde_json::to_value(RoleDetailPublic::from(&detail)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["code"], "M-0042");
    }
}
