use crate::domain_model::*;
use crate::domain_port::*;
use anyhow::{Context, Result};
use dashmap::DashMap;
use serde::Deserialize;
use crate::logger::*;
use std::path::Path;
use uuid::Uuid;

/// Profile store kept in process memory. Backs the "fake" profile store
/// backend and the tests.
#[derive(Default)]
pub struct InMemoryProfileStore {
    identities: DashMap<(String, LoginRole), IdentityRecord>,
    details: DashMap<(LoginRole, DetailId), RoleDetail>,
}

#[derive(Debug, Deserialize)]
struct SeedFile {
    accounts: Vec<SeedAccount>,
}

#[derive(Debug, Deserialize)]
struct SeedAccount {
    email: String,
    role: LoginRole,
    display_name: String,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    password_hash: Option<String>,
    #[serde(default)]
    verified: bool,
    #[serde(default)]
    external_user_id: Option<String>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load accounts from a JSON seed file of the form `{ "accounts": [...] }`.
    pub fn from_seed_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading profile seed {}", path.display()))?;
        let seed: SeedFile = serde_json::from_str(&raw)
            .with_context(|| format!("parsing profile seed {}", path.display()))?;

        let store = Self::new();
        for account in seed.accounts {
            let (user_id, detail_id) = store.insert_account(
                &account.email,
                account.role,
                &account.display_name,
                account.password_hash,
                account.verified,
                account.external_user_id.map(ExternalUserId),
            );
            if let Some(mut identity) = store
                .identities
                .get_mut(&(account.email.to_lowercase(), account.role))
            {
                identity.full_name = account.full_name;
            }
            if let Some(mut detail) = store.details.get_mut(&(account.role, detail_id)) {
                detail.code = account.code;
            }
            debug!(%user_id, role = %account.role, "seeded profile");
        }
        Ok(store)
    }

    pub fn insert_identity(&self, role: LoginRole, record: IdentityRecord) {
        self.identities
            .insert((record.email.to_lowercase(), role), record);
    }

    pub fn insert_detail(&self, detail: RoleDetail) {
        self.details.insert((detail.role, detail.id), detail);
    }

    /// Insert a linked identity + detail pair, as the approval workflow would.
    pub fn insert_account(
        &self,
        email: &str,
        role: LoginRole,
        display_name: &str,
        password_hash: Option<String>,
        verified: bool,
        external_user_id: Option<ExternalUserId>,
    ) -> (UserId, DetailId) {
        let user_id = UserId(Uuid::new_v4());
        let detail_id = DetailId(Uuid::new_v4());
        self.insert_detail(RoleDetail {
            id: detail_id,
            role,
            display_name: display_name.to_string(),
            contact_email: email.to_string(),
            code: None,
            verified,
            password_hash,
        });
        self.insert_identity(
            role,
            IdentityRecord {
                id: user_id,
                email: email.to_lowercase(),
                role: role.as_role(),
                external_user_id,
                linked_detail_id: Some(detail_id),
                full_name: None,
            },
        );
        (user_id, detail_id)
    }

    /// Returns false when no such detail exists.
    pub fn set_verified(&self, role: LoginRole, id: DetailId, verified: bool) -> bool {
        match self.details.get_mut(&(role, id)) {
            Some(mut detail) => {
                detail.verified = verified;
                true
            }
            None => false,
        }
    }

    pub fn remove_detail(&self, role: LoginRole, id: DetailId) -> Option<RoleDetail> {
        self.details.remove(&(role, id)).map(|(_, detail)| detail)
    }
}

#[async_trait::async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn find_profile(
        &self,
        email: &str,
        role: LoginRole,
    ) -> Result<Option<IdentityRecord>, StoreError> {
        Ok(self
            .identities
            .get(&(email.to_lowercase(), role))
            .map(|record| record.value().clone()))
    }

    async fn find_detail(
        &self,
        role: LoginRole,
        id: DetailId,
    ) -> Result<Option<RoleDetail>, StoreError> {
        Ok(self
            .details
            .get(&(role, id))
            .map(|detail| detail.value().clone()))
    }
}
