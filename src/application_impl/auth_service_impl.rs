use super::retry::{attempt, with_deadline};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// One repair, then one more sign-in. Never more.
const SIGN_IN_RETRIES: u32 = 1;

/// Logs a person in against the profile tables and keeps the identity
/// provider's password in step with the locally stored bcrypt hash.
///
/// The bcrypt hash is the real gate. The provider is only asked for a
/// session after it passes, and its password is overwritten (or its account
/// created) only when it refuses a password we have already verified.
pub struct RealAuthService {
    profile_store: Arc<dyn ProfileStore>,
    identity_provider: Arc<dyn IdentityProvider>,
    credential_hasher: Arc<dyn CredentialHasher>,
    call_timeout: Duration,
}

impl RealAuthService {
    pub fn new(
        profile_store: Arc<dyn ProfileStore>,
        identity_provider: Arc<dyn IdentityProvider>,
        credential_hasher: Arc<dyn CredentialHasher>,
    ) -> Self {
        Self {
            profile_store,
            identity_provider,
            credential_hasher,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    #[inline]
    fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    async fn find_profile(&self, email: &str, role: LoginRole) -> Option<IdentityRecord> {
        let lookup = self.profile_store.find_profile(email, role);
        match with_deadline(self.call_timeout, lookup, StoreError::Timeout).await {
            // the store is expected to scope by role; refuse anything that slips through
            Ok(Some(record)) if record.role == role.as_role() => Some(record),
            Ok(Some(record)) => {
                warn!(%email, %role, found = %record.role, "profile store returned a row for another role");
                None
            }
            Ok(None) => None,
            Err(e) => {
                error!(%email, %role, "profile lookup failed: {}", e);
                None
            }
        }
    }

    async fn find_detail(&self, role: LoginRole, id: DetailId) -> Option<RoleDetail> {
        let lookup = self.profile_store.find_detail(role, id);
        match with_deadline(self.call_timeout, lookup, StoreError::Timeout).await {
            Ok(detail) => detail,
            Err(e) => {
                error!(%role, detail_id = %id, "detail lookup failed: {}", e);
                None
            }
        }
    }

    async fn resolve_profile(
        &self,
        email: &str,
        role: Option<LoginRole>,
    ) -> Result<(LoginRole, IdentityRecord), LoginError> {
        if let Some(role) = role {
            return self
                .find_profile(email, role)
                .await
                .map(|record| (role, record))
                .ok_or(LoginError::InvalidCredentials);
        }

        for role in LoginRole::AUTO_DETECT_ORDER {
            if let Some(record) = self.find_profile(email, role).await {
                debug!(%email, %role, "role detected");
                return Ok((role, record));
            }
        }
        Err(LoginError::InvalidCredentials)
    }

    /// Checks everything the profile tables know before the provider is involved.
    async fn verify_local_credential(
        &self,
        role: LoginRole,
        identity: &IdentityRecord,
        password: &str,
    ) -> Result<RoleDetail, LoginError> {
        let detail_id = identity
            .linked_detail_id
            .ok_or(LoginError::ProfileNotLinked)?;

        let detail = self
            .find_detail(role, detail_id)
            .await
            .ok_or(LoginError::ProfileNotLinked)?;

        if !detail.verified {
            return Err(LoginError::NotVerified);
        }

        let password_hash = match detail.password_hash.as_deref() {
            Some(hash) if !hash.is_empty() => hash,
            _ => return Err(LoginError::PasswordNotSet),
        };

        match self
            .credential_hasher
            .verify_password(password, password_hash)
            .await
        {
            Ok(true) => Ok(detail),
            Ok(false) => Err(LoginError::InvalidCredentials),
            Err(e) => {
                error!(user_id = %identity.id, %role, "password verification failed: {}", e);
                Err(LoginError::InvalidCredentials)
            }
        }
    }

    async fn sign_in_once(&self, email: &str, password: &str) -> Result<Session, ProviderError> {
        let sign_in = self.identity_provider.sign_in(email, password);
        with_deadline(self.call_timeout, sign_in, ProviderError::Timeout).await
    }

    /// Pushes the verified password into the provider. Returns the provider id
    /// when an account had to be created.
    async fn repair(
        &self,
        identity: &IdentityRecord,
        password: &str,
    ) -> Result<Option<ExternalUserId>, ProviderError> {
        match &identity.external_user_id {
            Some(external_id) => {
                let set = self.identity_provider.set_password(external_id, password);
                with_deadline(self.call_timeout, set, ProviderError::Timeout).await?;
                Ok(None)
            }
            None => {
                let create = self.identity_provider.create_user(&identity.email, password);
                let external_id =
                    with_deadline(self.call_timeout, create, ProviderError::Timeout).await?;
                Ok(Some(external_id))
            }
        }
    }

    /// Obtains a session, repairing provider-side drift at most once.
    async fn issue_session(
        &self,
        identity: &IdentityRecord,
        password: &str,
    ) -> Result<(Session, Option<ExternalUserId>), LoginError> {
        let email = identity.email.as_str();
        let created = OnceLock::new();

        let outcome = attempt(
            SIGN_IN_RETRIES,
            || self.sign_in_once(email, password),
            |failure| {
                let created = &created;
                async move {
                    warn!(user_id = %identity.id, "identity provider refused a verified password, repairing: {}", failure);
                    match self.repair(identity, password).await {
                        Ok(Some(external_id)) => {
                            info!(user_id = %identity.id, external_user_id = %external_id, "identity provider account created");
                            // the hook runs at most once, so the cell is still empty
                            let _ = created.set(external_id);
                            Ok(())
                        }
                        Ok(None) => Ok(()),
                        Err(e) => {
                            error!(user_id = %identity.id, "identity provider repair failed: {}", e);
                            Err(e)
                        }
                    }
                }
            },
        )
        .await;

        match outcome {
            Ok(session) => Ok((session, created.into_inner())),
            Err(e) => {
                error!(user_id = %identity.id, "could not obtain a session from the identity provider: {}", e);
                Err(LoginError::LoginFailed)
            }
        }
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn login(&self, request: LoginInput) -> Result<LoginResult, LoginError> {
        let LoginInput {
            email,
            password,
            role,
        } = request;
        let email = Self::normalize_email(&email);

        let outcome = async {
            let (role, identity) = self.resolve_profile(&email, role).await?;
            let detail = self
                .verify_local_credential(role, &identity, &password)
                .await?;
            let (session, created) = self.issue_session(&identity, &password).await?;

            let external_user_id = created.or_else(|| identity.external_user_id.clone());
            Ok::<_, LoginError>(LoginResult {
                identity: IdentitySummary::new(&identity, external_user_id),
                role,
                profile: RoleDetailPublic::from(&detail),
                session,
            })
        }
        .await;

        match &outcome {
            Ok(result) => info!(%email, role = %result.role, "login succeeded"),
            Err(e) => warn!(%email, requested_role = ?role, "login rejected: {:?}", e),
        }
        outcome
    }
}
