use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

const ISSUER: &str = "concierge.fake-identity";
const ACCESS_TTL_SECS: i64 = 60 * 60;

#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    sub: String,
    email: String,
    exp: i64,
    iat: i64,
    iss: String,
}

struct Account {
    id: ExternalUserId,
    password: String,
}

/// Identity provider kept in process memory. Mints HS256 access tokens and
/// random refresh tokens, counts every call and can simulate an outage of its
/// admin endpoints.
pub struct InMemoryIdentityProvider {
    accounts: DashMap<String, Account>,
    emails: DashMap<ExternalUserId, String>,
    signing_key: Vec<u8>,
    admin_outage: AtomicBool,
    sign_in_calls: AtomicUsize,
    set_password_calls: AtomicUsize,
    create_user_calls: AtomicUsize,
}

impl InMemoryIdentityProvider {
    pub fn new(signing_key: impl Into<Vec<u8>>) -> Self {
        Self {
            accounts: DashMap::new(),
            emails: DashMap::new(),
            signing_key: signing_key.into(),
            admin_outage: AtomicBool::new(false),
            sign_in_calls: AtomicUsize::new(0),
            set_password_calls: AtomicUsize::new(0),
            create_user_calls: AtomicUsize::new(0),
        }
    }

    /// Provider ids are derived from the email so they stay stable across restarts.
    fn fake_id(email: &str) -> ExternalUserId {
        ExternalUserId(uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, email.as_bytes()).to_string())
    }

    /// Create an account directly, bypassing the call counters.
    pub fn register(&self, email: &str, password: &str) -> ExternalUserId {
        let email = email.to_lowercase();
        let id = Self::fake_id(&email);
        self.emails.insert(id.clone(), email.clone());
        self.accounts.insert(
            email,
            Account {
                id: id.clone(),
                password: password.to_string(),
            },
        );
        id
    }

    /// Make `set_password` and `create_user` fail as if the admin API were down.
    pub fn set_admin_outage(&self, down: bool) {
        self.admin_outage.store(down, Ordering::SeqCst);
    }

    pub fn sign_in_calls(&self) -> usize {
        self.sign_in_calls.load(Ordering::SeqCst)
    }

    pub fn set_password_calls(&self) -> usize {
        self.set_password_calls.load(Ordering::SeqCst)
    }

    pub fn create_user_calls(&self) -> usize {
        self.create_user_calls.load(Ordering::SeqCst)
    }

    /// Returns the provider user id an access token was minted for.
    pub fn verify_access_token(&self, token: &str) -> Option<ExternalUserId> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        decode::<AccessClaims>(token, &DecodingKey::from_secret(&self.signing_key), &validation)
            .ok()
            .map(|data| ExternalUserId(data.claims.sub))
    }

    fn mint_session(&self, id: &ExternalUserId, email: &str) -> Result<Session, ProviderError> {
        let iat = Utc::now();
        let exp = iat + Duration::seconds(ACCESS_TTL_SECS);
        let claims = AccessClaims {
            sub: id.0.clone(),
            email: email.to_string(),
            exp: exp.timestamp(),
            iat: iat.timestamp(),
            iss: ISSUER.to_string(),
        };
        let access_token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.signing_key),
        )
        .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(Session {
            access_token,
            refresh_token: nanoid::nanoid!(32),
            expires_in: Some(ACCESS_TTL_SECS as u64),
        })
    }

    fn check_admin_available(&self) -> Result<(), ProviderError> {
        if self.admin_outage.load(Ordering::SeqCst) {
            return Err(ProviderError::Unexpected {
                status: 503,
                body: "upstream connect error or disconnect/reset before headers".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ProviderError> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        let email = email.to_lowercase();
        let id = match self.accounts.get(&email) {
            Some(account) if account.password == password => account.id.clone(),
            _ => return Err(ProviderError::Rejected),
        };
        self.mint_session(&id, &email)
    }

    async fn set_password(
        &self,
        user: &ExternalUserId,
        password: &str,
    ) -> Result<(), ProviderError> {
        self.set_password_calls.fetch_add(1, Ordering::SeqCst);
        self.check_admin_available()?;

        let email = self
            .emails
            .get(user)
            .map(|email| email.value().clone())
            .ok_or(ProviderError::NotFound)?;
        let mut account = self.accounts.get_mut(&email).ok_or(ProviderError::NotFound)?;
        account.password = password.to_string();
        Ok(())
    }

    async fn create_user(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ExternalUserId, ProviderError> {
        self.create_user_calls.fetch_add(1, Ordering::SeqCst);
        self.check_admin_available()?;

        let email = email.to_lowercase();
        let id = Self::fake_id(&email);
        match self.accounts.entry(email.clone()) {
            Entry::Occupied(_) => {
                return Err(ProviderError::Unexpected {
                    status: 422,
                    body: "email_exists".to_string(),
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(Account {
                    id: id.clone(),
                    password: password.to_string(),
                });
            }
        }
        self.emails.insert(id.clone(), email);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn sign_in_mints_verifiable_tokens() {
        let provider = InMemoryIdentityProvider::new("k");
        let id = provider.register("a@x.com", "pw");

        let session = provider.sign_in("A@x.com", "pw").await.unwrap();
        assert!(!session.refresh_token.is_empty());
        assert_eq!(provider.verify_access_token(&session.access_token), Some(id));
        assert_eq!(provider.sign_in_calls(), 1);
    }

    #[tokio::test]
    async fn tokens_from_another_key_do_not_verify() {
        let provider = InMemoryIdentityProvider::new("k");
        provider.register("a@x.com", "pw");
        let session = provider.sign_in("a@x.com", "pw").await.unwrap();

        let other = InMemoryIdentityProvider::new("other");
        assert_eq!(other.verify_access_token(&session.access_token), None);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_are_rejected() {
        let provider = InMemoryIdentityProvider::new("k");
        provider.register("a@x.com", "pw");

        assert!(matches!(
            provider.sign_in("a@x.com", "nope").await,
            Err(ProviderError::Rejected)
        ));
        assert!(matches!(
            provider.sign_in("b@x.com", "pw").await,
            Err(ProviderError::Rejected)
        ));
    }

    #[tokio::test]
    async fn set_password_on_unknown_user_is_not_found() {
        let provider = InMemoryIdentityProvider::new("k");
        let result = provider
            .set_password(&ExternalUserId("missing".to_string()), "pw")
            .await;
        assert!(matches!(result, Err(ProviderError::NotFound)));
    }

    #[tokio::test]
    async fn create_user_refuses_duplicates() {
        let provider = InMemoryIdentityProvider::new("k");
        provider.create_user("a@x.com", "pw").await.unwrap();
        let result = provider.create_user("a@x.com", "pw").await;
        assert!(matches!(result, Err(ProviderError::Unexpected { status: 422, .. })));
        assert_eq!(provider.create_user_calls(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_for_one_email_admit_a_single_account() {
        let provider = Arc::new(InMemoryIdentityProvider::new("k"));
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let provider = provider.clone();
                tokio::spawn(async move { provider.create_user("a@x.com", "pw").await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(provider.create_user_calls(), 16);
        assert!(provider.sign_in("a@x.com", "pw").await.is_ok());
    }

    #[tokio::test]
    async fn outage_fails_admin_calls_only() {
        let provider = InMemoryIdentityProvider::new("k");
        let id = provider.register("a@x.com", "pw");
        provider.set_admin_outage(true);

        assert!(provider.set_password(&id, "new").await.is_err());
        assert!(provider.create_user("b@x.com", "pw").await.is_err());
        assert!(provider.sign_in("a@x.com", "pw").await.is_ok());
    }
}
