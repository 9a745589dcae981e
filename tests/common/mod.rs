#![allow(dead_code)]

use concierge::application_impl::{BcryptHasher, RealAuthService};
use concierge::application_port::LoginInput;
use concierge::domain_model::*;
use concierge::infra_memory::{InMemoryIdentityProvider, InMemoryProfileStore};
use std::sync::Arc;
use std::time::Duration;

pub const PASSWORD: &str = "secret";

pub struct Harness {
    pub store: Arc<InMemoryProfileStore>,
    pub provider: Arc<InMemoryIdentityProvider>,
    pub service: RealAuthService,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryProfileStore::new());
        let provider = Arc::new(InMemoryIdentityProvider::new("test-signing-key"));
        let service = RealAuthService::new(
            store.clone(),
            provider.clone(),
            Arc::new(BcryptHasher::new(4)),
        )
        .with_call_timeout(Duration::from_secs(2));
        Self {
            store,
            provider,
            service,
        }
    }

    /// A verified account whose provider password already matches.
    pub fn in_sync_account(&self, email: &str, role: LoginRole) -> (UserId, DetailId) {
        let external_id = self.provider.register(email, PASSWORD);
        self.store
            .insert_account(email, role, "Harbour Light Tours", Some(hash(PASSWORD)), true, Some(external_id))
    }
}

pub fn hash(password: &str) -> String {
    bcrypt::hash(password, 4).unwrap()
}

pub fn login_input(email: &str, password: &str, role: Option<LoginRole>) -> LoginInput {
    LoginInput {
        email: email.to_string(),
        password: password.to_string(),
        role,
    }
}
