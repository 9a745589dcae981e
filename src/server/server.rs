use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_gotrue::*;
use crate::infra_memory::*;
use crate::infra_postgres::*;
use crate::logger::*;
use crate::settings::Settings;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

/// Owns the external connections and the services built on them.
pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pool: Option<PgPool>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let call_timeout = Duration::from_millis(settings.auth.call_timeout_ms);
        let mut pool = None;

        let profile_store: Arc<dyn ProfileStore> = match settings.profile_store.backend.as_str() {
            "fake" => match settings.profile_store.seed_path.as_deref() {
                Some(path) => Arc::new(InMemoryProfileStore::from_seed_file(path)?),
                None => {
                    warn!("fake profile store has no seed file, every login will fail");
                    Arc::new(InMemoryProfileStore::new())
                }
            },
            "postgres" => {
                let pg = PgPoolOptions::new()
                    .max_connections(settings.profile_store.max_connections)
                    .acquire_timeout(call_timeout)
                    .connect(&settings.profile_store.dsn)
                    .await?;
                pool = Some(pg.clone());
                Arc::new(PgProfileStore::new(pg))
            }
            other => return Err(anyhow::anyhow!("Unknown profile store backend: {}", other)),
        };

        let identity_provider: Arc<dyn IdentityProvider> =
            match settings.identity_provider.backend.as_str() {
                "fake" => Arc::new(InMemoryIdentityProvider::new(
                    settings.identity_provider.jwt_secret.as_bytes(),
                )),
                "gotrue" => Arc::new(GoTrueIdentityProvider::new(GoTrueConfig {
                    url: settings.identity_provider.url.clone(),
                    anon_key: settings.identity_provider.anon_key.clone(),
                    service_key: settings.identity_provider.service_key.clone(),
                    timeout: call_timeout,
                })?),
                other => {
                    return Err(anyhow::anyhow!(
                        "Unknown identity provider backend: {}",
                        other
                    ));
                }
            };

        let credential_hasher: Arc<dyn CredentialHasher> =
            Arc::new(BcryptHasher::new(settings.auth.bcrypt_cost));

        let auth_service: Arc<dyn AuthService> = Arc::new(
            RealAuthService::new(profile_store, identity_provider, credential_hasher)
                .with_call_timeout(call_timeout),
        );

        info!(
            profile_store = %settings.profile_store.backend,
            identity_provider = %settings.identity_provider.backend,
            "server started"
        );

        Ok(Self { auth_service, pool })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings;

    fn test_settings(profile_backend: &str, provider_backend: &str) -> Settings {
        Settings {
            auth: settings::Auth::default(),
            http: settings::Http {
                address: "127.0.0.1:0".to_string(),
                cert_path: None,
                key_path: None,
            },
            identity_provider: settings::IdentityProvider {
                backend: provider_backend.to_string(),
                url: String::new(),
                anon_key: String::new(),
                service_key: String::new(),
                jwt_secret: "dev".to_string(),
            },
            log: settings::Log {
                filter: "info".to_string(),
            },
            profile_store: settings::ProfileStore {
                backend: profile_backend.to_string(),
                dsn: String::new(),
                max_connections: 1,
                seed_path: None,
            },
        }
    }

    #[tokio::test]
    async fn builds_with_fake_backends() {
        let server = Server::try_new(&test_settings("fake", "fake")).await.unwrap();
        let result = server
            .auth_service
            .login(LoginInput {
                email: "nobody@example.test".to_string(),
                password: "pw".to_string(),
                role: None,
            })
            .await;
        assert_eq!(result.unwrap_err(), LoginError::InvalidCredentials);
        server.shutdown().await;
    }

    #[tokio::test]
    async fn rejects_unknown_backends() {
        assert!(Server::try_new(&test_settings("sqlite", "fake")).await.is_err());
        assert!(Server::try_new(&test_settings("fake", "auth0")).await.is_err());
    }
}
