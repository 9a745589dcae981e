//! Supabase GoTrue adapter.
//!
//! Sign-in uses the public password grant with the anon key; password
//! updates and account creation go through the admin API with the
//! service-role key, which never leaves the server.

use crate::domain_model::*;
use crate::domain_port::*;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct GoTrueConfig {
    /// Project URL, e.g. `https://xxxx.supabase.co`.
    pub url: String,
    pub anon_key: String,
    pub service_key: String,
    pub timeout: Duration,
}

pub struct GoTrueIdentityProvider {
    config: GoTrueConfig,
    http: Client,
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Serialize)]
struct UpdateUser<'a> {
    password: &'a str,
}

#[derive(Serialize)]
struct CreateUser<'a> {
    email: &'a str,
    password: &'a str,
    email_confirm: bool,
}

#[derive(Deserialize)]
struct AdminUser {
    id: String,
}

impl GoTrueIdentityProvider {
    pub fn new(config: GoTrueConfig) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, http })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.config.url.trim_end_matches('/'), path)
    }

    fn with_anon_key(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("apikey", &self.config.anon_key)
    }

    fn with_service_key(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.config.service_key)
            .bearer_auth(&self.config.service_key)
    }

    fn transport(e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::Transport(e.to_string())
        }
    }

    async fn unexpected(response: Response) -> ProviderError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        ProviderError::Unexpected { status, body }
    }
}

#[async_trait::async_trait]
impl IdentityProvider for GoTrueIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ProviderError> {
        let request = self
            .http
            .post(self.auth_url("token?grant_type=password"))
            .json(&PasswordGrant { email, password });
        let response = self
            .with_anon_key(request)
            .send()
            .await
            .map_err(Self::transport)?;

        match response.status() {
            status if status.is_success() => {
                let token: TokenResponse = response.json().await.map_err(Self::transport)?;
                Ok(Session {
                    access_token: token.access_token,
                    refresh_token: token.refresh_token,
                    expires_in: token.expires_in,
                })
            }
            // invalid_grant: wrong password or no such user
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => Err(ProviderError::Rejected),
            _ => Err(Self::unexpected(response).await),
        }
    }

    async fn set_password(
        &self,
        user: &ExternalUserId,
        password: &str,
    ) -> Result<(), ProviderError> {
        let request = self
            .http
            .put(self.auth_url(&format!("admin/users/{}", user)))
            .json(&UpdateUser { password });
        let response = self
            .with_service_key(request)
            .send()
            .await
            .map_err(Self::transport)?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(ProviderError::NotFound),
            _ => Err(Self::unexpected(response).await),
        }
    }

    async fn create_user(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ExternalUserId, ProviderError> {
        let request = self.http.post(self.auth_url("admin/users")).json(&CreateUser {
            email,
            password,
            email_confirm: true,
        });
        let response = self
            .with_service_key(request)
            .send()
            .await
            .map_err(Self::transport)?;

        if response.status().is_success() {
            let user: AdminUser = response.json().await.map_err(Self::transport)?;
            Ok(ExternalUserId(user.id))
        } else {
            Err(Self::unexpected(response).await)
        }
    }
}
