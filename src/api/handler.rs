use super::error::*;
use crate::application_port::*;
use crate::domain_model::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

// no Debug: carries the plaintext password
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub user_type: Option<LoginRole>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: IdentitySummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant: Option<RoleDetailPublic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collaborator: Option<RoleDetailPublic>,
    pub access_token: String,
    pub refresh_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

impl From<LoginResult> for LoginResponse {
    fn from(result: LoginResult) -> Self {
        let (merchant, collaborator) = match result.role {
            LoginRole::Merchant => (Some(result.profile), None),
            LoginRole::Collaborator => (None, Some(result.profile)),
        };
        LoginResponse {
            user: result.identity,
            merchant,
            collaborator,
            access_token: result.session.access_token,
            refresh_token: result.session.refresh_token,
            expires_in: result.session.expires_in,
        }
    }
}

pub async fn login(
    body: LoginRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(reject::custom(ApiRejection::new(
            ApiErrorCode::BadRequest,
            "email and password are required",
        )));
    }

    let login_input = LoginInput {
        email: body.email,
        password: body.password,
        role: body.user_type,
    };
    let login_result = auth_service
        .login(login_input)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&LoginResponse::from(login_result)))
}

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: &'static str,
}

pub async fn health() -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&ApiResponse::ok(HealthStatus { status: "ok" })))
}
