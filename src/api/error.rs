use crate::api::handler::ApiResponse;
use crate::application_port::LoginError;
use crate::logger::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let rejection = if let Some(rejection) = err.find::<ApiRejection>() {
        rejection.clone()
    } else if err.is_not_found() {
        ApiRejection::from(ApiErrorCode::NotFound)
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        ApiRejection::new(ApiErrorCode::BadRequest, e.to_string())
    } else if err.find::<reject::UnsupportedMediaType>().is_some()
        || err.find::<reject::LengthRequired>().is_some()
    {
        ApiRejection::from(ApiErrorCode::BadRequest)
    } else if err.find::<reject::PayloadTooLarge>().is_some() {
        ApiRejection::from(ApiErrorCode::PayloadTooLarge)
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        ApiRejection::from(ApiErrorCode::MethodNotAllowed)
    } else {
        ApiRejection::internal(format!("unhandled rejection: {:?}", err))
    };

    let status = rejection.code.status();
    let json = warp::reply::json(&ApiResponse::<()>::err(rejection.code, rejection.message));
    Ok(warp::reply::with_status(json, status))
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
pub enum ApiErrorCode {
    #[error("{}", LoginError::InvalidCredentials)]
    InvalidCredentials,
    #[error("{}", LoginError::ProfileNotLinked)]
    ProfileNotLinked,
    #[error("{}", LoginError::NotVerified)]
    NotVerified,
    #[error("{}", LoginError::PasswordNotSet)]
    PasswordNotSet,
    #[error("{}", LoginError::LoginFailed)]
    LoginFailed,
    #[error("Bad request")]
    BadRequest,
    #[error("Not found")]
    NotFound,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Payload too large")]
    PayloadTooLarge,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::InvalidCredentials
            | ApiErrorCode::ProfileNotLinked
            | ApiErrorCode::NotVerified
            | ApiErrorCode::PasswordNotSet
            | ApiErrorCode::LoginFailed => StatusCode::UNAUTHORIZED,
            ApiErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Rejection carried through warp until `recover_error` renders it.
#[derive(Debug, Clone)]
pub struct ApiRejection {
    pub code: ApiErrorCode,
    pub message: String,
}

impl ApiRejection {
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiRejection {
            code,
            message: message.into(),
        }
    }

    pub fn internal<E: std::fmt::Display>(error: E) -> Self {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalError.into()
    }
}

impl reject::Reject for ApiRejection {}

impl From<ApiErrorCode> for ApiRejection {
    fn from(code: ApiErrorCode) -> Self {
        ApiRejection::new(code, code.to_string())
    }
}

impl From<LoginError> for ApiRejection {
    fn from(error: LoginError) -> Self {
        let code = match error {
            LoginError::InvalidCredentials => ApiErrorCode::InvalidCredentials,
            LoginError::ProfileNotLinked => ApiErrorCode::ProfileNotLinked,
            LoginError::NotVerified => ApiErrorCode::NotVerified,
            LoginError::PasswordNotSet => ApiErrorCode::PasswordNotSet,
            LoginError::LoginFailed => ApiErrorCode::LoginFailed,
        };
        ApiRejection::new(code, error.to_string())
    }
}
