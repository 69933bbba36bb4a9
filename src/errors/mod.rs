//! Error types for every layer and their mapping onto HTTP responses.

mod service;
mod storage;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use std::error::Error as StdError;
use std::fmt;

pub use service::{RepositoryError, ServiceError};
pub use storage::StorageError;

use crate::constants::{
    CODE_BAD_REQUEST, CODE_EMAIL_EXISTS, CODE_INTERNAL_ERROR, CODE_RATE_LIMITED,
    CODE_USER_NOT_FOUND, CODE_VALIDATION_FAILED, ERR_INTERNAL, ERR_RATE_LIMITED,
    ERR_REQUEST_FAILED, ERR_USER_NOT_FOUND,
};
use crate::models::ErrorResponse;

/// Transport-level error returned by handlers.
///
/// `InternalServerError` carries the internal cause for logging only; clients
/// always receive the generic message.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    ValidationError(Vec<String>),
    TooManyRequests(String),
    InternalServerError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(message) => write!(f, "Bad Request: {}", message),
            ApiError::NotFound(message) => write!(f, "Not Found: {}", message),
            ApiError::Conflict(message) => write!(f, "Conflict: {}", message),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation Error: {}", errors.join(", "))
            }
            ApiError::TooManyRequests(message) => write!(f, "Too Many Requests: {}", message),
            ApiError::InternalServerError(cause) => {
                write!(f, "Internal Server Error: {}", cause)
            }
        }
    }
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => CODE_BAD_REQUEST,
            ApiError::NotFound(_) => CODE_USER_NOT_FOUND,
            ApiError::Conflict(_) => CODE_EMAIL_EXISTS,
            ApiError::ValidationError(_) => CODE_VALIDATION_FAILED,
            ApiError::TooManyRequests(_) => CODE_RATE_LIMITED,
            ApiError::InternalServerError(_) => CODE_INTERNAL_ERROR,
        }
    }

    fn client_message(&self) -> String {
        match self {
            ApiError::BadRequest(message)
            | ApiError::NotFound(message)
            | ApiError::Conflict(message)
            | ApiError::TooManyRequests(message) => message.clone(),
            ApiError::ValidationError(errors) => errors.join(", "),
            ApiError::InternalServerError(_) => ERR_INTERNAL.to_string(),
        }
    }

    /// JSON error body for this error.
    pub fn envelope(&self, request_id: Option<&str>) -> ErrorResponse {
        let errors = match self {
            ApiError::ValidationError(errors) => Some(errors.clone()),
            _ => None,
        };

        ErrorResponse {
            success: false,
            code: self.code().to_string(),
            message: self.client_message(),
            errors,
            request_id: request_id.map(str::to_string),
        }
    }

    /// Same as [`ResponseError::error_response`], tagged with `request_id`.
    pub fn response_for_request(&self, request_id: &str) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self.envelope(Some(request_id)))
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self.envelope(None))
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound => ApiError::NotFound(ERR_USER_NOT_FOUND.to_string()),
            ServiceError::Conflict(message) => ApiError::Conflict(message),
            err @ ServiceError::Storage { .. } => ApiError::InternalServerError(error_chain(&err)),
        }
    }
}

/// Render an error that produced a `status` response as the JSON error body.
///
/// Errors raised outside the handlers (governor, CORS, routing) keep their
/// status; the message is the status reason, and 5xx stay generic.
pub fn error_response_for(
    err: &actix_web::Error,
    status: StatusCode,
    request_id: &str,
) -> HttpResponse {
    if let Some(api_err) = err.as_error::<ApiError>() {
        return api_err.response_for_request(request_id);
    }

    let (code, message) = if status == StatusCode::TOO_MANY_REQUESTS {
        (CODE_RATE_LIMITED, ERR_RATE_LIMITED)
    } else if status.is_client_error() {
        (
            CODE_BAD_REQUEST,
            status.canonical_reason().unwrap_or(ERR_REQUEST_FAILED),
        )
    } else {
        (CODE_INTERNAL_ERROR, ERR_INTERNAL)
    };

    HttpResponse::build(status).json(ErrorResponse {
        success: false,
        code: code.to_string(),
        message: message.to_string(),
        errors: None,
        request_id: Some(request_id.to_string()),
    })
}

/// `err` followed by each of its sources, joined with `": "`.
pub fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
