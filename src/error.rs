//! Error type shared by every layer, mapped onto HTTP responses.

use crate::fields::{SchemaError, ValidationErrors};
use crate::rate_limit::RateLimitError;
use crate::storage::StorageError;
use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use derive_more::Display;
use sea_orm::DbErr;
use serde_json::json;

pub type CmsResult<T> = Result<T, CmsError>;

#[derive(Debug, Display)]
pub enum CmsError {
    #[display(fmt = "Validation failed: {}", _0)]
    Validation(ValidationErrors),
    #[display(fmt = "{}", _0)]
    BadRequest(String),
    #[display(fmt = "{} not found", _0)]
    NotFound(String),
    #[display(fmt = "Unauthorized")]
    Unauthorized,
    #[display(fmt = "Invalid credentials")]
    InvalidCredentials,
    #[display(fmt = "Forbidden")]
    Forbidden,
    #[display(fmt = "{}", _0)]
    Conflict(String),
    #[display(fmt = "{}", message)]
    RateLimited {
        message: String,
        limit: usize,
        retry_after_seconds: u64,
    },
    #[display(fmt = "Configuration error: {}", _0)]
    Configuration(String),
    #[display(fmt = "Database is not initialized")]
    Uninitialized,
    #[display(fmt = "Database error: {}", _0)]
    Database(DbErr),
    #[display(fmt = "Storage error: {}", _0)]
    Storage(StorageError),
    #[display(fmt = "Internal error: {}", _0)]
    Internal(String),
}

impl std::error::Error for CmsError {}

impl CmsError {
    pub fn not_found(what: impl Into<String>) -> Self {
        CmsError::NotFound(what.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        CmsError::BadRequest(message.into())
    }

    /// True for authentication and authorization failures.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            CmsError::Unauthorized | CmsError::InvalidCredentials | CmsError::Forbidden
        )
    }
}

impl From<DbErr> for CmsError {
    fn from(e: DbErr) -> Self {
        CmsError::Database(e)
    }
}

impl From<StorageError> for CmsError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(_) => CmsError::not_found("File"),
            StorageError::InvalidKey(_) => CmsError::bad_request("Invalid filename"),
            e => CmsError::Storage(e),
        }
    }
}

impl From<ValidationErrors> for CmsError {
    fn from(e: ValidationErrors) -> Self {
        CmsError::Validation(e)
    }
}

impl From<SchemaError> for CmsError {
    fn from(e: SchemaError) -> Self {
        CmsError::Configuration(e.to_string())
    }
}

impl From<RateLimitError> for CmsError {
    fn from(e: RateLimitError) -> Self {
        CmsError::RateLimited {
            message: e.message,
            limit: e.limit,
            retry_after_seconds: e.retry_after_seconds,
        }
    }
}

impl From<serde_json::Error> for CmsError {
    fn from(e: serde_json::Error) -> Self {
        CmsError::Internal(format!("JSON error: {}", e))
    }
}

impl From<actix_web::error::BlockingError> for CmsError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        CmsError::Internal(format!("blocking task failed: {}", e))
    }
}

impl ResponseError for CmsError {
    fn status_code(&self) -> StatusCode {
        match self {
            CmsError::Validation(_) | CmsError::BadRequest(_) => StatusCode::BAD_REQUEST,
            CmsError::NotFound(_) => StatusCode::NOT_FOUND,
            CmsError::Unauthorized | CmsError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            CmsError::Forbidden => StatusCode::FORBIDDEN,
            CmsError::Conflict(_) => StatusCode::CONFLICT,
            CmsError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            CmsError::Uninitialized => StatusCode::SERVICE_UNAVAILABLE,
            CmsError::Configuration(_)
            | CmsError::Database(_)
            | CmsError::Storage(_)
            | CmsError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let mut builder = HttpResponse::build(status);

        let body = match self {
            CmsError::Validation(errors) => json!({
                "statusCode": status.as_u16(),
                "message": "Validation failed",
                "data": { "errors": errors },
            }),
            CmsError::RateLimited {
                message,
                limit,
                retry_after_seconds,
            } => {
                builder.insert_header((header::RETRY_AFTER, retry_after_seconds.to_string()));
                json!({
                    "statusCode": status.as_u16(),
                    "message": message,
                    "data": {
                        "retryAfter": retry_after_seconds,
                        "limit": limit,
                        "remaining": 0,
                    },
                })
            }
            CmsError::Configuration(_)
            | CmsError::Uninitialized
            | CmsError::Database(_)
            | CmsError::Storage(_)
            | CmsError::Internal(_) => {
                log::error!("{}", self);
                json!({
                    "statusCode": status.as_u16(),
                    "message": "Internal server error",
                })
            }
            _ => json!({
                "statusCode": status.as_u16(),
                "message": self.to_string(),
            }),
        };

        builder.json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(CmsError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(CmsError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(CmsError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(CmsError::not_found("Item").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            CmsError::Conflict("Username already exists".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            CmsError::Validation(ValidationErrors::single("title", "Required")).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let err = CmsError::RateLimited {
            message: "Too many requests. Please slow down.".into(),
            limit: 100,
            retry_after_seconds: 42,
        };
        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "42");
    }

    #[test]
    fn test_display() {
        assert_eq!(CmsError::not_found("Item").to_string(), "Item not found");
        assert_eq!(
            CmsError::Validation(ValidationErrors::single("title", "Required")).to_string(),
            "Validation failed: title: Required"
        );
    }
}
