//! HTTP error responses

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::middleware::{unauthenticated_response, UNAUTHENTICATED_MESSAGE};
use crate::auth::AuthError;
use crate::error::Error;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Errors a handler can return; each maps to one status code
#[derive(Debug)]
pub enum ApiError {
    /// Bad login; same response for unknown email and wrong password
    InvalidCredentials,
    Unauthenticated,
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Unprocessable(String),
    BadGateway(String),
    ServiceUnavailable(String),
    Internal,
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Auth(AuthError::InvalidCredentials) => ApiError::InvalidCredentials,
            Error::Auth(_) => ApiError::Unauthenticated,
            Error::Validation(_) | Error::UnsupportedFileType(_) => {
                ApiError::BadRequest(err.to_string())
            }
            Error::EmailTaken | Error::UsernameTaken => ApiError::BadRequest(err.to_string()),
            Error::FilenameTaken(_) => ApiError::Conflict(err.to_string()),
            Error::Extraction(_) => ApiError::Unprocessable(err.to_string()),
            Error::AnalyzerDisabled => ApiError::ServiceUnavailable(err.to_string()),
            Error::Pool(_) => {
                tracing::error!("Store unavailable: {}", err);
                ApiError::ServiceUnavailable("Database is unavailable".to_string())
            }
            Error::Analysis(_) | Error::Http(_) => {
                tracing::error!("Contract analysis failed: {}", err);
                ApiError::BadGateway("Failed to analyze the contract with the LLM".to_string())
            }
            other => {
                tracing::error!("Request failed: {}", other);
                ApiError::Internal
            }
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(format!("Invalid multipart upload: {}", err.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InvalidCredentials => {
                return unauthenticated_response("Invalid email or password")
            }
            ApiError::Unauthenticated => return unauthenticated_response(UNAUTHENTICATED_MESSAGE),
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::Conflict(m) => (StatusCode::CONFLICT, m),
            ApiError::Unprocessable(m) => (StatusCode::UNPROCESSABLE_ENTITY, m),
            ApiError::BadGateway(m) => (StatusCode::BAD_GATEWAY, m),
            ApiError::ServiceUnavailable(m) => (StatusCode::SERVICE_UNAVAILABLE, m),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::EmailTaken, StatusCode::BAD_REQUEST),
            (Error::FilenameTaken("a.pdf".to_string()), StatusCode::CONFLICT),
            (Error::Extraction("bad".to_string()), StatusCode::UNPROCESSABLE_ENTITY),
            (Error::AnalyzerDisabled, StatusCode::SERVICE_UNAVAILABLE),
            (
                Error::Pool(deadpool_postgres::PoolError::Closed),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (Error::Analysis("boom".to_string()), StatusCode::BAD_GATEWAY),
            (Error::Other("boom".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_auth_errors_share_one_response() {
        for reason in [
            AuthError::MissingToken,
            AuthError::MalformedToken,
            AuthError::InvalidSignature,
            AuthError::TokenExpired,
            AuthError::MissingSubject,
            AuthError::UnknownSubject,
        ] {
            let response = ApiError::from(Error::Auth(reason)).into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(response.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");
        }
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let response = ApiError::from(Error::Analysis("secret upstream detail".to_string()));
        assert!(matches!(response, ApiError::BadGateway(ref m) if !m.contains("secret")));
    }
}
