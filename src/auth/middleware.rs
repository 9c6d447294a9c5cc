//! Request gate for protected routes

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::auth::error::AuthError;
use crate::auth::models::User;
use crate::auth::service::AuthService;
use crate::error::Error;

/// Message returned for every rejected request, whatever the reason
pub const UNAUTHENTICATED_MESSAGE: &str = "Invalid or missing credentials";

/// The caller resolved by [`require_auth`], stored in request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();

    if scheme.eq_ignore_ascii_case("Bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

/// Middleware that admits a request only if it carries a valid token for an
/// existing user. The resolved user is attached as [`AuthenticatedUser`].
pub async fn require_auth(
    State(auth): State<Arc<AuthService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthRejection> {
    let Some(token) = bearer_token(req.headers()) else {
        tracing::debug!(reason = %AuthError::MissingToken, "Rejected request");
        return Err(AuthRejection::Unauthenticated);
    };

    match auth.authenticate(token).await {
        Ok(user) => {
            req.extensions_mut().insert(AuthenticatedUser(user));
            Ok(next.run(req).await)
        }
        Err(Error::Auth(reason)) => {
            tracing::debug!(reason = %reason, "Rejected request");
            Err(AuthRejection::Unauthenticated)
        }
        Err(e) => {
            tracing::error!("Failed to resolve caller identity: {}", e);
            Err(AuthRejection::Unavailable)
        }
    }
}

/// Why the gate turned a request away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// Any token or subject failure
    Unauthenticated,
    /// The store could not be reached
    Unavailable,
}

/// The `401` every authentication failure turns into
pub fn unauthenticated_response(message: &str) -> Response {
    let mut response = (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response();
    response
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    response
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            AuthRejection::Unauthenticated => unauthenticated_response(UNAUTHENTICATED_MESSAGE),
            AuthRejection::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "error": "Authentication is temporarily unavailable" })),
            )
                .into_response(),
        }
    }
}
