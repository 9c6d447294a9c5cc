//! Authentication failure reasons
//!
//! These variants exist for diagnostics. At the HTTP boundary every token or
//! subject failure becomes the same "unauthenticated" response.

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown email or wrong password at login
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// No usable `Authorization: Bearer` header
    #[error("No bearer token presented")]
    MissingToken,

    #[error("Malformed token")]
    MalformedToken,

    #[error("Token signature does not match")]
    InvalidSignature,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token has no subject")]
    MissingSubject,

    /// The subject verified but no longer maps to a stored user
    #[error("Token subject does not match any user")]
    UnknownSubject,
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => AuthError::InvalidSignature,
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::MalformedToken,
        }
    }
}
