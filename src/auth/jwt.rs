//! JWT access token handling
//!
//! Tokens carry exactly two claims: `sub` (the user id as a string) and `exp`
//! (Unix seconds, UTC). They are signed with a shared HMAC secret that is
//! loaded once at startup; rotating it invalidates every issued token.

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{
    decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use crate::auth::error::AuthError;
use crate::auth::models::UserId;
use crate::error::{Error, Result};

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Expiration time
    pub exp: i64,
}

impl Claims {
    pub fn new(subject: UserId, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub: Some(subject.to_string()),
            exp: expires_at.timestamp(),
        }
    }

    /// Expiry is inclusive: a token is still good during its final second
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() > self.exp
    }
}

/// Parse an HMAC algorithm name such as `HS256`
pub fn parse_algorithm(name: &str) -> Result<Algorithm> {
    let algorithm = Algorithm::from_str(name.trim())
        .map_err(|_| Error::Config(format!("Unknown JWT algorithm: {}", name)))?;

    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        other => Err(Error::Config(format!(
            "JWT algorithm {:?} needs a key pair; only HS256, HS384 and HS512 are supported",
            other
        ))),
    }
}

/// Issues and verifies signed access tokens
#[derive(Clone)]
pub struct TokenService {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    default_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], algorithm: Algorithm, default_ttl: Duration) -> Self {
        Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            default_ttl,
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Create a token for `subject` that expires `ttl` from now
    pub fn issue(&self, subject: UserId, ttl: Duration) -> Result<String> {
        self.issue_at(subject, ttl, Utc::now())
    }

    /// Create a token as if the current time were `now`
    pub fn issue_at(&self, subject: UserId, ttl: Duration, now: DateTime<Utc>) -> Result<String> {
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| Error::Config("Token lifetime overflows the calendar".to_string()))?;

        let claims = Claims::new(subject, expires_at);
        Ok(encode(&Header::new(self.algorithm), &claims, &self.encoding_key)?)
    }

    /// Verify a token and return its subject
    pub fn verify(&self, token: &str) -> std::result::Result<UserId, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as if the current time were `now`
    pub fn verify_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> std::result::Result<UserId, AuthError> {
        if token.split('.').count() != 3 {
            return Err(AuthError::MalformedToken);
        }

        // Expiry is checked below against `now`, so the library only checks
        // structure, algorithm and signature.
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        decode_header(token).map_err(|_| AuthError::MalformedToken)?;

        // The header parsed, and the payload is only decoded once the
        // signature checks out, so undecodable base64 here is the signature.
        let claims = match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => data.claims,
            Err(e) if matches!(e.kind(), ErrorKind::Base64(_)) => {
                return Err(AuthError::InvalidSignature)
            }
            Err(e) => return Err(e.into()),
        };

        if claims.is_expired_at(now) {
            return Err(AuthError::TokenExpired);
        }

        let subject = claims.sub.ok_or(AuthError::MissingSubject)?;
        subject
            .parse::<UserId>()
            .map_err(|_| AuthError::MalformedToken)
    }
}
