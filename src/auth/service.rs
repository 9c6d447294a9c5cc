//! Authentication service
//!
//! Built once at startup from [`AuthConfig`] and shared by every request.
//! Coordinates the password hasher, the token service and the user store.

use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::auth::error::AuthError;
use crate::auth::jwt::{parse_algorithm, TokenService};
use crate::auth::models::{NewUser, RegisterRequest, TokenResponse, User};
use crate::auth::password::{PasswordHasher, MAX_PASSWORD_BYTES};
use crate::config::AuthConfig;
use crate::error::{Error, Result};
use crate::store::Store;

/// Login, registration and bearer-token resolution
#[derive(Clone)]
pub struct AuthService {
    hasher: PasswordHasher,
    tokens: TokenService,
    store: Arc<dyn Store>,
}

impl AuthService {
    pub fn new(hasher: PasswordHasher, tokens: TokenService, store: Arc<dyn Store>) -> Self {
        Self {
            hasher,
            tokens,
            store,
        }
    }

    /// Build the service from validated configuration
    pub fn from_config(config: &AuthConfig, store: Arc<dyn Store>) -> Result<Self> {
        if config.secret_key.is_empty() {
            return Err(Error::Config("auth.secret_key must be set".to_string()));
        }

        let algorithm = parse_algorithm(&config.algorithm)?;
        let tokens = TokenService::new(
            config.secret_key.as_bytes(),
            algorithm,
            config.access_token_ttl()?,
        );

        Ok(Self::new(PasswordHasher::new(config.bcrypt_cost), tokens, store))
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Check credentials and mint an access token.
    ///
    /// Unknown email and wrong password produce the same error.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse> {
        let Some(user) = self.store.find_user_by_email(email.trim()).await? else {
            tracing::warn!("Login failed: no account for the given email");
            return Err(AuthError::InvalidCredentials.into());
        };

        let hasher = self.hasher;
        let password = password.to_string();
        let digest = user.password_hash.clone();
        let matches =
            tokio::task::spawn_blocking(move || hasher.verify(&password, &digest)).await?;

        if !matches {
            tracing::warn!(user_id = user.id, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        let token = self.tokens.issue(user.id, self.tokens.default_ttl())?;
        tracing::info!(user_id = user.id, "User logged in");
        Ok(TokenResponse::bearer(token))
    }

    /// Validate a registration request and store the new user
    pub async fn register(&self, request: RegisterRequest) -> Result<User> {
        validate_registration(&request)?;

        let email = request.email.trim().to_string();
        let username = request.username.trim().to_string();

        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(Error::EmailTaken);
        }
        if self.store.find_user_by_username(&username).await?.is_some() {
            return Err(Error::UsernameTaken);
        }

        let hasher = self.hasher;
        let password = request.password;
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password)).await??;

        let user = self
            .store
            .create_user(NewUser {
                username,
                email,
                full_name: request.full_name.trim().to_string(),
                password_hash,
            })
            .await?;

        tracing::info!(user_id = user.id, username = %user.username, "Registered user");
        Ok(user)
    }

    /// Verify a bearer token and load the user it names.
    ///
    /// Tokens stay valid until they expire even if the user has since been
    /// removed; that case surfaces here as `UnknownSubject`.
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let user_id = self.tokens.verify(token)?;

        self.store
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::UnknownSubject.into())
    }
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
            .expect("Invalid regex pattern - this is a bug in the codebase")
    })
}

fn validate_registration(request: &RegisterRequest) -> Result<()> {
    if request.username.trim().is_empty() {
        return Err(Error::Validation("username must not be empty".to_string()));
    }
    if request.full_name.trim().is_empty() {
        return Err(Error::Validation("full_name must not be empty".to_string()));
    }
    if !email_pattern().is_match(request.email.trim()) {
        return Err(Error::Validation("email is not a valid address".to_string()));
    }
    if request.password.is_empty() {
        return Err(Error::Validation("password must not be empty".to_string()));
    }
    if request.password.len() > MAX_PASSWORD_BYTES {
        return Err(Error::Validation(format!(
            "password must be at most {} bytes",
            MAX_PASSWORD_BYTES
        )));
    }
    Ok(())
}
