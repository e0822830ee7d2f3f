// Authentication service - business logic layer

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::auth::{
    error::AuthError,
    models::{AuthResponse, UserResponse},
    password::PasswordService,
    repository::UserRepository,
    token::TokenService,
};

/// Authentication service coordinating credential storage, password
/// verification, and token issuance
#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    token_service: TokenService,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(user_repo: UserRepository, token_service: TokenService) -> Self {
        Self {
            user_repo,
            token_service,
        }
    }

    /// Register a new user.
    ///
    /// Returns the created account without tokens; logging in is a
    /// separate step. A duplicate username fails with `UsernameTaken`.
    pub async fn register(&self, username: &str, password: &str) -> Result<UserResponse, AuthError> {
        if username.is_empty() {
            return Err(AuthError::ValidationError(
                "Username must not be empty".to_string(),
            ));
        }

        let password_hash = PasswordService::hash_password(password)?;
        let user = self.user_repo.create_user(username, &password_hash).await?;

        info!(user_id = user.id, "Registered new user");
        Ok(user.into())
    }

    /// Log a user in and mint a fresh token pair.
    ///
    /// Unknown usernames and wrong passwords produce the identical
    /// `InvalidCredentials` error so responses cannot distinguish them.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, AuthError> {
        let user = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !PasswordService::verify_password(password, &user.password_hash)? {
            warn!(user_id = user.id, "Login failed: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let access_token = self.token_service.generate_access_token(user.id, &user.username)?;
        let refresh_token = self.token_service.generate_refresh_token();

        // The new digest overwrites whatever was stored; any previously
        // issued refresh token for this account is dead from here on.
        self.user_repo
            .set_refresh_token(
                user.id,
                &TokenService::hash_refresh_token(&refresh_token),
                self.token_service.refresh_token_expires_at(),
            )
            .await?;

        debug!(user_id = user.id, "Issued token pair on login");
        Ok(AuthResponse {
            access_token,
            refresh_token,
        })
    }

    /// Exchange a refresh token for a new access+refresh pair, rotating
    /// the stored token.
    ///
    /// The rotation is conditional on the presented digest still being the
    /// stored one, so a superseded token can never rotate again: of two
    /// concurrent exchanges with the same token, exactly one succeeds.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse, AuthError> {
        let presented_hash = TokenService::hash_refresh_token(refresh_token);

        let user = self
            .user_repo
            .find_by_refresh_token(&presented_hash)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        match user.refresh_token_expires_at {
            Some(expires_at) if expires_at > Utc::now() => {}
            _ => {
                debug!(user_id = user.id, "Refresh token past its lifetime");
                return Err(AuthError::InvalidRefreshToken);
            }
        }

        let access_token = self.token_service.generate_access_token(user.id, &user.username)?;
        let new_refresh_token = self.token_service.generate_refresh_token();

        let rotated = self
            .user_repo
            .rotate_refresh_token(
                user.id,
                &presented_hash,
                &TokenService::hash_refresh_token(&new_refresh_token),
                self.token_service.refresh_token_expires_at(),
            )
            .await?;

        if !rotated {
            // Lost the race against a concurrent exchange of the same token.
            warn!(user_id = user.id, "Refresh rejected: token already rotated");
            return Err(AuthError::InvalidRefreshToken);
        }

        debug!(user_id = user.id, "Rotated refresh token");
        Ok(AuthResponse {
            access_token,
            refresh_token: new_refresh_token,
        })
    }

    /// Get the profile of an authenticated user
    pub async fn current_user(&self, user_id: i32) -> Result<UserResponse, AuthError> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(user.into())
    }

    /// Revoke the account's live refresh token, if any.
    /// Not exposed over HTTP; operational capability only.
    pub async fn revoke_refresh_token(&self, user_id: i32) -> Result<(), AuthError> {
        self.user_repo.clear_refresh_token(user_id).await?;
        info!(user_id, "Revoked refresh token");
        Ok(())
    }
}
