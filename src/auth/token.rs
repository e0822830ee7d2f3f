// Token issuance: signed JWT access tokens and opaque refresh tokens

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::auth::error::AuthError;

/// Number of random alphanumeric characters in a refresh token.
/// 64 base-62 characters carry well over the 128 bits needed to make
/// guessing infeasible.
const REFRESH_TOKEN_LENGTH: usize = 64;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,         // user id
    pub username: String,
    pub exp: i64,         // expiration timestamp
    pub iat: i64,         // issued at timestamp
}

/// Token service for access token signing and refresh token generation.
///
/// The signing secret is loaded once at startup and shared read-only; a
/// missing secret is a startup failure, never a per-request one.
#[derive(Clone)]
pub struct TokenService {
    secret: String,
    access_token_duration: i64,  // in seconds
    refresh_token_duration: i64, // in seconds
}

impl TokenService {
    /// Create a new TokenService with the signing secret.
    /// Access tokens expire in 15 minutes, refresh tokens in 7 days.
    pub fn new(secret: String) -> Self {
        Self {
            secret,
            access_token_duration: 900,      // 15 minutes
            refresh_token_duration: 604800,  // 7 days
        }
    }

    /// Generate a signed access token embedding the account identity
    pub fn generate_access_token(&self, user_id: i32, username: &str) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let exp = now + self.access_token_duration;

        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            iat: now,
            exp,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenGenerationError(e.to_string()))
    }

    /// Generate an opaque refresh token from a cryptographically secure
    /// random source. The plaintext goes to the client; only its digest
    /// is ever stored.
    pub fn generate_refresh_token(&self) -> String {
        thread_rng()
            .sample_iter(&Alphanumeric)
            .take(REFRESH_TOKEN_LENGTH)
            .map(char::from)
            .collect()
    }

    /// SHA-256 digest of a refresh token, as stored server-side
    pub fn hash_refresh_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Expiry timestamp for a refresh token issued now
    pub fn refresh_token_expires_at(&self) -> DateTime<Utc> {
        Utc::now() + Duration::seconds(self.refresh_token_duration)
    }

    /// Validate an access token's signature and expiry
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
            _ => AuthError::InvalidToken,
        })
    }
}
