//! Confirmation codes and bearer tokens.
//!
//! Registration hands out a confirmation code derived from the user's
//! current key fields; changing any of them invalidates the code. A valid
//! code is exchanged for a stateless JWT access token.

use axum::{async_trait, extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use model::entities::user;
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::errors::AppError;
use crate::schemas::AppState;

/// Access tokens are valid for a week.
const TOKEN_LIFETIME_DAYS: i64 = 7;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Signs and verifies bearer tokens and derives confirmation codes from
/// the shared server secret.
#[derive(Clone)]
pub struct TokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    secret: String,
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenManager")
    }
}

impl TokenManager {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            secret: secret.to_string(),
        }
    }

    /// Mints an access token embedding the user identity.
    pub fn mint(&self, user_id: i32) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::days(TOKEN_LIFETIME_DAYS)).timestamp(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    /// Verifies a bearer token; any failure is an authentication error,
    /// never a server error.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthorized)
    }

    /// Derives the single-use confirmation code for a user's current
    /// state. Recomputed on every check, so a change to any of the key
    /// fields invalidates outstanding codes; until then the same code
    /// keeps validating.
    pub fn confirmation_code(&self, user: &user::Model) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update([0u8]);
        hasher.update(user.id.to_le_bytes());
        hasher.update(user.username.as_bytes());
        hasher.update([0u8]);
        hasher.update(user.email.as_bytes());
        hasher.update([0u8]);
        hasher.update(user.role.as_str().as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn check_confirmation_code(&self, user: &user::Model, code: &str) -> bool {
        self.confirmation_code(user) == code
    }
}

/// An authenticated actor. Rejects the request with 401 when the bearer
/// token is missing, invalid, or names a deleted user.
#[derive(Debug, Clone)]
pub struct Actor(pub user::Model);

/// An optional actor for routes that are world-readable but gate writes.
/// A present-but-invalid credential is still rejected.
#[derive(Debug, Clone)]
pub struct MaybeActor(pub Option<user::Model>);

async fn actor_from_parts(parts: &Parts, state: &AppState) -> Result<user::Model, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AppError::Unauthorized)?;
    let token = header.strip_prefix("Bearer ").ok_or(AppError::Unauthorized)?;

    let claims = state.tokens.verify(token)?;
    let user_id: i32 = claims.sub.parse().map_err(|_| AppError::Unauthorized)?;

    user::Entity::find_by_id(user_id)
        .one(&state.db)
        .await?
        .ok_or(AppError::Unauthorized)
}

#[async_trait]
impl FromRequestParts<AppState> for Actor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        actor_from_parts(parts, state).await.map(Actor)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeActor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if parts.headers.get(AUTHORIZATION).is_none() {
            return Ok(MaybeActor(None));
        }
        actor_from_parts(parts, state).await.map(|user| MaybeActor(Some(user)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::entities::user::Role;

    fn sample_user() -> user::Model {
        user::Model {
            id: 42,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            bio: String::new(),
            role: Role::User,
            is_superuser: false,
        }
    }

    #[test]
    fn token_round_trip() {
        let tokens = TokenManager::new("test-secret");
        let token = tokens.mint(42).unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let token = TokenManager::new("one-secret").mint(42).unwrap();
        let verifier = TokenManager::new("another-secret");
        assert!(matches!(verifier.verify(&token), Err(AppError::Unauthorized)));
    }

    #[test]
    fn confirmation_code_is_stable_for_unchanged_state() {
        let tokens = TokenManager::new("test-secret");
        let user = sample_user();
        let code = tokens.confirmation_code(&user);
        assert!(tokens.check_confirmation_code(&user, &code));
        // Reuse is allowed while the state is unchanged.
        assert!(tokens.check_confirmation_code(&user, &code));
    }

    #[test]
    fn confirmation_code_invalidated_by_state_change() {
        let tokens = TokenManager::new("test-secret");
        let user = sample_user();
        let code = tokens.confirmation_code(&user);

        let mut promoted = user.clone();
        promoted.role = Role::Moderator;
        assert!(!tokens.check_confirmation_code(&promoted, &code));

        let mut readdressed = user.clone();
        readdressed.email = "alice@elsewhere.example".to_string();
        assert!(!tokens.check_confirmation_code(&readdressed, &code));
    }

    #[test]
    fn wrong_code_is_rejected() {
        let tokens = TokenManager::new("test-secret");
        let user = sample_user();
        assert!(!tokens.check_confirmation_code(&user, "deadbeef"));
    }
}
