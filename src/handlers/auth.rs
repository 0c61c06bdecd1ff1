//! Registration and token exchange.
//!
//! Signup is idempotent for an exact (username, email) pair: the same
//! confirmation code is re-issued. A pair clashing with an existing
//! account on either field alone is rejected.

use axum::{extract::State, response::Json};
use model::entities::user::{self, Role};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;

use crate::errors::{AppError, Result};
use crate::schemas::AppState;
use crate::validators::{validate_email, validate_username};

/// Request body for registration
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
}

/// Registration echoes the accepted identity back
#[derive(Debug, Serialize, ToSchema)]
pub struct SignupResponse {
    pub username: String,
    pub email: String,
}

/// Request body for exchanging a confirmation code for a token
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct TokenRequest {
    pub username: String,
    pub confirmation_code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

/// Inserts a first-time registration. The unique keys backstop the
/// read-then-check in `signup` when two registrations for the same pair
/// race past it.
async fn register_user(
    db: &DatabaseConnection,
    username: &str,
    email: &str,
) -> Result<user::Model> {
    let new_user = user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(email.to_string()),
        role: Set(Role::User),
        ..Default::default()
    };
    new_user.insert(db).await.map_err(|e| {
        AppError::on_conflict(
            e,
            AppError::validation("email", "username or email is already registered"),
        )
    })
}

/// Register a user and send a confirmation code
#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    tag = "auth",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Confirmation code sent", body = SignupResponse),
        (status = 400, description = "Invalid or conflicting identity")
    )
)]
#[instrument(skip(state))]
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<Json<SignupResponse>> {
    validate_username(&request.username)?;
    validate_email(&request.email)?;

    let by_username = user::Entity::find()
        .filter(user::Column::Username.eq(&request.username))
        .one(&state.db)
        .await?;
    let by_email = user::Entity::find()
        .filter(user::Column::Email.eq(&request.email))
        .one(&state.db)
        .await?;

    let account = match (by_username, by_email) {
        // Exact pair: re-issue the code for the existing account.
        (Some(found), _) if found.email == request.email => found,
        (Some(_), _) => {
            return Err(AppError::validation(
                "email",
                "username is already registered with a different email",
            ));
        }
        (None, Some(_)) => {
            return Err(AppError::validation(
                "email",
                "email is already registered to another user",
            ));
        }
        (None, None) => {
            debug!("Registering new user: {}", request.username);
            register_user(&state.db, &request.username, &request.email).await?
        }
    };

    let code = state.tokens.confirmation_code(&account);

    // Delivery is best-effort; the response does not depend on it.
    if let Err(e) = state.mailer.send(
        &account.email,
        "Registration confirmation",
        &format!("Your confirmation code: {code}"),
    ) {
        warn!("Failed to deliver confirmation code to {}: {}", account.email, e);
    }

    info!("Issued confirmation code for user: {}", account.username);
    Ok(Json(SignupResponse {
        username: account.username,
        email: account.email,
    }))
}

/// Exchange a confirmation code for an access token
#[utoipa::path(
    post,
    path = "/api/v1/auth/token",
    tag = "auth",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Invalid confirmation code"),
        (status = 404, description = "Unknown username")
    )
)]
#[instrument(skip(state))]
pub async fn obtain_token(
    State(state): State<AppState>,
    Json(request): Json<TokenRequest>,
) -> Result<Json<TokenResponse>> {
    // Unknown username is 404, not 400: the username is the resource here.
    let account = user::Entity::find()
        .filter(user::Column::Username.eq(&request.username))
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("user"))?;

    if !state
        .tokens
        .check_confirmation_code(&account, &request.confirmation_code)
    {
        return Err(AppError::validation(
            "confirmation_code",
            "invalid confirmation code",
        ));
    }

    let token = state.tokens.mint(account.id)?;
    info!("Issued access token for user: {}", account.username);
    Ok(Json(TokenResponse { token }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_utils::{create_user, setup_test_db};

    /// A registration that loses the race to an identical one must come
    /// back as the usual validation error, not a bare storage failure.
    #[tokio::test]
    async fn lost_registration_race_is_a_validation_error() {
        let db = setup_test_db().await;
        create_user(&db, "alice", Role::User, false).await;

        let result = register_user(&db, "alice", "alice@example.com").await;
        assert!(matches!(
            result,
            Err(AppError::Validation { field: "email", .. })
        ));
    }
}
