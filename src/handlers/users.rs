//! Admin user management plus the self-service `/me` surface. Everything
//! here is keyed by username, not by numeric id.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use model::entities::user::{self, Role};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::{IntoParams, ToSchema};

use crate::auth::{Actor, MaybeActor};
use crate::errors::{AppError, Result};
use crate::permissions::{authorize, Action, Resource};
use crate::schemas::AppState;
use crate::validators::{parse_role, validate_email, validate_username};

/// User response model
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub role: String,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            username: model.username,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            bio: model.bio,
            role: model.role.as_str().to_string(),
        }
    }
}

/// Request body for creating a user (admin only)
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    /// Role name; defaults to "user"
    pub role: Option<String>,
}

/// Request body for updating a user; absent fields stay untouched
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: Option<String>,
}

/// Query parameters for the user directory
#[derive(Debug, Deserialize, IntoParams)]
pub struct UserQuery {
    /// Substring of the username
    pub search: Option<String>,
}

async fn load_by_username(db: &DatabaseConnection, username: &str) -> Result<user::Model> {
    user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?
        .ok_or(AppError::NotFound("user"))
}

/// Applies an update request to an account. Role changes are already
/// resolved by the caller; `/me` passes `None` to pin the current role.
async fn apply_update(
    db: &DatabaseConnection,
    account: user::Model,
    request: UpdateUserRequest,
    role: Option<Role>,
) -> Result<user::Model> {
    if let Some(username) = &request.username {
        validate_username(username)?;
    }
    if let Some(email) = &request.email {
        validate_email(email)?;
    }

    let mut active: user::ActiveModel = account.into();
    if let Some(username) = request.username {
        active.username = Set(username);
    }
    if let Some(email) = request.email {
        active.email = Set(email);
    }
    if let Some(first_name) = request.first_name {
        active.first_name = Set(first_name);
    }
    if let Some(last_name) = request.last_name {
        active.last_name = Set(last_name);
    }
    if let Some(bio) = request.bio {
        active.bio = Set(bio);
    }
    if let Some(role) = role {
        active.role = Set(role);
    }

    let updated = active.update(db).await.map_err(|e| {
        AppError::on_conflict(
            e,
            AppError::validation("username", "username or email already taken"),
        )
    })?;
    Ok(updated)
}

/// List users, optionally searched by username (admin only)
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "users",
    params(UserQuery),
    responses(
        (status = 200, description = "Users retrieved successfully", body = Vec<UserResponse>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin")
    )
)]
#[instrument(skip(state, actor))]
pub async fn list_users(
    Query(query): Query<UserQuery>,
    State(state): State<AppState>,
    MaybeActor(actor): MaybeActor,
) -> Result<Json<Vec<UserResponse>>> {
    authorize(actor.as_ref(), Action::Read, Resource::Users)?;

    let mut select = user::Entity::find().order_by_asc(user::Column::Username);
    if let Some(term) = &query.search {
        select = select.filter(user::Column::Username.contains(term));
    }

    let users = select.all(&state.db).await?;
    debug!("Retrieved {} users", users.len());

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Create a user (admin only)
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created successfully", body = UserResponse),
        (status = 400, description = "Invalid or conflicting identity"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin")
    )
)]
#[instrument(skip(state, actor))]
pub async fn create_user(
    State(state): State<AppState>,
    MaybeActor(actor): MaybeActor,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    authorize(actor.as_ref(), Action::Create, Resource::Users)?;
    validate_username(&request.username)?;
    validate_email(&request.email)?;
    let role = match &request.role {
        Some(value) => parse_role(value)?,
        None => Role::User,
    };

    let new_user = user::ActiveModel {
        username: Set(request.username.clone()),
        email: Set(request.email),
        first_name: Set(request.first_name.unwrap_or_default()),
        last_name: Set(request.last_name.unwrap_or_default()),
        bio: Set(request.bio.unwrap_or_default()),
        role: Set(role),
        ..Default::default()
    };
    let created = new_user.insert(&state.db).await.map_err(|e| {
        AppError::on_conflict(
            e,
            AppError::validation("username", "username or email already taken"),
        )
    })?;

    info!("User created: {}", created.username);
    Ok((StatusCode::CREATED, Json(UserResponse::from(created))))
}

/// Get a user by username (admin only)
#[utoipa::path(
    get,
    path = "/api/v1/users/{username}",
    tag = "users",
    params(
        ("username" = String, Path, description = "Username"),
    ),
    responses(
        (status = 200, description = "User retrieved successfully", body = UserResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "User not found")
    )
)]
#[instrument(skip(state, actor))]
pub async fn get_user(
    Path(username): Path<String>,
    State(state): State<AppState>,
    MaybeActor(actor): MaybeActor,
) -> Result<Json<UserResponse>> {
    authorize(actor.as_ref(), Action::Read, Resource::Users)?;
    let account = load_by_username(&state.db, &username).await?;
    Ok(Json(UserResponse::from(account)))
}

/// Update a user by username (admin only)
#[utoipa::path(
    patch,
    path = "/api/v1/users/{username}",
    tag = "users",
    params(
        ("username" = String, Path, description = "Username"),
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated successfully", body = UserResponse),
        (status = 400, description = "Invalid field"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "User not found")
    )
)]
#[instrument(skip(state, actor))]
pub async fn update_user(
    Path(username): Path<String>,
    State(state): State<AppState>,
    MaybeActor(actor): MaybeActor,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>> {
    authorize(actor.as_ref(), Action::Modify, Resource::Users)?;
    let account = load_by_username(&state.db, &username).await?;

    let role = match &request.role {
        Some(value) => Some(parse_role(value)?),
        None => None,
    };
    let updated = apply_update(&state.db, account, request, role).await?;

    info!("User updated: {}", updated.username);
    Ok(Json(UserResponse::from(updated)))
}

/// Delete a user by username (admin only)
///
/// Their reviews and comments go with them.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{username}",
    tag = "users",
    params(
        ("username" = String, Path, description = "Username"),
    ),
    responses(
        (status = 204, description = "User deleted successfully"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "User not found")
    )
)]
#[instrument(skip(state, actor))]
pub async fn delete_user(
    Path(username): Path<String>,
    State(state): State<AppState>,
    MaybeActor(actor): MaybeActor,
) -> Result<StatusCode> {
    authorize(actor.as_ref(), Action::Modify, Resource::Users)?;
    let account = load_by_username(&state.db, &username).await?;

    account.delete(&state.db).await?;
    info!("User deleted: {}", username);
    Ok(StatusCode::NO_CONTENT)
}

/// Get the authenticated user's own profile
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    tag = "users",
    responses(
        (status = 200, description = "Profile retrieved successfully", body = UserResponse),
        (status = 401, description = "Not authenticated")
    )
)]
#[instrument(skip(actor))]
pub async fn get_me(Actor(actor): Actor) -> Result<Json<UserResponse>> {
    authorize(Some(&actor), Action::Read, Resource::OwnProfile { owner_id: actor.id })?;
    Ok(Json(UserResponse::from(actor)))
}

/// Update the authenticated user's own profile
///
/// The role field is pinned: a role supplied here is ignored, only an
/// admin can promote through the user-management surface.
#[utoipa::path(
    patch,
    path = "/api/v1/users/me",
    tag = "users",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Profile updated successfully", body = UserResponse),
        (status = 400, description = "Invalid field"),
        (status = 401, description = "Not authenticated")
    )
)]
#[instrument(skip(state, actor))]
pub async fn update_me(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>> {
    authorize(Some(&actor), Action::Modify, Resource::OwnProfile { owner_id: actor.id })?;

    let updated = apply_update(&state.db, actor, request, None).await?;

    info!("Profile updated: {}", updated.username);
    Ok(Json(UserResponse::from(updated)))
}
