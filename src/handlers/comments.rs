use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use model::entities::{comment, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

use crate::auth::Actor;
use crate::errors::{AppError, Result};
use crate::handlers::reviews::load_review;
use crate::permissions::{authorize, Action, Resource};
use crate::schemas::AppState;

/// Comment response model
#[derive(Debug, Serialize, ToSchema)]
pub struct CommentResponse {
    pub id: i32,
    pub text: String,
    /// Author username
    pub author: String,
    pub pub_date: DateTime<Utc>,
}

/// Request body for creating a comment
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateCommentRequest {
    pub text: String,
}

/// Request body for updating a comment
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateCommentRequest {
    pub text: Option<String>,
}

async fn to_response(model: comment::Model, db: &DatabaseConnection) -> Result<CommentResponse> {
    let author = user::Entity::find_by_id(model.author_id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound("user"))?;

    Ok(CommentResponse {
        id: model.id,
        text: model.text,
        author: author.username,
        pub_date: model.pub_date,
    })
}

async fn load_comment(
    db: &DatabaseConnection,
    title_id: i32,
    review_id: i32,
    comment_id: i32,
) -> Result<comment::Model> {
    load_review(db, title_id, review_id).await?;
    let model = comment::Entity::find_by_id(comment_id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound("comment"))?;
    if model.review_id != review_id {
        return Err(AppError::NotFound("comment"));
    }
    Ok(model)
}

/// List comments on a review
#[utoipa::path(
    get,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}/comments",
    tag = "comments",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
    ),
    responses(
        (status = 200, description = "Comments retrieved successfully", body = Vec<CommentResponse>),
        (status = 404, description = "Title or review not found")
    )
)]
#[instrument(skip(state))]
pub async fn list_comments(
    Path((title_id, review_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
) -> Result<Json<Vec<CommentResponse>>> {
    load_review(&state.db, title_id, review_id).await?;

    let comments = comment::Entity::find()
        .filter(comment::Column::ReviewId.eq(review_id))
        .order_by_asc(comment::Column::PubDate)
        .all(&state.db)
        .await?;
    debug!("Retrieved {} comments for review {}", comments.len(), review_id);

    let mut responses = Vec::with_capacity(comments.len());
    for model in comments {
        responses.push(to_response(model, &state.db).await?);
    }
    Ok(Json(responses))
}

/// Comment on a review
#[utoipa::path(
    post,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}/comments",
    tag = "comments",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
    ),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment created successfully", body = CommentResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Title or review not found")
    )
)]
#[instrument(skip(state, actor))]
pub async fn create_comment(
    Path((title_id, review_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(request): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>)> {
    authorize(Some(&actor), Action::Create, Resource::Content { author_id: actor.id })?;
    load_review(&state.db, title_id, review_id).await?;

    let new_comment = comment::ActiveModel {
        review_id: Set(review_id),
        author_id: Set(actor.id),
        text: Set(request.text),
        pub_date: Set(Utc::now()),
        ..Default::default()
    };
    let created = new_comment.insert(&state.db).await?;

    info!("Comment created with ID: {} on review {}", created.id, review_id);
    let response = to_response(created, &state.db).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Get a specific comment
#[utoipa::path(
    get,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}",
    tag = "comments",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
        ("comment_id" = i32, Path, description = "Comment ID"),
    ),
    responses(
        (status = 200, description = "Comment retrieved successfully", body = CommentResponse),
        (status = 404, description = "Title, review or comment not found")
    )
)]
#[instrument(skip(state))]
pub async fn get_comment(
    Path((title_id, review_id, comment_id)): Path<(i32, i32, i32)>,
    State(state): State<AppState>,
) -> Result<Json<CommentResponse>> {
    let model = load_comment(&state.db, title_id, review_id, comment_id).await?;
    Ok(Json(to_response(model, &state.db).await?))
}

/// Update a comment (author, moderator or admin)
#[utoipa::path(
    patch,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}",
    tag = "comments",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
        ("comment_id" = i32, Path, description = "Comment ID"),
    ),
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Comment updated successfully", body = CommentResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the author, a moderator or an admin"),
        (status = 404, description = "Title, review or comment not found")
    )
)]
#[instrument(skip(state, actor))]
pub async fn update_comment(
    Path((title_id, review_id, comment_id)): Path<(i32, i32, i32)>,
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(request): Json<UpdateCommentRequest>,
) -> Result<Json<CommentResponse>> {
    let existing = load_comment(&state.db, title_id, review_id, comment_id).await?;
    authorize(
        Some(&actor),
        Action::Modify,
        Resource::Content { author_id: existing.author_id },
    )?;

    let mut active: comment::ActiveModel = existing.into();
    if let Some(text) = request.text {
        active.text = Set(text);
    }
    let updated = active.update(&state.db).await?;

    info!("Comment updated with ID: {}", updated.id);
    Ok(Json(to_response(updated, &state.db).await?))
}

/// Delete a comment (author, moderator or admin)
#[utoipa::path(
    delete,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}",
    tag = "comments",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
        ("comment_id" = i32, Path, description = "Comment ID"),
    ),
    responses(
        (status = 204, description = "Comment deleted successfully"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the author, a moderator or an admin"),
        (status = 404, description = "Title, review or comment not found")
    )
)]
#[instrument(skip(state, actor))]
pub async fn delete_comment(
    Path((title_id, review_id, comment_id)): Path<(i32, i32, i32)>,
    State(state): State<AppState>,
    Actor(actor): Actor,
) -> Result<StatusCode> {
    let existing = load_comment(&state.db, title_id, review_id, comment_id).await?;
    authorize(
        Some(&actor),
        Action::Modify,
        Resource::Content { author_id: existing.author_id },
    )?;

    existing.delete(&state.db).await?;
    info!("Comment deleted with ID: {}", comment_id);
    Ok(StatusCode::NO_CONTENT)
}
