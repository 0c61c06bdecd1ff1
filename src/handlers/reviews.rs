use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use model::entities::{review, title, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

use crate::auth::Actor;
use crate::errors::{AppError, Result};
use crate::permissions::{authorize, Action, Resource};
use crate::schemas::AppState;
use crate::validators::validate_score;

/// Review response model
#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewResponse {
    pub id: i32,
    pub text: String,
    /// Author username
    pub author: String,
    pub score: i16,
    pub pub_date: DateTime<Utc>,
}

/// Request body for creating a review
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateReviewRequest {
    pub text: String,
    pub score: i16,
}

/// Request body for updating a review; absent fields stay untouched
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateReviewRequest {
    pub text: Option<String>,
    pub score: Option<i16>,
}

async fn to_response(model: review::Model, db: &DatabaseConnection) -> Result<ReviewResponse> {
    let author = user::Entity::find_by_id(model.author_id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound("user"))?;

    Ok(ReviewResponse {
        id: model.id,
        text: model.text,
        author: author.username,
        score: model.score,
        pub_date: model.pub_date,
    })
}

async fn load_title(db: &DatabaseConnection, title_id: i32) -> Result<title::Model> {
    title::Entity::find_by_id(title_id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound("title"))
}

/// A review addressed outside its own title's collection is not found.
/// The comment handlers lean on this for the same nesting check.
pub(crate) async fn load_review(
    db: &DatabaseConnection,
    title_id: i32,
    review_id: i32,
) -> Result<review::Model> {
    load_title(db, title_id).await?;
    let model = review::Entity::find_by_id(review_id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound("review"))?;
    if model.title_id != title_id {
        return Err(AppError::NotFound("review"));
    }
    Ok(model)
}

/// List reviews of a title, newest first
#[utoipa::path(
    get,
    path = "/api/v1/titles/{title_id}/reviews",
    tag = "reviews",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
    ),
    responses(
        (status = 200, description = "Reviews retrieved successfully", body = Vec<ReviewResponse>),
        (status = 404, description = "Title not found")
    )
)]
#[instrument(skip(state))]
pub async fn list_reviews(
    Path(title_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<Vec<ReviewResponse>>> {
    load_title(&state.db, title_id).await?;

    let reviews = review::Entity::find()
        .filter(review::Column::TitleId.eq(title_id))
        .order_by_desc(review::Column::PubDate)
        .all(&state.db)
        .await?;
    debug!("Retrieved {} reviews for title {}", reviews.len(), title_id);

    let mut responses = Vec::with_capacity(reviews.len());
    for model in reviews {
        responses.push(to_response(model, &state.db).await?);
    }
    Ok(Json(responses))
}

/// Create a review of a title; one per author per title
#[utoipa::path(
    post,
    path = "/api/v1/titles/{title_id}/reviews",
    tag = "reviews",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
    ),
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created successfully", body = ReviewResponse),
        (status = 400, description = "Invalid score or duplicate review"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Title not found")
    )
)]
#[instrument(skip(state, actor))]
pub async fn create_review(
    Path(title_id): Path<i32>,
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(request): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ReviewResponse>)> {
    authorize(Some(&actor), Action::Create, Resource::Content { author_id: actor.id })?;
    load_title(&state.db, title_id).await?;
    validate_score(request.score)?;

    let already_reviewed = review::Entity::find()
        .filter(review::Column::TitleId.eq(title_id))
        .filter(review::Column::AuthorId.eq(actor.id))
        .one(&state.db)
        .await?
        .is_some();
    if already_reviewed {
        return Err(AppError::duplicate_review());
    }

    let new_review = review::ActiveModel {
        title_id: Set(title_id),
        author_id: Set(actor.id),
        text: Set(request.text),
        score: Set(request.score),
        pub_date: Set(Utc::now()),
        ..Default::default()
    };
    // The unique index backstops the pre-check under concurrent inserts.
    let created = new_review
        .insert(&state.db)
        .await
        .map_err(|e| AppError::on_conflict(e, AppError::duplicate_review()))?;

    info!("Review created with ID: {} for title {}", created.id, title_id);
    let response = to_response(created, &state.db).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Get a specific review
#[utoipa::path(
    get,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}",
    tag = "reviews",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
    ),
    responses(
        (status = 200, description = "Review retrieved successfully", body = ReviewResponse),
        (status = 404, description = "Title or review not found")
    )
)]
#[instrument(skip(state))]
pub async fn get_review(
    Path((title_id, review_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
) -> Result<Json<ReviewResponse>> {
    let model = load_review(&state.db, title_id, review_id).await?;
    Ok(Json(to_response(model, &state.db).await?))
}

/// Update a review (author, moderator or admin)
#[utoipa::path(
    patch,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}",
    tag = "reviews",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
    ),
    request_body = UpdateReviewRequest,
    responses(
        (status = 200, description = "Review updated successfully", body = ReviewResponse),
        (status = 400, description = "Invalid score"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the author, a moderator or an admin"),
        (status = 404, description = "Title or review not found")
    )
)]
#[instrument(skip(state, actor))]
pub async fn update_review(
    Path((title_id, review_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(request): Json<UpdateReviewRequest>,
) -> Result<Json<ReviewResponse>> {
    let existing = load_review(&state.db, title_id, review_id).await?;
    authorize(
        Some(&actor),
        Action::Modify,
        Resource::Content { author_id: existing.author_id },
    )?;

    if let Some(score) = request.score {
        validate_score(score)?;
    }

    let mut active: review::ActiveModel = existing.into();
    if let Some(text) = request.text {
        active.text = Set(text);
    }
    if let Some(score) = request.score {
        active.score = Set(score);
    }
    let updated = active.update(&state.db).await?;

    info!("Review updated with ID: {}", updated.id);
    Ok(Json(to_response(updated, &state.db).await?))
}

/// Delete a review (author, moderator or admin)
#[utoipa::path(
    delete,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}",
    tag = "reviews",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
    ),
    responses(
        (status = 204, description = "Review deleted successfully"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the author, a moderator or an admin"),
        (status = 404, description = "Title or review not found")
    )
)]
#[instrument(skip(state, actor))]
pub async fn delete_review(
    Path((title_id, review_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
    Actor(actor): Actor,
) -> Result<StatusCode> {
    let existing = load_review(&state.db, title_id, review_id).await?;
    authorize(
        Some(&actor),
        Action::Modify,
        Resource::Content { author_id: existing.author_id },
    )?;

    existing.delete(&state.db).await?;
    info!("Review deleted with ID: {}", review_id);
    Ok(StatusCode::NO_CONTENT)
}
