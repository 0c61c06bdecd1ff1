use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use model::entities::genre;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::{IntoParams, ToSchema};

use crate::auth::MaybeActor;
use crate::errors::{AppError, Result};
use crate::permissions::{authorize, Action, Resource};
use crate::schemas::AppState;
use crate::validators::validate_slug;

/// Genre response model
#[derive(Debug, Serialize, ToSchema)]
pub struct GenreResponse {
    pub name: String,
    pub slug: String,
}

impl From<genre::Model> for GenreResponse {
    fn from(model: genre::Model) -> Self {
        Self {
            name: model.name,
            slug: model.slug,
        }
    }
}

/// Request body for creating a genre
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateGenreRequest {
    pub name: String,
    pub slug: String,
}

/// Query parameters for the genre list
#[derive(Debug, Deserialize, IntoParams)]
pub struct GenreQuery {
    /// Substring of the genre name
    pub search: Option<String>,
}

/// List genres, optionally searched by name
#[utoipa::path(
    get,
    path = "/api/v1/genres",
    tag = "genres",
    params(GenreQuery),
    responses(
        (status = 200, description = "Genres retrieved successfully", body = Vec<GenreResponse>)
    )
)]
#[instrument(skip(state))]
pub async fn list_genres(
    Query(query): Query<GenreQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<GenreResponse>>> {
    let mut select = genre::Entity::find().order_by_asc(genre::Column::Slug);
    if let Some(term) = &query.search {
        select = select.filter(genre::Column::Name.contains(term));
    }

    let genres = select.all(&state.db).await?;
    debug!("Retrieved {} genres", genres.len());

    Ok(Json(genres.into_iter().map(GenreResponse::from).collect()))
}

/// Create a genre (admin only)
#[utoipa::path(
    post,
    path = "/api/v1/genres",
    tag = "genres",
    request_body = CreateGenreRequest,
    responses(
        (status = 201, description = "Genre created successfully", body = GenreResponse),
        (status = 400, description = "Invalid or duplicate slug"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin")
    )
)]
#[instrument(skip(state, actor))]
pub async fn create_genre(
    State(state): State<AppState>,
    MaybeActor(actor): MaybeActor,
    Json(request): Json<CreateGenreRequest>,
) -> Result<(StatusCode, Json<GenreResponse>)> {
    authorize(actor.as_ref(), Action::Create, Resource::Catalog)?;
    validate_slug(&request.slug)?;

    let new_genre = genre::ActiveModel {
        name: Set(request.name),
        slug: Set(request.slug.clone()),
        ..Default::default()
    };
    let created = new_genre.insert(&state.db).await.map_err(|e| {
        AppError::on_conflict(
            e,
            AppError::validation("slug", format!("slug '{}' already exists", request.slug)),
        )
    })?;

    info!("Genre created: {}", created.slug);
    Ok((StatusCode::CREATED, Json(GenreResponse::from(created))))
}

/// Delete a genre by slug (admin only)
///
/// Titles tagged with it lose the tag but keep existing.
#[utoipa::path(
    delete,
    path = "/api/v1/genres/{slug}",
    tag = "genres",
    params(
        ("slug" = String, Path, description = "Genre slug"),
    ),
    responses(
        (status = 204, description = "Genre deleted successfully"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Genre not found")
    )
)]
#[instrument(skip(state, actor))]
pub async fn delete_genre(
    Path(slug): Path<String>,
    State(state): State<AppState>,
    MaybeActor(actor): MaybeActor,
) -> Result<StatusCode> {
    authorize(actor.as_ref(), Action::Modify, Resource::Catalog)?;

    let existing = genre::Entity::find_by_slug(&slug)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("genre"))?;

    existing.delete(&state.db).await?;
    info!("Genre deleted: {}", slug);
    Ok(StatusCode::NO_CONTENT)
}
