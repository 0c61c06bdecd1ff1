use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use model::entities::{category, genre, genre_title, title};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::{IntoParams, ToSchema};

use crate::auth::MaybeActor;
use crate::errors::{AppError, Result};
use crate::handlers::categories::CategoryResponse;
use crate::handlers::genres::GenreResponse;
use crate::permissions::{authorize, Action, Resource};
use crate::schemas::AppState;
use crate::validators::validate_year;

/// Title response model. The rating is recomputed from the current
/// reviews on every read and is absent when the title has none.
#[derive(Debug, Serialize, ToSchema)]
pub struct TitleResponse {
    pub id: i32,
    pub name: String,
    pub year: i32,
    pub rating: Option<i32>,
    pub description: String,
    pub genre: Vec<GenreResponse>,
    pub category: Option<CategoryResponse>,
}

/// Request body for creating a title
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateTitleRequest {
    pub name: String,
    pub year: i32,
    #[serde(default)]
    pub description: Option<String>,
    /// Genre slugs to attach
    #[serde(default)]
    pub genre: Vec<String>,
    /// Category slug
    #[serde(default)]
    pub category: Option<String>,
}

/// Request body for updating a title; absent fields stay untouched
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateTitleRequest {
    pub name: Option<String>,
    pub year: Option<i32>,
    pub description: Option<String>,
    /// Replaces the full genre set when present
    pub genre: Option<Vec<String>>,
    /// Replaces the category when present. A category can be swapped but
    /// never cleared here; absent leaves it untouched.
    pub category: Option<String>,
}

/// Query parameters for filtering the title list
#[derive(Debug, Deserialize, IntoParams)]
pub struct TitleQuery {
    /// Category slug
    pub category: Option<String>,
    /// Genre slug
    pub genre: Option<String>,
    /// Substring of the title name
    pub name: Option<String>,
    /// Exact release year
    pub year: Option<i32>,
}

async fn to_response(model: title::Model, db: &DatabaseConnection) -> Result<TitleResponse> {
    let rating = model.rating(db).await?;
    let genres = model.genres(db).await?;
    let category = model.category(db).await?;

    Ok(TitleResponse {
        id: model.id,
        name: model.name,
        year: model.year,
        rating,
        description: model.description,
        genre: genres.into_iter().map(GenreResponse::from).collect(),
        category: category.map(CategoryResponse::from),
    })
}

/// Resolves a category slug; a missing slug is a validation error, not a
/// silently null category.
async fn resolve_category(db: &DatabaseConnection, slug: &str) -> Result<category::Model> {
    category::Entity::find_by_slug(slug)
        .one(db)
        .await?
        .ok_or_else(|| {
            AppError::validation("category", format!("unknown category '{slug}'"))
        })
}

async fn resolve_genres(db: &DatabaseConnection, slugs: &[String]) -> Result<Vec<genre::Model>> {
    let mut genres = Vec::with_capacity(slugs.len());
    for slug in slugs {
        let found = genre::Entity::find_by_slug(slug)
            .one(db)
            .await?
            .ok_or_else(|| AppError::validation("genre", format!("unknown genre '{slug}'")))?;
        genres.push(found);
    }
    Ok(genres)
}

async fn attach_genres(db: &DatabaseConnection, title_id: i32, genres: &[genre::Model]) -> Result<()> {
    for genre in genres {
        genre_title::ActiveModel {
            title_id: Set(title_id),
            genre_id: Set(genre.id),
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

/// List titles, optionally filtered
#[utoipa::path(
    get,
    path = "/api/v1/titles",
    tag = "titles",
    params(TitleQuery),
    responses(
        (status = 200, description = "Titles retrieved successfully", body = Vec<TitleResponse>)
    )
)]
#[instrument(skip(state))]
pub async fn list_titles(
    Query(query): Query<TitleQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<TitleResponse>>> {
    let mut select = title::Entity::find().order_by_asc(title::Column::Id);

    if let Some(name) = &query.name {
        select = select.filter(title::Column::Name.contains(name));
    }
    if let Some(year) = query.year {
        select = select.filter(title::Column::Year.eq(year));
    }
    if let Some(slug) = &query.category {
        // An unknown slug matches nothing rather than erroring.
        match category::Entity::find_by_slug(slug).one(&state.db).await? {
            Some(found) => select = select.filter(title::Column::CategoryId.eq(found.id)),
            None => return Ok(Json(vec![])),
        }
    }
    if let Some(slug) = &query.genre {
        match genre::Entity::find_by_slug(slug).one(&state.db).await? {
            Some(found) => {
                let title_ids: Vec<i32> = genre_title::Entity::find()
                    .filter(genre_title::Column::GenreId.eq(found.id))
                    .all(&state.db)
                    .await?
                    .into_iter()
                    .map(|row| row.title_id)
                    .collect();
                select = select.filter(title::Column::Id.is_in(title_ids));
            }
            None => return Ok(Json(vec![])),
        }
    }

    let titles = select.all(&state.db).await?;
    debug!("Retrieved {} titles", titles.len());

    let mut responses = Vec::with_capacity(titles.len());
    for model in titles {
        responses.push(to_response(model, &state.db).await?);
    }
    Ok(Json(responses))
}

/// Create a title (admin only)
#[utoipa::path(
    post,
    path = "/api/v1/titles",
    tag = "titles",
    request_body = CreateTitleRequest,
    responses(
        (status = 201, description = "Title created successfully", body = TitleResponse),
        (status = 400, description = "Invalid year or unresolvable slug"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin")
    )
)]
#[instrument(skip(state, actor))]
pub async fn create_title(
    State(state): State<AppState>,
    MaybeActor(actor): MaybeActor,
    Json(request): Json<CreateTitleRequest>,
) -> Result<(StatusCode, Json<TitleResponse>)> {
    authorize(actor.as_ref(), Action::Create, Resource::Catalog)?;
    validate_year(request.year, Utc::now().date_naive())?;

    // Resolve every slug before touching the store.
    let category = match &request.category {
        Some(slug) => Some(resolve_category(&state.db, slug).await?),
        None => None,
    };
    let genres = resolve_genres(&state.db, &request.genre).await?;

    let new_title = title::ActiveModel {
        name: Set(request.name),
        year: Set(request.year),
        description: Set(request.description.unwrap_or_default()),
        category_id: Set(category.map(|c| c.id)),
        ..Default::default()
    };
    let created = new_title.insert(&state.db).await?;
    attach_genres(&state.db, created.id, &genres).await?;

    info!("Title created with ID: {}", created.id);
    let response = to_response(created, &state.db).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Get a specific title
#[utoipa::path(
    get,
    path = "/api/v1/titles/{title_id}",
    tag = "titles",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
    ),
    responses(
        (status = 200, description = "Title retrieved successfully", body = TitleResponse),
        (status = 404, description = "Title not found")
    )
)]
#[instrument(skip(state))]
pub async fn get_title(
    Path(title_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<TitleResponse>> {
    let model = title::Entity::find_by_id(title_id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("title"))?;

    Ok(Json(to_response(model, &state.db).await?))
}

/// Update a title (admin only)
#[utoipa::path(
    patch,
    path = "/api/v1/titles/{title_id}",
    tag = "titles",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
    ),
    request_body = UpdateTitleRequest,
    responses(
        (status = 200, description = "Title updated successfully", body = TitleResponse),
        (status = 400, description = "Invalid year or unresolvable slug"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Title not found")
    )
)]
#[instrument(skip(state, actor))]
pub async fn update_title(
    Path(title_id): Path<i32>,
    State(state): State<AppState>,
    MaybeActor(actor): MaybeActor,
    Json(request): Json<UpdateTitleRequest>,
) -> Result<Json<TitleResponse>> {
    authorize(actor.as_ref(), Action::Modify, Resource::Catalog)?;

    let existing = title::Entity::find_by_id(title_id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("title"))?;

    if let Some(year) = request.year {
        validate_year(year, Utc::now().date_naive())?;
    }
    let category = match &request.category {
        Some(slug) => Some(resolve_category(&state.db, slug).await?),
        None => None,
    };
    let genres = match &request.genre {
        Some(slugs) => Some(resolve_genres(&state.db, slugs).await?),
        None => None,
    };

    let mut active: title::ActiveModel = existing.into();
    if let Some(name) = request.name {
        active.name = Set(name);
    }
    if let Some(year) = request.year {
        active.year = Set(year);
    }
    if let Some(description) = request.description {
        active.description = Set(description);
    }
    if let Some(category) = category {
        active.category_id = Set(Some(category.id));
    }
    let updated = active.update(&state.db).await?;

    // A present genre list replaces the attachment set wholesale.
    if let Some(genres) = genres {
        genre_title::Entity::delete_many()
            .filter(genre_title::Column::TitleId.eq(updated.id))
            .exec(&state.db)
            .await?;
        attach_genres(&state.db, updated.id, &genres).await?;
    }

    info!("Title updated with ID: {}", updated.id);
    Ok(Json(to_response(updated, &state.db).await?))
}

/// Delete a title (admin only)
#[utoipa::path(
    delete,
    path = "/api/v1/titles/{title_id}",
    tag = "titles",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
    ),
    responses(
        (status = 204, description = "Title deleted successfully"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Title not found")
    )
)]
#[instrument(skip(state, actor))]
pub async fn delete_title(
    Path(title_id): Path<i32>,
    State(state): State<AppState>,
    MaybeActor(actor): MaybeActor,
) -> Result<StatusCode> {
    authorize(actor.as_ref(), Action::Modify, Resource::Catalog)?;

    let existing = title::Entity::find_by_id(title_id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("title"))?;

    existing.delete(&state.db).await?;
    info!("Title deleted with ID: {}", title_id);
    Ok(StatusCode::NO_CONTENT)
}
