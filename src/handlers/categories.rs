use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use model::entities::category;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::{IntoParams, ToSchema};

use crate::auth::MaybeActor;
use crate::errors::{AppError, Result};
use crate::permissions::{authorize, Action, Resource};
use crate::schemas::AppState;
use crate::validators::validate_slug;

/// Category response model
#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryResponse {
    pub name: String,
    pub slug: String,
}

impl From<category::Model> for CategoryResponse {
    fn from(model: category::Model) -> Self {
        Self {
            name: model.name,
            slug: model.slug,
        }
    }
}

/// Request body for creating a category
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub slug: String,
}

/// Query parameters for the category list
#[derive(Debug, Deserialize, IntoParams)]
pub struct CategoryQuery {
    /// Substring of the category name
    pub search: Option<String>,
}

/// List categories, optionally searched by name
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    tag = "categories",
    params(CategoryQuery),
    responses(
        (status = 200, description = "Categories retrieved successfully", body = Vec<CategoryResponse>)
    )
)]
#[instrument(skip(state))]
pub async fn list_categories(
    Query(query): Query<CategoryQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryResponse>>> {
    let mut select = category::Entity::find().order_by_asc(category::Column::Slug);
    if let Some(term) = &query.search {
        select = select.filter(category::Column::Name.contains(term));
    }

    let categories = select.all(&state.db).await?;
    debug!("Retrieved {} categories", categories.len());

    Ok(Json(
        categories.into_iter().map(CategoryResponse::from).collect(),
    ))
}

/// Create a category (admin only)
#[utoipa::path(
    post,
    path = "/api/v1/categories",
    tag = "categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created successfully", body = CategoryResponse),
        (status = 400, description = "Invalid or duplicate slug"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin")
    )
)]
#[instrument(skip(state, actor))]
pub async fn create_category(
    State(state): State<AppState>,
    MaybeActor(actor): MaybeActor,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>)> {
    authorize(actor.as_ref(), Action::Create, Resource::Catalog)?;
    validate_slug(&request.slug)?;

    let new_category = category::ActiveModel {
        name: Set(request.name),
        slug: Set(request.slug.clone()),
        ..Default::default()
    };
    let created = new_category.insert(&state.db).await.map_err(|e| {
        AppError::on_conflict(
            e,
            AppError::validation("slug", format!("slug '{}' already exists", request.slug)),
        )
    })?;

    info!("Category created: {}", created.slug);
    Ok((StatusCode::CREATED, Json(CategoryResponse::from(created))))
}

/// Delete a category by slug (admin only)
///
/// Titles filed under it keep existing with no category.
#[utoipa::path(
    delete,
    path = "/api/v1/categories/{slug}",
    tag = "categories",
    params(
        ("slug" = String, Path, description = "Category slug"),
    ),
    responses(
        (status = 204, description = "Category deleted successfully"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Category not found")
    )
)]
#[instrument(skip(state, actor))]
pub async fn delete_category(
    Path(slug): Path<String>,
    State(state): State<AppState>,
    MaybeActor(actor): MaybeActor,
) -> Result<StatusCode> {
    authorize(actor.as_ref(), Action::Modify, Resource::Catalog)?;

    let existing = category::Entity::find_by_slug(&slug)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("category"))?;

    existing.delete(&state.db).await?;
    info!("Category deleted: {}", slug);
    Ok(StatusCode::NO_CONTENT)
}
