use std::sync::Arc;

use sea_orm::DatabaseConnection;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::auth::TokenManager;
use crate::mailer::Mailer;

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Token signing and confirmation-code derivation
    pub tokens: TokenManager,
    /// Outbound mail delivery
    pub mailer: Arc<dyn Mailer>,
}

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::auth::signup,
        crate::handlers::auth::obtain_token,
        crate::handlers::categories::list_categories,
        crate::handlers::categories::create_category,
        crate::handlers::categories::delete_category,
        crate::handlers::genres::list_genres,
        crate::handlers::genres::create_genre,
        crate::handlers::genres::delete_genre,
        crate::handlers::titles::list_titles,
        crate::handlers::titles::create_title,
        crate::handlers::titles::get_title,
        crate::handlers::titles::update_title,
        crate::handlers::titles::delete_title,
        crate::handlers::reviews::list_reviews,
        crate::handlers::reviews::create_review,
        crate::handlers::reviews::get_review,
        crate::handlers::reviews::update_review,
        crate::handlers::reviews::delete_review,
        crate::handlers::comments::list_comments,
        crate::handlers::comments::create_comment,
        crate::handlers::comments::get_comment,
        crate::handlers::comments::update_comment,
        crate::handlers::comments::delete_comment,
        crate::handlers::users::list_users,
        crate::handlers::users::create_user,
        crate::handlers::users::get_user,
        crate::handlers::users::update_user,
        crate::handlers::users::delete_user,
        crate::handlers::users::get_me,
        crate::handlers::users::update_me,
    ),
    components(
        schemas(
            HealthResponse,
            crate::handlers::auth::SignupRequest,
            crate::handlers::auth::SignupResponse,
            crate::handlers::auth::TokenRequest,
            crate::handlers::auth::TokenResponse,
            crate::handlers::categories::CategoryResponse,
            crate::handlers::categories::CreateCategoryRequest,
            crate::handlers::genres::GenreResponse,
            crate::handlers::genres::CreateGenreRequest,
            crate::handlers::titles::TitleResponse,
            crate::handlers::titles::CreateTitleRequest,
            crate::handlers::titles::UpdateTitleRequest,
            crate::handlers::reviews::ReviewResponse,
            crate::handlers::reviews::CreateReviewRequest,
            crate::handlers::reviews::UpdateReviewRequest,
            crate::handlers::comments::CommentResponse,
            crate::handlers::comments::CreateCommentRequest,
            crate::handlers::comments::UpdateCommentRequest,
            crate::handlers::users::UserResponse,
            crate::handlers::users::CreateUserRequest,
            crate::handlers::users::UpdateUserRequest,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration and token endpoints"),
        (name = "categories", description = "Title category endpoints"),
        (name = "genres", description = "Title genre endpoints"),
        (name = "titles", description = "Catalog title endpoints"),
        (name = "reviews", description = "Title review endpoints"),
        (name = "comments", description = "Review comment endpoints"),
        (name = "users", description = "User management endpoints"),
    ),
    info(
        title = "Critiq API",
        description = "Content catalog review API - titles, reviews and comments with role-based access",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
