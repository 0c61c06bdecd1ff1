use crate::handlers::{
    auth::{obtain_token, signup},
    categories::{create_category, delete_category, list_categories},
    comments::{create_comment, delete_comment, get_comment, list_comments, update_comment},
    genres::{create_genre, delete_genre, list_genres},
    health::health_check,
    reviews::{create_review, delete_review, get_review, list_reviews, update_review},
    titles::{create_title, delete_title, get_title, list_titles, update_title},
    users::{
        create_user, delete_user, get_me, get_user, list_users, update_me, update_user,
    },
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Registration and token exchange
        .route("/api/v1/auth/signup", post(signup))
        .route("/api/v1/auth/token", post(obtain_token))
        // Category routes (create-list-destroy, keyed by slug)
        .route("/api/v1/categories", get(list_categories))
        .route("/api/v1/categories", post(create_category))
        .route("/api/v1/categories/:slug", delete(delete_category))
        // Genre routes (create-list-destroy, keyed by slug)
        .route("/api/v1/genres", get(list_genres))
        .route("/api/v1/genres", post(create_genre))
        .route("/api/v1/genres/:slug", delete(delete_genre))
        // Title CRUD routes
        .route("/api/v1/titles", get(list_titles))
        .route("/api/v1/titles", post(create_title))
        .route("/api/v1/titles/:title_id", get(get_title))
        .route("/api/v1/titles/:title_id", patch(update_title))
        .route("/api/v1/titles/:title_id", delete(delete_title))
        // Review routes nested under their title
        .route("/api/v1/titles/:title_id/reviews", get(list_reviews))
        .route("/api/v1/titles/:title_id/reviews", post(create_review))
        .route(
            "/api/v1/titles/:title_id/reviews/:review_id",
            get(get_review),
        )
        .route(
            "/api/v1/titles/:title_id/reviews/:review_id",
            patch(update_review),
        )
        .route(
            "/api/v1/titles/:title_id/reviews/:review_id",
            delete(delete_review),
        )
        // Comment routes nested under their review
        .route(
            "/api/v1/titles/:title_id/reviews/:review_id/comments",
            get(list_comments),
        )
        .route(
            "/api/v1/titles/:title_id/reviews/:review_id/comments",
            post(create_comment),
        )
        .route(
            "/api/v1/titles/:title_id/reviews/:review_id/comments/:comment_id",
            get(get_comment),
        )
        .route(
            "/api/v1/titles/:title_id/reviews/:review_id/comments/:comment_id",
            patch(update_comment),
        )
        .route(
            "/api/v1/titles/:title_id/reviews/:review_id/comments/:comment_id",
            delete(delete_comment),
        )
        // User management routes; the static /me segment wins over :username
        .route("/api/v1/users", get(list_users))
        .route("/api/v1/users", post(create_user))
        .route("/api/v1/users/me", get(get_me))
        .route("/api/v1/users/me", patch(update_me))
        .route("/api/v1/users/:username", get(get_user))
        .route("/api/v1/users/:username", patch(update_user))
        .route("/api/v1/users/:username", delete(delete_user))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
