use std::sync::Arc;

use anyhow::Result;
use sea_orm::Database;
use tracing::warn;

use crate::auth::TokenManager;
use crate::mailer::LogMailer;
use crate::schemas::AppState;

/// Initialize application state against an explicit database URL
pub async fn initialize_app_state_with_url(database_url: &str) -> Result<AppState> {
    tracing::info!("Connecting to database: {}", database_url);
    let db = Database::connect(database_url).await?;

    let tokens = TokenManager::new(&jwt_secret());
    let mailer = Arc::new(LogMailer);

    Ok(AppState { db, tokens, mailer })
}

/// The secret signing tokens and confirmation codes. Falls back to a fixed
/// development value so the server still boots without configuration.
pub fn jwt_secret() -> String {
    std::env::var("JWT_SECRET").unwrap_or_else(|_| {
        warn!("JWT_SECRET not set, using development secret");
        "critiq-development-secret".to_string()
    })
}
