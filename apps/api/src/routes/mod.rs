pub mod extract;
pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::accounts::handlers as accounts;
use crate::errors::AppError;
use crate::portfolio::handlers as portfolio;
use crate::state::AppState;
use crate::upload::handlers as upload;

/// Room for multipart framing on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

async fn endpoint_not_found() -> AppError {
    AppError::NotFound("Endpoint not found".to_string())
}

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.upload_max_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health::health_handler))
        // Accounts
        .route("/api/register", post(accounts::handle_register))
        .route("/api/login", post(accounts::handle_login))
        .route(
            "/api/profile",
            get(accounts::handle_get_profile)
                .put(accounts::handle_update_profile)
                .delete(accounts::handle_delete_profile),
        )
        .route("/api/save-profile", post(accounts::handle_save_profile))
        // Portfolio
        .route(
            "/api/generate-portfolio",
            post(portfolio::handle_generate_portfolio),
        )
        .route("/api/get-portfolio", get(portfolio::handle_get_portfolio))
        .route(
            "/api/portfolio/:id/html",
            get(portfolio::handle_portfolio_html),
        )
        .route("/api/templates", get(portfolio::handle_list_templates))
        // Uploads
        .route(
            "/api/upload",
            post(upload::handle_upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .fallback(endpoint_not_found)
        .with_state(state)
}
