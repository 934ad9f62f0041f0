use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

use crate::envelope::Envelope;
use crate::errors::AppError;
use crate::portfolio::service::{self, GeneratedPortfolio, PortfolioView, TemplateList};
use crate::routes::extract::{parse_user_id, ApiJson, IdQuery};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub user_id: Option<i64>,
    /// Accepted for compatibility; the profile's profession picks the template.
    #[serde(default)]
    pub template: Option<String>,
}

/// POST /api/generate-portfolio
pub async fn handle_generate_portfolio(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<GenerateRequest>,
) -> Envelope<GeneratedPortfolio> {
    let Some(user_id) = req.user_id else {
        return Envelope::Failure(AppError::Validation("User ID required".to_string()));
    };
    service::generate_portfolio(
        state.stores.profiles.as_ref(),
        state.stores.templates.as_ref(),
        user_id,
        req.template.as_deref(),
    )
    .await
}

/// GET /api/get-portfolio?id=
pub async fn handle_get_portfolio(
    State(state): State<AppState>,
    Query(params): Query<IdQuery>,
) -> Envelope<PortfolioView> {
    match params.user_id() {
        Ok(user_id) => {
            service::get_portfolio(
                state.stores.profiles.as_ref(),
                state.stores.templates.as_ref(),
                user_id,
            )
            .await
        }
        Err(err) => Envelope::Failure(err),
    }
}

/// GET /api/portfolio/:id/html
/// Serves the rendered page itself instead of wrapping it in JSON.
pub async fn handle_portfolio_html(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Response {
    let user_id = match parse_user_id(Some(&raw_id)) {
        Ok(user_id) => user_id,
        Err(err) => return err.into_response(),
    };
    let envelope = service::generate_portfolio(
        state.stores.profiles.as_ref(),
        state.stores.templates.as_ref(),
        user_id,
        None,
    )
    .await;
    match envelope.into_result() {
        Ok(generated) => Html(generated.html).into_response(),
        Err(err) => err.into_response(),
    }
}

/// GET /api/templates
pub async fn handle_list_templates(State(state): State<AppState>) -> Envelope<TemplateList> {
    service::list_templates(state.stores.templates.as_ref()).await
}
