use axum::extract::{Query, State};

use crate::accounts::service::{self, LoggedIn, LoginRequest, ProfileView, Registered};
use crate::envelope::{Envelope, Message};
use crate::models::profile::{NewProfile, ProfileUpdate, SaveProfileRequest};
use crate::routes::extract::{ApiJson, IdQuery};
use crate::state::AppState;

/// POST /api/register
pub async fn handle_register(
    State(state): State<AppState>,
    ApiJson(new): ApiJson<NewProfile>,
) -> Envelope<Registered> {
    service::register(state.stores.profiles.as_ref(), new).await
}

/// POST /api/login
pub async fn handle_login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Envelope<LoggedIn> {
    service::login(state.stores.profiles.as_ref(), request).await
}

/// GET /api/profile?id=
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Query(params): Query<IdQuery>,
) -> Envelope<ProfileView> {
    match params.user_id() {
        Ok(user_id) => service::get_profile(state.stores.profiles.as_ref(), user_id).await,
        Err(err) => Envelope::Failure(err),
    }
}

/// PUT /api/profile?id=
pub async fn handle_update_profile(
    State(state): State<AppState>,
    Query(params): Query<IdQuery>,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Envelope<Message> {
    match params.user_id() {
        Ok(user_id) => {
            service::update_profile(state.stores.profiles.as_ref(), user_id, update).await
        }
        Err(err) => Envelope::Failure(err),
    }
}

/// DELETE /api/profile?id=
pub async fn handle_delete_profile(
    State(state): State<AppState>,
    Query(params): Query<IdQuery>,
) -> Envelope<Message> {
    match params.user_id() {
        Ok(user_id) => service::delete_profile(state.stores.profiles.as_ref(), user_id).await,
        Err(err) => Envelope::Failure(err),
    }
}

/// POST /api/save-profile
pub async fn handle_save_profile(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SaveProfileRequest>,
) -> Envelope<Message> {
    service::save_complete_profile(state.stores.profiles.as_ref(), request).await
}
