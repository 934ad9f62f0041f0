use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::envelope::{Envelope, Message};
use crate::errors::{AppError, AppResult};
use crate::models::profile::{
    CompleteProfile, NewProfile, Profile, ProfileUpdate, SaveProfileRequest,
};
use crate::store::password::verify_password_blocking;
use crate::store::ProfileStore;

#[derive(Debug, Serialize)]
pub struct Registered {
    pub user_id: i64,
    pub message: String,
}

#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoggedIn {
    pub user: Profile,
}

#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub profile: CompleteProfile,
}

pub async fn register(store: &dyn ProfileStore, new: NewProfile) -> Envelope<Registered> {
    let email = new.email.clone();
    store
        .create_profile(new)
        .await
        .map(|user_id| {
            info!(user_id, "Registered new profile");
            Registered {
                user_id,
                message: "User registered successfully".to_string(),
            }
        })
        .map_err(|err| {
            warn!(email = %email, code = err.code(), "Registration rejected: {err}");
            err
        })
        .into()
}

/// Unknown email and wrong password produce the same failure.
pub async fn login(store: &dyn ProfileStore, request: LoginRequest) -> Envelope<LoggedIn> {
    authenticate(store, request).await.into()
}

async fn authenticate(store: &dyn ProfileStore, request: LoginRequest) -> AppResult<LoggedIn> {
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(AppError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    let user = match store.get_profile_by_email(&request.email).await {
        Ok(user) => user,
        Err(AppError::NotFound(_)) => {
            warn!("Login attempt for unknown email");
            return Err(AppError::InvalidCredentials);
        }
        Err(err) => return Err(err),
    };

    // The profile can be deleted between the two reads.
    let hash = match store.password_hash(user.id).await {
        Ok(hash) => hash,
        Err(AppError::NotFound(_)) => {
            warn!(user_id = user.id, "Profile removed during login");
            return Err(AppError::InvalidCredentials);
        }
        Err(err) => return Err(err),
    };
    if !verify_password_blocking(hash, request.password).await? {
        warn!(user_id = user.id, "Login attempt with wrong password");
        return Err(AppError::InvalidCredentials);
    }

    info!(user_id = user.id, "User logged in");
    Ok(LoggedIn { user })
}

pub async fn get_profile(store: &dyn ProfileStore, user_id: i64) -> Envelope<ProfileView> {
    store
        .get_complete_profile(user_id)
        .await
        .map(|profile| ProfileView { profile })
        .into()
}

pub async fn update_profile(
    store: &dyn ProfileStore,
    user_id: i64,
    update: ProfileUpdate,
) -> Envelope<Message> {
    store
        .update_profile(user_id, update.normalized())
        .await
        .map(|()| Message::new("Profile updated successfully"))
        .into()
}

/// Merges the basic fields and replaces every collection present in the
/// request, as one atomic write.
pub async fn save_complete_profile(
    store: &dyn ProfileStore,
    request: SaveProfileRequest,
) -> Envelope<Message> {
    save(store, request).await.into()
}

async fn save(store: &dyn ProfileStore, request: SaveProfileRequest) -> AppResult<Message> {
    let user_id = request
        .user_id
        .ok_or_else(|| AppError::Validation("User ID required".to_string()))?;
    let (patch, collections) = request.into_collections()?;
    let kinds: Vec<&'static str> = collections.iter().map(|c| c.kind()).collect();

    store
        .save_complete_profile(user_id, patch, collections)
        .await?;
    info!(user_id, collections = ?kinds, "Profile saved");
    Ok(Message::new("Profile saved successfully"))
}

pub async fn delete_profile(store: &dyn ProfileStore, user_id: i64) -> Envelope<Message> {
    store
        .delete_profile(user_id)
        .await
        .map(|()| Message::new("Profile deleted successfully"))
        .into()
}
