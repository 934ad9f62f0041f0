use axum::extract::FromRequest;
use serde::Deserialize;

use crate::errors::{AppError, AppResult};

/// `axum::Json` whose rejection is answered with the failure envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `?id=` on the profile and portfolio routes. Kept as a string so a missing
/// or malformed id still reaches the handler and gets a readable message.
#[derive(Debug, Default, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

impl IdQuery {
    pub fn user_id(&self) -> AppResult<i64> {
        parse_user_id(self.id.as_deref())
    }
}

/// Shared by query and path ids so both answer with the failure envelope.
pub fn parse_user_id(raw: Option<&str>) -> AppResult<i64> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("User ID required".to_string()))?;
    raw.parse::<i64>()
        .map_err(|_| AppError::Validation(format!("Invalid user ID '{raw}'")))
}
