use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
};
use tracing::warn;

use crate::envelope::Envelope;
use crate::errors::{AppError, AppResult};
use crate::state::AppState;
use crate::upload::{store_image, too_large_message, validate_image, Uploaded};

/// POST /api/upload
/// Multipart form with a single `file` part.
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Envelope<Uploaded> {
    upload(&state, multipart).await.into()
}

async fn upload(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Uploaded> {
    let mut multipart = multipart.map_err(|rejection| {
        AppError::Upload(format!("Expected a multipart upload: {}", rejection.body_text()))
    })?;
    let max_bytes = state.config.upload_max_bytes;

    let mut data = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| read_error(e, max_bytes))?
    {
        if field.name() == Some("file") {
            data = Some(field.bytes().await.map_err(|e| read_error(e, max_bytes))?);
            break;
        }
    }
    let data = data.ok_or_else(|| AppError::Upload("No file uploaded".to_string()))?;
    let kind = validate_image(&data, max_bytes)?;

    let (Some(s3), Some(upload_config)) = (&state.s3, &state.config.upload) else {
        warn!("Upload received but no S3 bucket is configured");
        return Err(AppError::StoreUnavailable(
            "file storage is not configured".to_string(),
        ));
    };
    store_image(s3, upload_config, kind, data).await
}

fn read_error(err: MultipartError, max_bytes: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::Upload(too_large_message(max_bytes));
    }
    AppError::Upload(format!("Failed to read upload: {}", err.body_text()))
}
