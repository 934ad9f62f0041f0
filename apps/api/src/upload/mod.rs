//! Image uploads for profile photos and project images.
//!
//! The file type is decided from the leading bytes, never from the client's
//! filename or declared content type.

pub mod handlers;

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::config::UploadConfig;
use crate::errors::{AppError, AppResult};

pub const INVALID_TYPE_MESSAGE: &str =
    "Invalid file type. Only JPG, PNG, GIF, and WebP images are allowed.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    Webp,
}

impl ImageKind {
    pub fn sniff(data: &[u8]) -> Option<ImageKind> {
        match data {
            [0xFF, 0xD8, 0xFF, ..] => Some(ImageKind::Jpeg),
            [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some(ImageKind::Png),
            [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => Some(ImageKind::Gif),
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => {
                Some(ImageKind::Webp)
            }
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
            ImageKind::Gif => "gif",
            ImageKind::Webp => "webp",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
            ImageKind::Gif => "image/gif",
            ImageKind::Webp => "image/webp",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Uploaded {
    pub message: String,
    pub file_url: String,
    pub file_name: String,
}

pub fn too_large_message(max_bytes: usize) -> String {
    format!(
        "File too large. Maximum size is {}MB.",
        max_bytes.div_ceil(1024 * 1024)
    )
}

/// Type first, then size.
pub fn validate_image(data: &[u8], max_bytes: usize) -> AppResult<ImageKind> {
    let kind =
        ImageKind::sniff(data).ok_or_else(|| AppError::Upload(INVALID_TYPE_MESSAGE.to_string()))?;
    if data.len() > max_bytes {
        return Err(AppError::Upload(too_large_message(max_bytes)));
    }
    Ok(kind)
}

/// Public URL for an object key. Falls back to `<endpoint>/<bucket>` and
/// then to the AWS virtual-hosted form.
pub fn public_url(config: &UploadConfig, key: &str) -> String {
    let base = match (&config.public_url, &config.endpoint) {
        (Some(public), _) => public.trim_end_matches('/').to_string(),
        (None, Some(endpoint)) => {
            format!("{}/{}", endpoint.trim_end_matches('/'), config.bucket)
        }
        (None, None) => format!("https://{}.s3.amazonaws.com", config.bucket),
    };
    format!("{base}/{key}")
}

/// Writes the image under `uploads/<uuid>.<ext>` and returns where it lives.
pub async fn store_image(
    s3: &S3Client,
    config: &UploadConfig,
    kind: ImageKind,
    data: Bytes,
) -> AppResult<Uploaded> {
    let file_name = format!("{}.{}", Uuid::new_v4(), kind.extension());
    let key = format!("uploads/{file_name}");
    let size = data.len();

    s3.put_object()
        .bucket(&config.bucket)
        .key(&key)
        .body(ByteStream::from(data))
        .content_type(kind.content_type())
        .send()
        .await
        .map_err(|e| AppError::StoreUnavailable(format!("S3 upload failed: {e}")))?;

    info!("Uploaded image to s3://{}/{} ({size} bytes)", config.bucket, key);

    Ok(Uploaded {
        message: "File uploaded successfully".to_string(),
        file_url: public_url(config, &key),
        file_name,
    })
}
