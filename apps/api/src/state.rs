use aws_sdk_s3::Client as S3Client;

use crate::config::Config;
use crate::store::Stores;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub stores: Stores,
    /// Present only when an upload bucket is configured.
    pub s3: Option<S3Client>,
    pub config: Config,
}
