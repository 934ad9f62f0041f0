mod accounts;
mod config;
mod db;
mod envelope;
mod errors;
mod models;
mod portfolio;
mod routes;
mod state;
mod store;
mod upload;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, StoreBackend, UploadConfig};
use crate::db::create_pool;
use crate::portfolio::selector::ensure_default_template;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{memory::MemoryStore, postgres::PgStore, Stores};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Portfolio API v{}", env!("CARGO_PKG_VERSION"));

    let stores = match config.store_backend {
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required for the postgres store"))?;
            Stores::from_backend(PgStore::new(create_pool(url).await?))
        }
        StoreBackend::Memory => {
            warn!("Using the in-memory store; data will not survive a restart");
            Stores::from_backend(MemoryStore::new())
        }
    };

    // Refuse to serve without a usable fallback template.
    ensure_default_template(stores.templates.as_ref()).await?;

    let s3 = match &config.upload {
        Some(upload) => {
            let client = build_s3_client(upload).await;
            info!("S3 client initialized (bucket: {})", upload.bucket);
            Some(client)
        }
        None => {
            warn!("S3_BUCKET not set; uploads are disabled");
            None
        }
    };

    let state = AppState {
        stores,
        s3,
        config: config.clone(),
    };

    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client for MinIO (explicit endpoint and keys) or AWS
/// (default credential chain).
async fn build_s3_client(upload: &UploadConfig) -> aws_sdk_s3::Client {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"));

    if let (Some(key_id), Some(secret)) = (&upload.access_key_id, &upload.secret_access_key) {
        loader = loader.credentials_provider(Credentials::new(
            key_id,
            secret,
            None,
            None,
            "portfolio-static",
        ));
    }
    if let Some(endpoint) = &upload.endpoint {
        loader = loader.endpoint_url(endpoint);
    }

    let sdk_config = loader.load().await;
    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .force_path_style(upload.endpoint.is_some())
        .build();
    aws_sdk_s3::Client::from_conf(s3_config)
}
