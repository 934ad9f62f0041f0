use anyhow::{bail, Context, Result};

pub const DEFAULT_UPLOAD_MAX_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    /// Process-local store; data is lost on restart.
    Memory,
}

/// S3 / MinIO settings for profile and project images.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub bucket: String,
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Base of the URLs handed back to clients. Defaults to `<endpoint>/<bucket>`.
    pub public_url: Option<String>,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub upload: Option<UploadConfig>,
    pub upload_max_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests need not touch the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let store_backend = match var("STORE_BACKEND").as_deref().map(str::trim) {
            None | Some("postgres") => StoreBackend::Postgres,
            Some("memory") => StoreBackend::Memory,
            Some(other) => bail!("STORE_BACKEND must be 'postgres' or 'memory', got '{other}'"),
        };

        let database_url = var("DATABASE_URL");
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            bail!("Required environment variable 'DATABASE_URL' is not set");
        }

        let upload = var("S3_BUCKET").map(|bucket| UploadConfig {
            bucket,
            endpoint: var("S3_ENDPOINT"),
            access_key_id: var("AWS_ACCESS_KEY_ID"),
            secret_access_key: var("AWS_SECRET_ACCESS_KEY"),
            public_url: var("S3_PUBLIC_URL"),
        });

        Ok(Config {
            store_backend,
            database_url,
            upload,
            upload_max_bytes: match var("UPLOAD_MAX_BYTES") {
                Some(v) => v
                    .parse::<usize>()
                    .context("UPLOAD_MAX_BYTES must be a byte count")?,
                None => DEFAULT_UPLOAD_MAX_BYTES,
            },
            port: var("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/portfolio")]).unwrap();
        assert_eq!(config.store_backend, StoreBackend::Postgres);
        assert_eq!(config.port, 8080);
        assert_eq!(config.rust_log, "info");
        assert_eq!(config.upload_max_bytes, DEFAULT_UPLOAD_MAX_BYTES);
        assert!(config.upload.is_none());
    }

    #[test]
    fn test_postgres_requires_database_url() {
        assert!(load(&[]).is_err());
        assert!(load(&[("STORE_BACKEND", "postgres"), ("DATABASE_URL", " ")]).is_err());
    }

    #[test]
    fn test_memory_backend_needs_no_database() {
        let config = load(&[("STORE_BACKEND", "memory")]).unwrap();
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        assert!(load(&[("STORE_BACKEND", "mongo")]).is_err());
    }

    #[test]
    fn test_upload_settings() {
        let config = load(&[
            ("STORE_BACKEND", "memory"),
            ("S3_BUCKET", "portfolio-uploads"),
            ("S3_ENDPOINT", "http://localhost:9000"),
            ("UPLOAD_MAX_BYTES", "2048"),
        ])
        .unwrap();
        let upload = config.upload.unwrap();
        assert_eq!(upload.bucket, "portfolio-uploads");
        assert_eq!(upload.endpoint.as_deref(), Some("http://localhost:9000"));
        assert!(upload.public_url.is_none());
        assert_eq!(config.upload_max_bytes, 2048);
    }

    #[test]
    fn test_invalid_port() {
        assert!(load(&[("STORE_BACKEND", "memory"), ("PORT", "eighty")]).is_err());
    }
}
