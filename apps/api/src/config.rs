use std::path::PathBuf;

use anyhow::{bail, Context, Result};

/// Where attachment binaries are written.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageBackend {
    Local,
    S3(S3Config),
}

#[derive(Debug, Clone, PartialEq)]
pub struct S3Config {
    pub bucket: String,
    pub endpoint: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    pub storage: StorageBackend,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub max_files_per_request: usize,
    pub run_migrations: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let storage = match optional_env("STORAGE_BACKEND", "local").as_str() {
            "local" => StorageBackend::Local,
            "s3" => StorageBackend::S3(S3Config {
                bucket: require_env("S3_BUCKET")?,
                endpoint: require_env("S3_ENDPOINT")?,
                region: optional_env("S3_REGION", "us-east-1"),
                access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
                secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            }),
            other => bail!("STORAGE_BACKEND must be 'local' or 's3', got '{other}'"),
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            port: optional_env("PORT", "5000")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG", "info"),
            storage,
            upload_dir: PathBuf::from(optional_env("UPLOAD_DIR", "uploads")),
            max_upload_bytes: optional_env("MAX_UPLOAD_BYTES", "10485760")
                .parse()
                .context("MAX_UPLOAD_BYTES must be a positive integer")?,
            max_files_per_request: optional_env("MAX_FILES_PER_REQUEST", "12")
                .parse()
                .context("MAX_FILES_PER_REQUEST must be a positive integer")?,
            run_migrations: parse_bool(&optional_env("RUN_MIGRATIONS", "true"))
                .context("RUN_MIGRATIONS must be true or false")?,
        })
    }

    /// Upper bound for a whole multipart request body.
    pub fn body_limit(&self) -> usize {
        // every file at the limit plus room for the text fields
        self.max_upload_bytes
            .saturating_mul(self.max_files_per_request + 1)
            .saturating_add(1024 * 1024)
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => bail!("not a boolean: '{other}'"),
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests(upload_dir: PathBuf) -> Self {
        Config {
            database_url: "postgres://localhost/jobboard_test".to_string(),
            port: 0,
            rust_log: "debug".to_string(),
            storage: StorageBackend::Local,
            upload_dir,
            max_upload_bytes: 1024,
            max_files_per_request: 3,
            run_migrations: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("TRUE").unwrap());
        assert!(parse_bool(" yes ").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn test_body_limit_covers_all_files() {
        let config = Config::for_tests(PathBuf::from("uploads"));
        assert!(config.body_limit() >= config.max_upload_bytes * config.max_files_per_request);
    }
}
