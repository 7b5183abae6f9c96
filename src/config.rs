/*
 * Responsibility
 * - 環境変数や設定の読み込み (DATABASE_URL, SYMMETRIC_KEY, token 有効期間, CORS 許可, storage など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::Duration;

use crate::services::token::jwe::KEY_SIZE;

const DEFAULT_STORAGE_DIR: &str = "./data/objects";
const DEFAULT_STORAGE_BUCKET: &str = "dropbyte";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()))
    }

    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    // Shared key for access-token encryption (exactly KEY_SIZE bytes)
    pub symmetric_key: String,
    pub access_token_duration: Duration,
    // Parsed for completeness; no refresh tokens are issued.
    pub refresh_token_duration: Duration,

    // Object store root and bucket; uploads larger than max_upload_bytes get 413
    pub storage_dir: PathBuf,
    pub storage_bucket: String,
    pub max_upload_bytes: usize,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print secrets (key, database credentials)
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("access_token_duration", &self.access_token_duration)
            .field("refresh_token_duration", &self.refresh_token_duration)
            .field("storage_dir", &self.storage_dir)
            .field("storage_bucket", &self.storage_bucket)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8080);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let app_env = AppEnv::from_env();

        let cors_allowed_origins =
            parse_origins(&std::env::var("CORS_ALLOWED_ORIGINS").unwrap_or_default());

        let symmetric_key =
            std::env::var("SYMMETRIC_KEY").map_err(|_| ConfigError::Missing("SYMMETRIC_KEY"))?;
        if symmetric_key.len() != KEY_SIZE {
            return Err(ConfigError::Invalid("SYMMETRIC_KEY"));
        }

        let access_token_duration = duration_from_env("ACCESS_TOKEN_DURATION_SECONDS", 900)?;
        let refresh_token_duration = duration_from_env("REFRESH_TOKEN_DURATION_SECONDS", 86_400)?;

        let storage_dir = PathBuf::from(
            std::env::var("STORAGE_DIR").unwrap_or_else(|_| DEFAULT_STORAGE_DIR.to_string()),
        );
        let storage_bucket = parse_bucket(
            &std::env::var("STORAGE_BUCKET").unwrap_or_else(|_| DEFAULT_STORAGE_BUCKET.to_string()),
        )?;
        let max_upload_bytes = match std::env::var("MAX_UPLOAD_BYTES") {
            Ok(raw) => parse_upload_limit(&raw)?,
            Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            addr,
            database_url,
            app_env,
            cors_allowed_origins,
            symmetric_key,
            access_token_duration,
            refresh_token_duration,
            storage_dir,
            storage_bucket,
            max_upload_bytes,
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn duration_from_env(key: &'static str, default_seconds: i64) -> Result<Duration, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => parse_duration_seconds(key, &raw),
        Err(_) => parse_duration_seconds(key, &default_seconds.to_string()),
    }
}

// Positive whole seconds, bounded by what chrono can represent.
fn parse_duration_seconds(key: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let seconds: i64 = raw.trim().parse().map_err(|_| ConfigError::Invalid(key))?;
    if seconds <= 0 {
        return Err(ConfigError::Invalid(key));
    }
    Duration::try_seconds(seconds).ok_or(ConfigError::Invalid(key))
}

// Bucket ids become a directory name: [A-Za-z0-9_-]+ only.
fn parse_bucket(raw: &str) -> Result<String, ConfigError> {
    let bucket = raw.trim();
    let valid = !bucket.is_empty()
        && bucket
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(ConfigError::Invalid("STORAGE_BUCKET"));
    }
    Ok(bucket.to_string())
}

fn parse_upload_limit(raw: &str) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::Invalid("MAX_UPLOAD_BYTES")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_env_parsing() {
        assert_eq!(AppEnv::parse("production"), AppEnv::Production);
        assert_eq!(AppEnv::parse("PROD"), AppEnv::Production);
        assert_eq!(AppEnv::parse("staging"), AppEnv::Development);
        assert!(!AppEnv::parse("").is_production());
    }

    #[test]
    fn origins_are_trimmed_and_blank_entries_dropped() {
        assert_eq!(
            parse_origins(" https://a.example , ,https://b.example,"),
            vec!["https://a.example", "https://b.example"]
        );
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn durations_must_be_positive_seconds() {
        assert_eq!(
            parse_duration_seconds("X", "900").unwrap(),
            Duration::minutes(15)
        );
        assert_eq!(
            parse_duration_seconds("X", " 60 ").unwrap(),
            Duration::seconds(60)
        );

        for bad in ["0", "-5", "15m", "", "1.5"] {
            assert!(matches!(
                parse_duration_seconds("X", bad),
                Err(ConfigError::Invalid("X"))
            ));
        }
    }

    #[test]
    fn config_error_messages_name_the_key() {
        assert_eq!(
            ConfigError::Missing("SYMMETRIC_KEY").to_string(),
            "missing configuration: SYMMETRIC_KEY"
        );
        assert_eq!(
            ConfigError::Invalid("PORT").to_string(),
            "invalid configuration: PORT"
        );
    }

    #[test]
    fn bucket_names_stay_inside_the_storage_dir() {
        assert_eq!(parse_bucket(" files-01 ").unwrap(), "files-01");

        for bad in ["", "..", "a/b", "a\\b", "b ucket"] {
            assert!(parse_bucket(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn upload_limit_must_be_positive() {
        assert_eq!(parse_upload_limit("1048576").unwrap(), 1_048_576);
        assert!(parse_upload_limit("0").is_err());
        assert!(parse_upload_limit("-1").is_err());
        assert!(parse_upload_limit("10MB").is_err());
    }
}
