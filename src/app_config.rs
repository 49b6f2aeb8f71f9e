//! Application configuration from file and environment variables
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Environment variables (prefixed with CAIRN_, sections split by `__`)
//! 2. Config file (cairn.toml)
//! 3. Default values
//!
//! Secrets like the JWT signing secret and the initial admin password should
//! be kept in environment variables, not in the config file.

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

/// Placeholder secret shipped in the defaults. Never valid in production.
pub const PLACEHOLDER_JWT_SECRET: &str = "change-this-secret-in-production";

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind: String,
    /// "production" enables secure cookies, HSTS and strict secret checks
    pub environment: String,
    /// Take the client address from `X-Forwarded-For`/`X-Real-IP`. Only
    /// enable behind a reverse proxy that sets those headers.
    pub trust_proxy: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            environment: "development".to_string(),
            trust_proxy: false,
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Driver: "sqlite" or "postgres"
    pub driver: String,
    /// Connection URL (required for postgres)
    pub url: String,
    /// Database file (sqlite)
    pub filename: String,
    /// Pool size
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            driver: "sqlite".to_string(),
            url: String::new(),
            filename: ".cms/data.db".to_string(),
            max_connections: 10,
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// HS256 signing secret (should be in env var CAIRN_AUTH__JWT_SECRET)
    pub jwt_secret: String,
    /// Session lifetime in days
    pub session_days: i64,
    /// Initial administrator, created on first start when both are set
    pub admin_username: String,
    /// Should be in env var CAIRN_AUTH__ADMIN_PASSWORD
    pub admin_password: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: PLACEHOLDER_JWT_SECRET.to_string(),
            session_days: 7,
            admin_username: String::new(),
            admin_password: String::new(),
        }
    }
}

/// Media upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    /// Directory files are written to
    pub path: String,
    /// Maximum upload size in bytes
    pub max_size: u64,
    /// Allowed MIME types; `image/*` style wildcards match a whole family
    pub allowed_types: Vec<String>,
    /// Public URL prefix files are served under
    pub url_prefix: String,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            path: ".cms/uploads".to_string(),
            max_size: 10 * 1024 * 1024,
            allowed_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/gif".to_string(),
                "image/webp".to_string(),
                "image/svg+xml".to_string(),
                "application/pdf".to_string(),
                "video/mp4".to_string(),
                "video/webm".to_string(),
            ],
            url_prefix: "/api/cms/media/file".to_string(),
        }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub login_max: usize,
    pub login_window_seconds: u64,
    pub api_max: usize,
    pub api_window_seconds: u64,
    pub upload_max: usize,
    pub upload_window_seconds: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            login_max: 5,
            login_window_seconds: 900,
            api_max: 100,
            api_window_seconds: 60,
            upload_max: 20,
            upload_window_seconds: 3600,
        }
    }
}

/// Content model location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentSettings {
    /// JSON file describing locales, collections and singletons
    pub model_path: String,
}

impl Default for ContentSettings {
    fn default() -> Self {
        Self {
            model_path: "cms.json".to_string(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub uploads: UploadSettings,
    pub rate_limit: RateLimitSettings,
    pub content: ContentSettings,
}

impl AppConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("cairn.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&AppConfig::default())?)
            // Add config file (optional)
            .add_source(File::new(path, FileFormat::Toml).required(false))
            // Override with environment variables
            // e.g., CAIRN_DATABASE__DRIVER, CAIRN_AUTH__JWT_SECRET
            .add_source(
                Environment::with_prefix("CAIRN")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("uploads.allowed_types")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn is_production(&self) -> bool {
        self.server.environment.eq_ignore_ascii_case("production")
    }
}
