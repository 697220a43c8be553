//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

/// Development default values - NEVER use in production.
pub mod defaults {
    pub const DEV_HOST: &str = "127.0.0.1";
    pub const DEV_PORT: u16 = 8000;
    pub const DEV_API_PREFIX: &str = "/gis";
    pub const DEV_MEDIA_ROOT: &str = "./media";
    pub const DEV_MAX_UPLOAD_SIZE: usize = 52_428_800; // 50MB per archive
    pub const DEV_CORS_ALLOWED_ORIGINS: &str = "http://localhost:3000";
}

/// Runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Parse environment from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    /// Check if this is a development environment.
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    /// Check if this is a production environment.
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Runtime environment
    pub environment: Environment,
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Route prefix for the shapefile endpoints
    pub api_prefix: String,
    /// Root directory for persisted buffer outputs
    pub media_root: PathBuf,
    /// Maximum size of the uploaded archive in bytes (default: 50MB)
    pub max_upload_size: usize,
    /// Origins allowed by CORS
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In development mode (RUST_ENV=development):
    /// - All variables have sensible defaults
    /// - Only RUST_ENV is required
    ///
    /// In production mode (RUST_ENV=production):
    /// - CORS_ALLOWED_ORIGINS must be set explicitly
    ///
    /// Environment variables:
    /// - `RUST_ENV`: Environment (development/production) - REQUIRED
    /// - `GIS_HOST`: Server host (default: 127.0.0.1)
    /// - `GIS_PORT`: Server port (default: 8000)
    /// - `GIS_API_PREFIX`: Route prefix for the API (default: /gis)
    /// - `MEDIA_ROOT`: Directory for persisted outputs (default: ./media)
    /// - `GIS_MAX_UPLOAD_SIZE`: Max archive size in bytes (default: 50MB)
    /// - `CORS_ALLOWED_ORIGINS`: Comma-separated origins (default: http://localhost:3000)
    pub fn from_env() -> Result<Self, ConfigError> {
        // Parse environment - required
        let env_str = env::var("RUST_ENV").map_err(|_| ConfigError::MissingEnvVar("RUST_ENV"))?;

        let environment = Environment::parse(&env_str).ok_or(ConfigError::InvalidValue(
            "RUST_ENV must be 'development' or 'production'",
        ))?;

        let host = env::var("GIS_HOST").unwrap_or_else(|_| defaults::DEV_HOST.to_string());

        let port = env::var("GIS_PORT")
            .unwrap_or_else(|_| defaults::DEV_PORT.to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidValue("GIS_PORT must be a valid port number"))?;

        let api_prefix = normalize_prefix(
            &env::var("GIS_API_PREFIX").unwrap_or_else(|_| defaults::DEV_API_PREFIX.to_string()),
        );

        let media_root = PathBuf::from(
            env::var("MEDIA_ROOT").unwrap_or_else(|_| defaults::DEV_MEDIA_ROOT.to_string()),
        );

        let max_upload_size = env::var("GIS_MAX_UPLOAD_SIZE")
            .unwrap_or_else(|_| defaults::DEV_MAX_UPLOAD_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| ConfigError::InvalidValue("GIS_MAX_UPLOAD_SIZE must be a valid number"))?;

        let cors_allowed_origins = parse_origins(
            &env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| defaults::DEV_CORS_ALLOWED_ORIGINS.to_string()),
        );

        let config = Config {
            environment,
            host,
            port,
            api_prefix,
            media_root,
            max_upload_size,
            cors_allowed_origins,
        };

        // Validate production configuration
        if environment.is_production() {
            config.validate_production()?;
        }

        Ok(config)
    }

    /// Validate that production configuration does not use development defaults.
    fn validate_production(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.cors_allowed_origins == parse_origins(defaults::DEV_CORS_ALLOWED_ORIGINS) {
            errors.push(format!(
                "CORS_ALLOWED_ORIGINS is using development default '{}'. Set the production front end origin.",
                defaults::DEV_CORS_ALLOWED_ORIGINS
            ));
        }

        if self.cors_allowed_origins.is_empty() {
            errors.push("CORS_ALLOWED_ORIGINS must list at least one origin.".to_string());
        }

        if !errors.is_empty() {
            return Err(ConfigError::ProductionValidation(errors));
        }

        Ok(())
    }

    /// Get the server bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in development mode.
    pub fn is_development(&self) -> bool {
        self.environment.is_development()
    }
}

/// Split a comma-separated origin list, dropping blanks.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

/// Ensure a leading slash and no trailing slash; "/" becomes the empty prefix.
fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(&'static str),

    #[error("Production configuration validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    ProductionValidation(Vec<String>),
}
