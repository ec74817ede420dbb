//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use secrecy::SecretString;

use crate::services::gateway::Provider;

/// HTTP header carrying a caller-supplied model credential.
pub const MODEL_API_KEY_HEADER: &str = "X-Model-Api-Key";

/// HTTP header selecting the model provider for a request.
pub const MODEL_PROVIDER_HEADER: &str = "X-Model-Provider";

/// Development default values - NEVER use in production.
pub mod defaults {
    pub const DEV_DATABASE_URL: &str = "sqlite://data/akuit.db?mode=rwc";
    pub const DEV_HOST: &str = "127.0.0.1";
    pub const DEV_PORT: u16 = 8080;
    pub const DEV_UPLOAD_DIR: &str = "uploads";
    pub const DEV_MAX_UPLOAD_SIZE: usize = 26_214_400; // 25MB per intake request
    pub const DEV_MAX_FILES_PER_REQUEST: usize = 10;
    pub const DEV_ENCRYPTION_KEY: &str = "dev-encryption-key-do-not-use-in-production";

    pub const MODEL_TIMEOUT_SECS: u64 = 120;
    pub const MODEL_MAX_RETRIES: u32 = 3;
    pub const MODEL_BACKOFF_MS: u64 = 2_000;

    pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
    pub const GEMINI_MODEL: &str = "gemini-2.0-flash";
    pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
    pub const OPENAI_MODEL: &str = "gpt-4o-mini";
    pub const ZAI_BASE_URL: &str = "https://api.z.ai/api/paas/v4";
    pub const ZAI_MODEL: &str = "glm-4.5v";
}

/// Environment variable names checked for each provider credential, in order.
pub const PROVIDER_KEY_VARS: &[(Provider, &[&str])] = &[
    (Provider::Gemini, &["GEMINI_API_KEY", "GOOGLE_API_KEY"]),
    (Provider::OpenAi, &["OPENAI_API_KEY"]),
    (Provider::Zai, &["ZAI_API_KEY"]),
];

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

/// Endpoint and model name for one provider.
#[derive(Debug, Clone)]
pub struct ProviderEndpoint {
    pub base_url: String,
    pub model: String,
}

/// External model gateway settings.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    /// Provider used when a request does not name one
    pub default_provider: Provider,
    /// Per-request timeout enforced by the HTTP client
    pub timeout_secs: u64,
    /// Retries after a rate-limit response before giving up
    pub max_retries: u32,
    /// First backoff delay; doubles on every retry
    pub initial_backoff_ms: u64,
    pub gemini: ProviderEndpoint,
    pub openai: ProviderEndpoint,
    pub zai: ProviderEndpoint,
}

impl ModelSettings {
    /// Endpoint configuration for a provider.
    pub fn endpoint(&self, provider: Provider) -> &ProviderEndpoint {
        match provider {
            Provider::Gemini => &self.gemini,
            Provider::OpenAi => &self.openai,
            Provider::Zai => &self.zai,
        }
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            default_provider: Provider::Gemini,
            timeout_secs: defaults::MODEL_TIMEOUT_SECS,
            max_retries: defaults::MODEL_MAX_RETRIES,
            initial_backoff_ms: defaults::MODEL_BACKOFF_MS,
            gemini: ProviderEndpoint {
                base_url: defaults::GEMINI_BASE_URL.to_string(),
                model: defaults::GEMINI_MODEL.to_string(),
            },
            openai: ProviderEndpoint {
                base_url: defaults::OPENAI_BASE_URL.to_string(),
                model: defaults::OPENAI_MODEL.to_string(),
            },
            zai: ProviderEndpoint {
                base_url: defaults::ZAI_BASE_URL.to_string(),
                model: defaults::ZAI_MODEL.to_string(),
            },
        }
    }
}

/// Provider credentials read from the process environment at startup.
///
/// These take priority over stored credentials during key resolution.
#[derive(Default)]
pub struct EnvKeys {
    keys: Vec<(Provider, SecretString)>,
}

impl EnvKeys {
    /// Read every registered provider variable from the environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup (used by tests).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut keys = Vec::new();
        for (provider, names) in PROVIDER_KEY_VARS {
            let found = names
                .iter()
                .filter_map(|name| lookup(name))
                .find(|value| !value.trim().is_empty());
            if let Some(value) = found {
                keys.push((*provider, SecretString::from(value.trim().to_string())));
            }
        }
        Self { keys }
    }

    /// Credential configured for a provider, if any.
    pub fn get(&self, provider: Provider) -> Option<&SecretString> {
        self.keys
            .iter()
            .find(|(p, _)| *p == provider)
            .map(|(_, key)| key)
    }

    /// Providers that have an environment credential.
    pub fn providers(&self) -> Vec<Provider> {
        self.keys.iter().map(|(p, _)| *p).collect()
    }
}

impl std::fmt::Debug for EnvKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvKeys")
            .field("providers", &self.providers())
            .finish()
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
    /// Database URL (SQLite or PostgreSQL connection string)
    pub database_url: String,
    /// Directory where uploaded documents are written
    pub upload_dir: PathBuf,
    /// Directory for the prebuilt dashboard bundle
    pub static_dir: Option<PathBuf>,
    /// Maximum total upload size per intake request in bytes
    pub max_upload_size: usize,
    /// Maximum files per intake request
    pub max_files_per_request: usize,
    /// Passphrase protecting stored model credentials
    pub encryption_key: String,
    /// External model gateway settings
    pub model: ModelSettings,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In development mode (RUST_ENV=development) every variable has a default.
    /// In production mode the server will NOT start with development defaults
    /// for the database URL or the encryption key.
    ///
    /// Environment variables:
    /// - `RUST_ENV`: Environment (development/production) - REQUIRED
    /// - `AKUIT_HOST`, `AKUIT_PORT`: bind address
    /// - `DATABASE_URL`: SQLite or PostgreSQL connection string
    /// - `AKUIT_UPLOAD_DIR`: upload directory (default: uploads)
    /// - `AKUIT_STATIC_DIR`: dashboard bundle directory
    /// - `AKUIT_MAX_UPLOAD_SIZE`: max bytes per intake request (default: 25MB)
    /// - `AKUIT_MAX_FILES_PER_REQUEST`: max files per intake request (default: 10)
    /// - `AKUIT_ENCRYPTION_KEY`: passphrase for stored credentials
    /// - `AKUIT_MODEL_PROVIDER`: default provider (gemini/openai/zai)
    /// - `AKUIT_MODEL_TIMEOUT_SECS`, `AKUIT_MODEL_MAX_RETRIES`, `AKUIT_MODEL_BACKOFF_MS`
    /// - `GEMINI_MODEL`, `GEMINI_BASE_URL`, `OPENAI_MODEL`, `OPENAI_BASE_URL`,
    ///   `ZAI_MODEL`, `ZAI_BASE_URL`: provider endpoint overrides
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_str = env::var("RUST_ENV").map_err(|_| ConfigError::MissingEnvVar("RUST_ENV"))?;

        let environment = Environment::parse(&env_str).ok_or(ConfigError::InvalidValue(
            "RUST_ENV must be 'development' or 'production'",
        ))?;

        let host = env::var("AKUIT_HOST").unwrap_or_else(|_| defaults::DEV_HOST.to_string());

        let port = env::var("AKUIT_PORT")
            .unwrap_or_else(|_| defaults::DEV_PORT.to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidValue("AKUIT_PORT must be a valid port number"))?;

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| defaults::DEV_DATABASE_URL.to_string());

        let upload_dir = PathBuf::from(
            env::var("AKUIT_UPLOAD_DIR").unwrap_or_else(|_| defaults::DEV_UPLOAD_DIR.to_string()),
        );

        let static_dir = env::var("AKUIT_STATIC_DIR").ok().map(PathBuf::from);

        let max_upload_size = env::var("AKUIT_MAX_UPLOAD_SIZE")
            .unwrap_or_else(|_| defaults::DEV_MAX_UPLOAD_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| ConfigError::InvalidValue("AKUIT_MAX_UPLOAD_SIZE must be a valid number"))?;

        let max_files_per_request = env::var("AKUIT_MAX_FILES_PER_REQUEST")
            .unwrap_or_else(|_| defaults::DEV_MAX_FILES_PER_REQUEST.to_string())
            .parse::<usize>()
            .map_err(|_| {
                ConfigError::InvalidValue("AKUIT_MAX_FILES_PER_REQUEST must be a valid number")
            })?;

        let encryption_key = env::var("AKUIT_ENCRYPTION_KEY")
            .unwrap_or_else(|_| defaults::DEV_ENCRYPTION_KEY.to_string());

        let model = Self::model_settings_from_env()?;

        let config = Config {
            environment,
            host,
            port,
            database_url,
            upload_dir,
            static_dir,
            max_upload_size,
            max_files_per_request,
            encryption_key,
            model,
        };

        if environment.is_production() {
            config.validate_production()?;
        }

        Ok(config)
    }

    fn model_settings_from_env() -> Result<ModelSettings, ConfigError> {
        let mut settings = ModelSettings::default();

        if let Ok(provider) = env::var("AKUIT_MODEL_PROVIDER") {
            settings.default_provider = Provider::parse(&provider).ok_or(
                ConfigError::InvalidValue("AKUIT_MODEL_PROVIDER must be gemini, openai or zai"),
            )?;
        }

        if let Ok(value) = env::var("AKUIT_MODEL_TIMEOUT_SECS") {
            settings.timeout_secs = value.parse::<u64>().map_err(|_| {
                ConfigError::InvalidValue("AKUIT_MODEL_TIMEOUT_SECS must be a valid number")
            })?;
        }

        if let Ok(value) = env::var("AKUIT_MODEL_MAX_RETRIES") {
            settings.max_retries = value.parse::<u32>().map_err(|_| {
                ConfigError::InvalidValue("AKUIT_MODEL_MAX_RETRIES must be a valid number")
            })?;
        }

        if let Ok(value) = env::var("AKUIT_MODEL_BACKOFF_MS") {
            settings.initial_backoff_ms = value.parse::<u64>().map_err(|_| {
                ConfigError::InvalidValue("AKUIT_MODEL_BACKOFF_MS must be a valid number")
            })?;
        }

        override_endpoint(&mut settings.gemini, "GEMINI_BASE_URL", "GEMINI_MODEL");
        override_endpoint(&mut settings.openai, "OPENAI_BASE_URL", "OPENAI_MODEL");
        override_endpoint(&mut settings.zai, "ZAI_BASE_URL", "ZAI_MODEL");

        Ok(settings)
    }

    /// Validate that production configuration does not use development defaults.
    fn validate_production(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.database_url == defaults::DEV_DATABASE_URL {
            errors.push(format!(
                "DATABASE_URL is using development default '{}'. Set a production database URL.",
                defaults::DEV_DATABASE_URL
            ));
        }

        if self.encryption_key == defaults::DEV_ENCRYPTION_KEY {
            errors.push(
                "AKUIT_ENCRYPTION_KEY is using development default. Set a secure passphrase."
                    .to_string(),
            );
        }

        if self.encryption_key.len() < 16 {
            errors.push("AKUIT_ENCRYPTION_KEY must be at least 16 characters.".to_string());
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

fn override_endpoint(endpoint: &mut ProviderEndpoint, url_var: &str, model_var: &str) {
    if let Ok(url) = env::var(url_var) {
        endpoint.base_url = url.trim_end_matches('/').to_string();
    }
    if let Ok(model) = env::var(model_var) {
        endpoint.model = model;
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
