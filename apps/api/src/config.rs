use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Base URL of the AI evaluation backend, e.g. `http://localhost:5000`.
    pub evaluator_api_url: String,
    /// HS256 secret used to verify session JWTs.
    pub jwt_secret: String,
    pub evaluator_timeout_secs: u64,
    pub evaluation_concurrency: usize,
    pub default_provider: String,
    pub default_model: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            evaluator_api_url: require_env("EVALUATOR_API_URL")?,
            jwt_secret: require_env("JWT_SECRET")?,
            evaluator_timeout_secs: parse_env("EVALUATOR_TIMEOUT_SECS", 90)?,
            evaluation_concurrency: parse_env("EVALUATION_CONCURRENCY", 3)?,
            default_provider: std::env::var("DEFAULT_PROVIDER")
                .unwrap_or_else(|_| "anthropic".to_string()),
            default_model: std::env::var("DEFAULT_MODEL").ok().filter(|m| !m.is_empty()),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Config {
            database_url: "postgres://localhost/recruit_test".to_string(),
            evaluator_api_url: "http://localhost:5000".to_string(),
            jwt_secret: "test-secret".to_string(),
            evaluator_timeout_secs: 5,
            evaluation_concurrency: 3,
            default_provider: "anthropic".to_string(),
            default_model: None,
            port: 0,
            rust_log: "debug".to_string(),
        }
    }
}
