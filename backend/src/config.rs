use std::env;

/// Runtime configuration, read once at startup from the environment.
///
/// Keys for external services are optional: a missing key degrades the
/// dependent feature (empty route geometry, fallback image, weather 500)
/// instead of preventing startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_refresh_secret: String,
    pub openai_api_key: Option<String>,
    pub ors_api_key: Option<String>,
    pub openweather_api_key: Option<String>,
    pub unsplash_access_key: Option<String>,
    pub bind_addr: String,
    pub client_url: String,
}

#[derive(Debug, thiserror::Error)]
#[error("environment variable {0} not set")]
pub struct MissingEnv(&'static str);

impl Config {
    pub fn from_env() -> Result<Self, MissingEnv> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_refresh_secret: required("JWT_REFRESH_SECRET")?,
            openai_api_key: optional("OPENAI_API_KEY"),
            ors_api_key: optional("ORS_API_KEY"),
            openweather_api_key: optional("OPENWEATHER_API_KEY"),
            unsplash_access_key: optional("UNSPLASH_ACCESS_KEY"),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            client_url: env::var("CLIENT_URL").unwrap_or_else(|_| "http://localhost:3000".to_string()),
        })
    }
}

fn required(key: &'static str) -> Result<String, MissingEnv> {
    env::var(key).map_err(|_| MissingEnv(key))
}

fn optional(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => {
            tracing::warn!("{key} not set, dependent feature will degrade");
            None
        }
    }
}
