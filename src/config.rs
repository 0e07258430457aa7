use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::str::FromStr;

pub const DEFAULT_GOOGLE_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LLMConfig,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

#[derive(Clone, Deserialize)]
pub struct LLMConfig {
    pub provider: String,
    pub google_api_key: String,
    pub google_api_base: String,
    pub agenda_model: String,
    pub chat_model: String,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

// Keeps the API key out of startup logs.
impl std::fmt::Debug for LLMConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LLMConfig")
            .field("provider", &self.provider)
            .field("google_api_key", &if self.google_api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("google_api_base", &self.google_api_base)
            .field("agenda_model", &self.agenda_model)
            .field("chat_model", &self.chat_model)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Upload and chat requests allowed per minute across all clients
    pub llm_requests_per_minute: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub filter: String,
    pub log_dir: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: 3000,
                host: "0.0.0.0".to_string(),
                cors_allowed_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
                max_upload_bytes: 25 * 1024 * 1024,
            },
            llm: LLMConfig {
                provider: "google".to_string(),
                google_api_key: String::new(),
                google_api_base: DEFAULT_GOOGLE_API_BASE.to_string(),
                agenda_model: DEFAULT_MODEL.to_string(),
                chat_model: DEFAULT_MODEL.to_string(),
                temperature: None,
                max_output_tokens: None,
            },
            rate_limit: RateLimitConfig {
                llm_requests_per_minute: 30,
            },
            logging: LoggingConfig {
                filter: "oxidized_agenda=debug,tower_http=debug".to_string(),
                log_dir: None,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let agenda_model =
            env::var("AGENDA_LLM_MODEL").unwrap_or(defaults.llm.agenda_model);

        Ok(Self {
            server: ServerConfig {
                port: parse_var("PORT")?.unwrap_or(defaults.server.port),
                host: env::var("HOST").unwrap_or(defaults.server.host),
                cors_allowed_origins: env::var("ALLOWED_ORIGINS")
                    .map(|origins| {
                        origins
                            .split(',')
                            .map(|s| s.trim().to_string())
                            .filter(|s| !s.is_empty())
                            .collect()
                    })
                    .unwrap_or(defaults.server.cors_allowed_origins),
                max_upload_bytes: parse_var("MAX_UPLOAD_BYTES")?
                    .unwrap_or(defaults.server.max_upload_bytes),
            },
            llm: LLMConfig {
                provider: env::var("LLM_PROVIDER").unwrap_or(defaults.llm.provider),
                google_api_key: env::var("GOOGLE_API_KEY")
                    .or_else(|_| env::var("API_KEY"))
                    .unwrap_or_default(),
                google_api_base: env::var("GOOGLE_API_BASE")
                    .unwrap_or(defaults.llm.google_api_base),
                chat_model: env::var("CHAT_LLM_MODEL").unwrap_or_else(|_| agenda_model.clone()),
                agenda_model,
                temperature: parse_var("LLM_TEMPERATURE")?,
                max_output_tokens: parse_var("LLM_MAX_OUTPUT_TOKENS")?,
            },
            rate_limit: RateLimitConfig {
                llm_requests_per_minute: parse_var("LLM_REQUESTS_PER_MINUTE")?
                    .unwrap_or(defaults.rate_limit.llm_requests_per_minute),
            },
            logging: LoggingConfig {
                filter: env::var("RUST_LOG").unwrap_or(defaults.logging.filter),
                log_dir: env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
            },
        })
    }
}

/// Parse an optional environment variable, failing on present-but-invalid values
fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("{} has an invalid value: {:?}", name, raw)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.llm.provider, "google");
        assert_eq!(config.llm.agenda_model, DEFAULT_MODEL);
        assert_eq!(config.llm.google_api_base, DEFAULT_GOOGLE_API_BASE);
        assert_eq!(config.rate_limit.llm_requests_per_minute, 30);
        assert!(config.logging.log_dir.is_none());
    }

    #[test]
    fn test_parse_var() {
        env::set_var("OXIDIZED_AGENDA_TEST_PORT", " 8080 ");
        assert_eq!(parse_var::<u16>("OXIDIZED_AGENDA_TEST_PORT").unwrap(), Some(8080));

        env::set_var("OXIDIZED_AGENDA_TEST_BAD", "eighty");
        assert!(parse_var::<u16>("OXIDIZED_AGENDA_TEST_BAD").is_err());

        assert_eq!(parse_var::<u16>("OXIDIZED_AGENDA_TEST_MISSING").unwrap(), None);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let mut config = Config::default();
        config.llm.google_api_key = "super-secret".to_string();
        let rendered = format!("{:?}", config.llm);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
