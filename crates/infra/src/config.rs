//! Process configuration loaded from environment variables.
//!
//! All settings come from the environment, optionally seeded from a local
//! `.env` file via `dotenvy`. Configuration is read and validated once at
//! startup; a missing API key fails here, not on the first text request.

use std::time::Duration;

use thiserror::Error;

use carlot_ai::{ApiKey, BioPromptTemplate, GeminiConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};

use crate::handlers::BioSettings;

pub const ENV_API_KEY: &str = "GEMINI_AI_API_KEY";
pub const ENV_MODEL: &str = "GEMINI_MODEL";
pub const ENV_BASE_URL: &str = "GEMINI_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "GEMINI_TIMEOUT_SECS";
pub const ENV_BIO_TEMPLATE: &str = "BIO_PROMPT_TEMPLATE";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_DATABASE_MAX_CONNECTIONS: &str = "DATABASE_MAX_CONNECTIONS";

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Top-level configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gemini: GeminiConfig,
    pub bio: BioSettings,
    /// `None` keeps cars in memory.
    pub database: Option<DatabaseConfig>,
}

impl AppConfig {
    /// Load from the process environment (after an optional `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = var(ENV_API_KEY).ok_or(ConfigError::Missing(ENV_API_KEY))?;

        let timeout = match var(ENV_TIMEOUT_SECS) {
            Some(raw) => {
                let secs: u64 = parse(ENV_TIMEOUT_SECS, &raw)?;
                if secs == 0 {
                    return Err(ConfigError::Invalid {
                        key: ENV_TIMEOUT_SECS,
                        reason: "must be greater than zero (unset it to disable the timeout)"
                            .to_string(),
                    });
                }
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let gemini = GeminiConfig {
            api_key: ApiKey::new(api_key),
            base_url: var(ENV_BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout,
        };

        let template = match var(ENV_BIO_TEMPLATE) {
            Some(raw) => BioPromptTemplate::new(raw).map_err(|e| ConfigError::Invalid {
                key: ENV_BIO_TEMPLATE,
                reason: e.to_string(),
            })?,
            None => BioPromptTemplate::default(),
        };

        let bio = BioSettings {
            model: var(ENV_MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            template,
        };

        let database = match var(ENV_DATABASE_URL) {
            Some(url) => Some(DatabaseConfig {
                url,
                max_connections: match var(ENV_DATABASE_MAX_CONNECTIONS) {
                    Some(raw) => parse(ENV_DATABASE_MAX_CONNECTIONS, &raw)?,
                    None => DEFAULT_MAX_CONNECTIONS,
                },
            }),
            None => None,
        };

        Ok(Self {
            gemini,
            bio,
            database,
        })
    }
}

fn parse<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: format!("{raw:?}: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg = AppConfig::from_lookup(lookup(&[(ENV_API_KEY, "abc")])).unwrap();

        assert_eq!(cfg.gemini.api_key.expose(), "abc");
        assert_eq!(cfg.gemini.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.gemini.timeout, None);
        assert_eq!(cfg.bio, BioSettings::default());
        assert_eq!(cfg.database, None);
    }

    #[test]
    fn missing_api_key_fails_at_startup() {
        let err = AppConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing(ENV_API_KEY));
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let err = AppConfig::from_lookup(lookup(&[(ENV_API_KEY, "   ")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing(ENV_API_KEY));
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = AppConfig::from_lookup(lookup(&[
            (ENV_API_KEY, "abc"),
            (ENV_MODEL, "gemini-2.0-flash"),
            (ENV_BASE_URL, "http://localhost:8081"),
            (ENV_TIMEOUT_SECS, "15"),
            (ENV_BIO_TEMPLATE, "{model} {brand} {year}"),
            (ENV_DATABASE_URL, "postgres://cars@localhost/cars"),
            (ENV_DATABASE_MAX_CONNECTIONS, "12"),
        ]))
        .unwrap();

        assert_eq!(cfg.bio.model, "gemini-2.0-flash");
        assert_eq!(cfg.bio.template.as_str(), "{model} {brand} {year}");
        assert_eq!(cfg.gemini.base_url, "http://localhost:8081");
        assert_eq!(cfg.gemini.timeout, Some(Duration::from_secs(15)));
        assert_eq!(
            cfg.database,
            Some(DatabaseConfig {
                url: "postgres://cars@localhost/cars".into(),
                max_connections: 12,
            })
        );
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let err = AppConfig::from_lookup(lookup(&[
            (ENV_API_KEY, "abc"),
            (ENV_TIMEOUT_SECS, "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: ENV_TIMEOUT_SECS, .. }));

        let err = AppConfig::from_lookup(lookup(&[
            (ENV_API_KEY, "abc"),
            (ENV_TIMEOUT_SECS, "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: ENV_TIMEOUT_SECS, .. }));
    }

    #[test]
    fn template_missing_placeholders_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[
            (ENV_API_KEY, "abc"),
            (ENV_BIO_TEMPLATE, "Describe a car"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: ENV_BIO_TEMPLATE, .. }));
    }

    #[test]
    fn debug_output_hides_api_key() {
        let cfg = AppConfig::from_lookup(lookup(&[(ENV_API_KEY, "top-secret")])).unwrap();
        assert!(!format!("{cfg:?}").contains("top-secret"));
    }
}
