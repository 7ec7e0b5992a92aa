use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf};

pub const DEFAULT_TOP_N: usize = 5;
pub const DEFAULT_INDEX_NAME: &str = "moods";
pub const ENV_ALGOLIA_APP_ID: &str = "ALGOLIA_APP_ID";
pub const ENV_ALGOLIA_API_KEY: &str = "ALGOLIA_API_KEY";
pub const ENV_MOODS_PATH: &str = "MOODCHECK_MOODS_PATH";

/// Value shipped in the sample `.env`; treated as "not configured".
const PLACEHOLDER_APP_ID: &str = "your_algolia_app_id";

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(Self(v))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(**redacted**)")
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopN(usize);

impl TopN {
    pub fn new(value: usize) -> Result<Self, ConfigError> {
        if value == 0 {
            return Err(ConfigError::ZeroTopN);
        }
        Ok(Self(value))
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl Default for TopN {
    fn default() -> Self {
        Self(DEFAULT_TOP_N)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexName(String);

impl IndexName {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(ConfigError::EmptyIndexName);
        }
        Ok(Self(v))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for IndexName {
    fn default() -> Self {
        Self(DEFAULT_INDEX_NAME.to_owned())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlgoliaConfig {
    pub app_id: String,
    pub api_key: ApiKey,
    pub index: IndexName,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// `None` means the bundled catalog.
    pub catalog_path: Option<PathBuf>,
    pub top_n: TopN,
    pub algolia: Option<AlgoliaConfig>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("api key must not be empty")]
    EmptyApiKey,
    #[error("top-n must be > 0")]
    ZeroTopN,
    #[error("index name must not be empty")]
    EmptyIndexName,
}

pub trait Env {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Clone, Debug, Default)]
pub struct StdEnv;

impl Env for StdEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MapEnv {
    vars: std::collections::BTreeMap<String, String>,
}

impl MapEnv {
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl Env for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn resolve_api_key(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
) -> Result<Option<ApiKey>, ConfigError> {
    match cli_value {
        Some(v) => Ok(Some(ApiKey::new(v)?)),
        None => match env.var(env_key) {
            Some(v) => Ok(Some(ApiKey::new(v)?)),
            None => Ok(None),
        },
    }
}

pub fn resolve_optional_string(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
) -> Option<String> {
    match cli_value {
        Some(v) => Some(v),
        None => env.var(env_key),
    }
}

/// Algolia is only used when both credentials resolve and the app id is real.
pub fn resolve_algolia(
    cli_app_id: Option<String>,
    cli_api_key: Option<String>,
    index: IndexName,
    env: &impl Env,
) -> Result<Option<AlgoliaConfig>, ConfigError> {
    let app_id = resolve_optional_string(cli_app_id, ENV_ALGOLIA_APP_ID, env)
        .filter(|id| !id.trim().is_empty() && id != PLACEHOLDER_APP_ID);
    let api_key = resolve_api_key(cli_api_key, ENV_ALGOLIA_API_KEY, env)?;

    Ok(match (app_id, api_key) {
        (Some(app_id), Some(api_key)) => Some(AlgoliaConfig {
            app_id,
            api_key,
            index,
        }),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_cli_takes_precedence_over_env() {
        let env = MapEnv::default().with_var(ENV_ALGOLIA_API_KEY, "env-key");
        let key = resolve_api_key(Some("cli-key".to_owned()), ENV_ALGOLIA_API_KEY, &env)
            .expect("valid key")
            .expect("present");
        assert_eq!(key.expose(), "cli-key");
    }

    #[test]
    fn api_key_env_used_when_cli_missing() {
        let env = MapEnv::default().with_var(ENV_ALGOLIA_API_KEY, "env-key");
        let key = resolve_api_key(None, ENV_ALGOLIA_API_KEY, &env)
            .expect("valid key")
            .expect("present");
        assert_eq!(key.expose(), "env-key");
    }

    #[test]
    fn api_key_debug_is_redacted() {
        let key = ApiKey::new("secret").expect("non-empty");
        assert_eq!(format!("{key:?}"), "ApiKey(**redacted**)");
    }

    #[test]
    fn top_n_rejects_zero() {
        assert_eq!(TopN::new(0), Err(ConfigError::ZeroTopN));
        assert_eq!(TopN::new(3).map(|t| t.get()), Ok(3));
        assert_eq!(TopN::default().get(), DEFAULT_TOP_N);
    }

    #[test]
    fn algolia_requires_both_credentials() {
        let env = MapEnv::default().with_var(ENV_ALGOLIA_APP_ID, "APP123");
        let cfg = resolve_algolia(None, None, IndexName::default(), &env).expect("valid");
        assert!(cfg.is_none());

        let env = env.with_var(ENV_ALGOLIA_API_KEY, "key");
        let cfg = resolve_algolia(None, None, IndexName::default(), &env)
            .expect("valid")
            .expect("configured");
        assert_eq!(cfg.app_id, "APP123");
        assert_eq!(cfg.index.as_str(), DEFAULT_INDEX_NAME);
    }

    #[test]
    fn algolia_placeholder_app_id_is_ignored() {
        let env = MapEnv::default()
            .with_var(ENV_ALGOLIA_APP_ID, PLACEHOLDER_APP_ID)
            .with_var(ENV_ALGOLIA_API_KEY, "key");
        let cfg = resolve_algolia(None, None, IndexName::default(), &env).expect("valid");
        assert!(cfg.is_none());
    }

    #[test]
    fn empty_api_key_is_rejected() {
        let env = MapEnv::default();
        let err = resolve_algolia(
            Some("APP123".to_owned()),
            Some("  ".to_owned()),
            IndexName::default(),
            &env,
        )
        .unwrap_err();
        assert_eq!(err, ConfigError::EmptyApiKey);
    }
}
