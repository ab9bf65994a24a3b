use std::{env, fs, path::Path};

use serde::Deserialize;

use crate::{Result, RoadhogError, backend::BackendType, flow::InvokePolicy};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// generative backend config
    #[serde(default)]
    pub backend: BackendConfig,
    /// map provider config, consumed by the map layer
    #[serde(default)]
    pub maps: MapsConfig,
    /// caller-side retry policy, no retries by default
    #[serde(default)]
    pub policy: InvokePolicy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// backend type
    pub backend_type: BackendType,
    /// base url of the generative language api
    pub endpoint: String,
    /// model name
    pub model: String,
    /// name of the environment variable holding the api key
    pub api_key_env: String,
    /// request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            backend_type: BackendType::default(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl BackendConfig {
    /// Reads the api key from the configured environment variable.
    pub fn api_key(&self) -> Result<String> {
        read_env(&self.api_key_env)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MapsConfig {
    /// name of the environment variable holding the map provider key
    pub api_key_env: String,
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            api_key_env: "NEXT_PUBLIC_GOOGLE_MAPS_API_KEY".to_string(),
        }
    }
}

impl MapsConfig {
    pub fn api_key(&self) -> Result<String> {
        read_env(&self.api_key_env)
    }
}

fn read_env(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(RoadhogError::Config(format!("environment variable '{}' is not set", name))),
    }
}

impl Config {
    pub fn create<T: AsRef<Path>>(path: T) -> Result<Self> {
        let data = fs::read_to_string(path.as_ref())
            .map_err(|err| RoadhogError::Config(format!("failed to load config file {:?}: {}", path.as_ref(), err)))?;

        Self::load_from_str(data.as_str())
    }

    pub fn load_from_str(toml_str: &str) -> Result<Self> {
        let config = toml::from_str::<Config>(toml_str)?;
        if config.backend.timeout_ms == 0 {
            return Err(RoadhogError::Config("backend.timeout_ms must be greater than 0".to_string()));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod test {
    use crate::{BackendType, Config, RoadhogError};

    #[test]
    fn test_config_deserialize() {
        let toml_str = r#"
        [backend]
        backend_type = "gemini"
        model = "gemini-2.0-flash"
        api_key_env = "ROADHOG_KEY"
        timeout_ms = 10000

        [maps]
        api_key_env = "MAPS_KEY"

        [policy]
        backend_retries = 2
        output_retries = 1
        backoff_ms = 250
        "#;
        let config = Config::load_from_str(toml_str).unwrap();
        assert_eq!(config.backend.backend_type, BackendType::Gemini);
        assert_eq!(config.backend.model, "gemini-2.0-flash");
        assert_eq!(config.backend.endpoint, super::DEFAULT_ENDPOINT);
        assert_eq!(config.backend.timeout_ms, 10000);
        assert_eq!(config.maps.api_key_env, "MAPS_KEY");
        assert_eq!(config.policy.backend_retries, 2);
        assert_eq!(config.policy.output_retries, 1);
        assert_eq!(config.policy.backoff_ms, 250);
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::load_from_str("").unwrap();
        assert_eq!(config.backend.backend_type, BackendType::Gemini);
        assert_eq!(config.backend.model, super::DEFAULT_MODEL);
        assert_eq!(config.policy.backend_retries, 0);
        assert_eq!(config.policy.output_retries, 0);
    }

    #[test]
    fn test_config_rejects_zero_timeout() {
        let err = Config::load_from_str("[backend]\ntimeout_ms = 0").unwrap_err();
        assert!(matches!(err, RoadhogError::Config(_)));
    }

    #[test]
    fn test_config_rejects_bad_toml() {
        assert!(matches!(Config::load_from_str("[backend"), Err(RoadhogError::Config(_))));
    }

    #[test]
    fn test_missing_api_key_env() {
        let config = Config::load_from_str("[backend]\napi_key_env = \"ROADHOG_TEST_UNSET_VARIABLE\"").unwrap();
        assert!(matches!(config.backend.api_key(), Err(RoadhogError::Config(_))));
    }
}
