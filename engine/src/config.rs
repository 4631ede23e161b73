use serde::Deserialize;
use std::{env, path::PathBuf};
use thiserror::Error;

use vigil_client::EndpointConfig;

/// Environment variable that overrides the configured backend URL.
pub const BASE_URL_ENV: &str = "VIGIL_BASE_URL";

#[derive(Debug, Default, Deserialize)]
pub struct VigilConfig {
    pub backend: Option<BackendConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the detection service, e.g. an ngrok tunnel address.
    /// `${ENV_VAR}` references are expanded at load time.
    pub base_url: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl VigilConfig {
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let path = match Self::path() {
            Some(path) => path,
            None => return Ok(None),
        };
        if !path.exists() {
            return Ok(None);
        }

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read { path, source: err });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse { path, source: err })
            }
        }
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("vigil").join("config.toml"))
        .or_else(|| dirs::home_dir().map(|home| home.join(".vigil").join("config.toml")))
}

/// Pick the backend endpoint: `VIGIL_BASE_URL` wins over the config file.
/// Blank values count as absent.
#[must_use]
pub fn resolve_endpoint(config: Option<&VigilConfig>) -> Option<EndpointConfig> {
    if let Ok(url) = env::var(BASE_URL_ENV)
        && !url.trim().is_empty()
    {
        return Some(EndpointConfig::new(url));
    }

    config
        .and_then(|config| config.backend.as_ref())
        .and_then(|backend| backend.base_url.as_deref())
        .map(expand_env_vars)
        .filter(|url| !url.trim().is_empty())
        .map(EndpointConfig::new)
}

pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut i = 0;

    while i < value.len() {
        if value[i..].starts_with("${") {
            let start = i + 2;
            if let Some(end_rel) = value[start..].find('}') {
                let end = start + end_rel;
                let var = &value[start..end];
                if !var.is_empty() {
                    let replacement = env::var(var).unwrap_or_default();
                    out.push_str(&replacement);
                }
                i = end + 1;
                continue;
            }
        }

        let ch = value[i..].chars().next().unwrap();
        out.push(ch);
        i += ch.len_utf8();
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    // expand_env_vars tests

    #[test]
    fn expand_env_vars_no_vars() {
        let result = expand_env_vars("hello world");
        assert_eq!(result, "hello world");
    }

    #[test]
    fn expand_env_vars_single_var() {
        unsafe {
            std::env::set_var("VIGIL_TEST_CONFIG_VAR", "replaced");
        }
        let result = expand_env_vars("prefix ${VIGIL_TEST_CONFIG_VAR} suffix");
        assert_eq!(result, "prefix replaced suffix");
        unsafe {
            std::env::remove_var("VIGIL_TEST_CONFIG_VAR");
        }
    }

    #[test]
    fn expand_env_vars_missing_var_becomes_empty() {
        unsafe {
            std::env::remove_var("VIGIL_MISSING_VAR_FOR_TEST");
        }
        let result = expand_env_vars("before ${VIGIL_MISSING_VAR_FOR_TEST} after");
        assert_eq!(result, "before  after");
    }

    #[test]
    fn expand_env_vars_multiple_vars() {
        unsafe {
            std::env::set_var("VIGIL_VAR_A", "alpha");
            std::env::set_var("VIGIL_VAR_B", "beta");
        }
        let result = expand_env_vars("${VIGIL_VAR_A}-${VIGIL_VAR_B}");
        assert_eq!(result, "alpha-beta");
        unsafe {
            std::env::remove_var("VIGIL_VAR_A");
            std::env::remove_var("VIGIL_VAR_B");
        }
    }

    #[test]
    fn expand_env_vars_unclosed_brace_preserved() {
        let result = expand_env_vars("test ${UNCLOSED");
        assert_eq!(result, "test ${UNCLOSED");
    }

    #[test]
    fn expand_env_vars_empty_var_name_preserved() {
        let result = expand_env_vars("test ${} more");
        assert_eq!(result, "test  more");
    }

    // VigilConfig parsing tests

    #[test]
    fn parse_empty_config() {
        let config: VigilConfig = toml::from_str("").expect("parse");
        assert!(config.backend.is_none());
    }

    #[test]
    fn parse_backend_config() {
        let toml_str = r#"
[backend]
base_url = "https://example-detector.ngrok.app"
"#;
        let config: VigilConfig = toml::from_str(toml_str).expect("parse");
        let backend = config.backend.expect("backend section");
        assert_eq!(
            backend.base_url,
            Some("https://example-detector.ngrok.app".to_string())
        );
    }

    #[test]
    fn parse_ignores_unknown_tables() {
        let toml_str = r#"
[backend]
base_url = "https://example.test"

[future_section]
key = "value"
"#;
        let config: VigilConfig = toml::from_str(toml_str).expect("parse");
        assert!(config.backend.is_some());
    }

    // resolve_endpoint tests

    fn config_with_url(url: &str) -> VigilConfig {
        VigilConfig {
            backend: Some(BackendConfig {
                base_url: Some(url.to_string()),
            }),
        }
    }

    // Single test for the whole chain: VIGIL_BASE_URL is process-global,
    // so splitting these into parallel tests would race.
    #[test]
    fn resolve_endpoint_precedence() {
        unsafe {
            std::env::remove_var(BASE_URL_ENV);
        }

        assert!(resolve_endpoint(None).is_none());

        let config = config_with_url("https://file.example.test/");
        let endpoint = resolve_endpoint(Some(&config)).expect("config endpoint");
        assert_eq!(endpoint.base_url(), "https://file.example.test");

        let blank = config_with_url("   ");
        assert!(resolve_endpoint(Some(&blank)).is_none());

        unsafe {
            std::env::set_var("VIGIL_RESOLVE_HOST", "tunnel.example.test");
        }
        let expanded = config_with_url("https://${VIGIL_RESOLVE_HOST}");
        let endpoint = resolve_endpoint(Some(&expanded)).expect("expanded endpoint");
        assert_eq!(endpoint.base_url(), "https://tunnel.example.test");
        unsafe {
            std::env::remove_var("VIGIL_RESOLVE_HOST");
        }

        unsafe {
            std::env::set_var(BASE_URL_ENV, "https://env.example.test");
        }
        let endpoint = resolve_endpoint(Some(&config)).expect("env endpoint");
        assert_eq!(endpoint.base_url(), "https://env.example.test");
        unsafe {
            std::env::remove_var(BASE_URL_ENV);
        }

        let endpoint = resolve_endpoint(Some(&config)).expect("config endpoint again");
        assert_eq!(endpoint.base_url(), "https://file.example.test");
    }

    #[test]
    fn config_error_display_names_path() {
        let err = ConfigError::Read {
            path: PathBuf::from("/tmp/vigil/config.toml"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("/tmp/vigil/config.toml"));
        assert!(rendered.contains("denied"));
    }
}
