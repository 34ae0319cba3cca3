use secrecy::SecretString;
use serde::Deserialize;

use crate::{DEFAULT_BASE_URL, Result};
use crate::error::Error;

/// Environment variable holding the API user key.
pub const USER_KEY_VAR: &str = "CLOUDOFFICE_USER_KEY";
/// Environment variable holding the API secret key.
pub const SECRET_KEY_VAR: &str = "CLOUDOFFICE_SECRET_KEY";
/// Environment variable overriding the API base URL.
pub const BASE_URL_VAR: &str = "CLOUDOFFICE_BASE_URL";

/// Client settings taken from an external configuration source.
///
/// Deserializable so it can be embedded in an application's own config
/// file; [`Config::from_env`] covers the environment-variable case. A
/// missing credential is a configuration error at construction time,
/// never retried.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub user_key: String,
    pub secret_key: SecretString,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

impl Config {
    /// Reads `CLOUDOFFICE_USER_KEY`, `CLOUDOFFICE_SECRET_KEY`, and
    /// optionally `CLOUDOFFICE_BASE_URL` from the process environment.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            user_key: require_var(USER_KEY_VAR)?,
            secret_key: require_var(SECRET_KEY_VAR)?.into(),
            base_url: read_var(BASE_URL_VAR).unwrap_or_else(default_base_url),
        })
    }
}

fn read_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn require_var(name: &str) -> Result<String> {
    read_var(name).ok_or_else(|| Error::config(format!("missing environment variable {name}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_with_the_default_base_url() {
        let config: Config = serde_json::from_str(
            r#"{ "user_key": "userKey1", "secret_key": "secretKey1" }"#,
        )
        .expect("deserialize");
        assert_eq!(config.user_key, "userKey1");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn deserializes_an_explicit_base_url() {
        let config: Config = serde_json::from_str(
            r#"{
                "user_key": "userKey1",
                "secret_key": "secretKey1",
                "base_url": "https://api.staging.test"
            }"#,
        )
        .expect("deserialize");
        assert_eq!(config.base_url, "https://api.staging.test");
    }

    #[test]
    fn debug_output_redacts_the_secret() {
        let config: Config = serde_json::from_str(
            r#"{ "user_key": "userKey1", "secret_key": "secretKey1" }"#,
        )
        .expect("deserialize");
        assert!(!format!("{config:?}").contains("secretKey1"));
    }
}
