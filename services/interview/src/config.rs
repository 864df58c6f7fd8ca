//! Application Configuration Module
//!
//! Loads the interview service settings from environment variables into a
//! single struct that the composition root hands out.

use secrecy::SecretString;
use std::env;
use std::path::PathBuf;
use tracing::Level;

pub const DEFAULT_CALL_SERVICE_URL: &str = "ws://127.0.0.1:8787";
pub const DEFAULT_FEEDBACK_SERVICE_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_INTERVIEWS_PATH: &str = "interviews.json";

/// Holds all configuration loaded from the environment.
#[derive(Debug)]
pub struct Config {
    pub call_service_url: String,
    pub call_service_api_key: SecretString,
    pub generate_workflow_id: Option<String>,
    pub feedback_service_url: String,
    pub interviews_path: PathBuf,
    pub assistant_config_path: Option<PathBuf>,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub log_level: Level,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid log level provided for RUST_LOG: {0}")]
    InvalidLogLevel(String),
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    // *   `CALL_SERVICE_API_KEY`: Secret key for the call session service. Required.
    // *   `CALL_SERVICE_URL`: (Optional) WebSocket base URL. Defaults to `ws://127.0.0.1:8787`.
    // *   `GENERATE_WORKFLOW_ID`: (Optional) Workflow used by generate-mode calls.
    // *   `FEEDBACK_SERVICE_URL`: (Optional) Defaults to `http://127.0.0.1:3000`.
    // *   `INTERVIEWS_PATH`: (Optional) JSON file of stored interviews. Defaults to `interviews.json`.
    // *   `ASSISTANT_CONFIG_PATH`: (Optional) JSON file overriding the interviewer assistant.
    // *   `USER_ID`, `USER_NAME`, `USER_EMAIL`: (Optional) The signed-in user.
    // *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO".
    pub fn from_env() -> Result<Self, ConfigError> {
        // Ignored if there is no .env file.
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let call_service_api_key = get("CALL_SERVICE_API_KEY")
            .ok_or_else(|| ConfigError::MissingVar("CALL_SERVICE_API_KEY".to_string()))?;

        let log_level_str = get("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidLogLevel(log_level_str))?;

        Ok(Self {
            call_service_url: get("CALL_SERVICE_URL")
                .unwrap_or_else(|| DEFAULT_CALL_SERVICE_URL.to_string()),
            call_service_api_key: SecretString::from(call_service_api_key),
            generate_workflow_id: get("GENERATE_WORKFLOW_ID"),
            feedback_service_url: get("FEEDBACK_SERVICE_URL")
                .unwrap_or_else(|| DEFAULT_FEEDBACK_SERVICE_URL.to_string()),
            interviews_path: get("INTERVIEWS_PATH")
                .unwrap_or_else(|| DEFAULT_INTERVIEWS_PATH.to_string())
                .into(),
            assistant_config_path: get("ASSISTANT_CONFIG_PATH").map(PathBuf::from),
            user_id: get("USER_ID"),
            user_name: get("USER_NAME"),
            user_email: get("USER_EMAIL"),
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_the_key_is_set() {
        let config = Config::from_lookup(lookup(&[("CALL_SERVICE_API_KEY", "sk-1")])).unwrap();

        assert_eq!(config.call_service_api_key.expose_secret(), "sk-1");
        assert_eq!(config.call_service_url, DEFAULT_CALL_SERVICE_URL);
        assert_eq!(config.feedback_service_url, DEFAULT_FEEDBACK_SERVICE_URL);
        assert_eq!(config.interviews_path, PathBuf::from(DEFAULT_INTERVIEWS_PATH));
        assert_eq!(config.generate_workflow_id, None);
        assert_eq!(config.assistant_config_path, None);
        assert_eq!(config.log_level, Level::INFO);
    }

    #[test]
    fn missing_api_key_is_an_error() {
        let result = Config::from_lookup(lookup(&[("CALL_SERVICE_API_KEY", "  ")]));
        assert!(matches!(result, Err(ConfigError::MissingVar(var)) if var == "CALL_SERVICE_API_KEY"));
    }

    #[test]
    fn invalid_log_level_is_an_error() {
        let result = Config::from_lookup(lookup(&[
            ("CALL_SERVICE_API_KEY", "sk-1"),
            ("RUST_LOG", "chatty"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidLogLevel(level)) if level == "chatty"));
    }

    #[test]
    fn reads_identity_and_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("CALL_SERVICE_API_KEY", "sk-1"),
            ("GENERATE_WORKFLOW_ID", "wf-42"),
            ("USER_ID", "u1"),
            ("USER_NAME", "Ada"),
            ("ASSISTANT_CONFIG_PATH", "assistant.json"),
            ("RUST_LOG", "debug"),
        ]))
        .unwrap();

        assert_eq!(config.generate_workflow_id.as_deref(), Some("wf-42"));
        assert_eq!(config.user_id.as_deref(), Some("u1"));
        assert_eq!(config.user_name.as_deref(), Some("Ada"));
        assert_eq!(config.user_email, None);
        assert_eq!(
            config.assistant_config_path,
            Some(PathBuf::from("assistant.json"))
        );
        assert_eq!(config.log_level, Level::DEBUG);
    }
}
