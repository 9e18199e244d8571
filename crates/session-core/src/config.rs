//! Environment-driven configuration.
use std::{env::VarError, path::PathBuf, time::Duration};

use folio_types::config::{BackendConfig, DEFAULT_ROLE_TIMEOUT, SessionConfig};

use crate::error::{SessionError, SessionResult};

pub const BACKEND_URL_ENV: &str = "FOLIO_BACKEND_URL";
pub const ANON_KEY_ENV: &str = "FOLIO_ANON_KEY";
pub const TOKEN_FILE_ENV: &str = "FOLIO_TOKEN_FILE";
pub const OWNER_EMAIL_ENV: &str = "FOLIO_OWNER_EMAIL";
pub const ROLE_TIMEOUT_ENV: &str = "FOLIO_ROLE_TIMEOUT";
pub const LOGIN_PATH_ENV: &str = "FOLIO_LOGIN_PATH";

const MAX_ROLE_TIMEOUT_SECS: f64 = 30.0;

/// Trimmed value of `name`; unset and blank are both `None`.
pub fn optional_env(name: &str) -> SessionResult<Option<String>> {
    match std::env::var(name) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => Ok(Some(raw.trim().to_string())),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(SessionError::InvalidConfig(format!("{name} contains invalid UTF-8"))),
    }
}

fn required_env(name: &str) -> SessionResult<String> {
    optional_env(name)?.ok_or_else(|| SessionError::MissingEnvVar(name.to_string()))
}

/// Backend endpoint and key from `FOLIO_BACKEND_URL` / `FOLIO_ANON_KEY`.
pub fn backend_config_from_env() -> SessionResult<BackendConfig> {
    let url = required_env(BACKEND_URL_ENV)?;
    url::Url::parse(&url)?;
    Ok(BackendConfig {
        url,
        anon_key: required_env(ANON_KEY_ENV)?,
        token_file: optional_env(TOKEN_FILE_ENV)?.map(PathBuf::from),
    })
}

/// Session behaviour from the environment, defaults for anything unset.
pub fn session_config_from_env() -> SessionResult<SessionConfig> {
    let mut config = SessionConfig::default();
    if let Some(owner) = optional_env(OWNER_EMAIL_ENV)? {
        config.owner_email = owner;
    }
    if let Some(path) = optional_env(LOGIN_PATH_ENV)? {
        config.login_path = path;
    }
    config.role_timeout = role_timeout_from_env()?;
    Ok(config)
}

/// `FOLIO_ROLE_TIMEOUT` in (fractional) seconds, clamped to a maximum.
pub fn role_timeout_from_env() -> SessionResult<Duration> {
    let Some(raw) = optional_env(ROLE_TIMEOUT_ENV)? else {
        return Ok(DEFAULT_ROLE_TIMEOUT);
    };
    let secs = raw.parse::<f64>().map_err(|e| {
        SessionError::InvalidConfig(format!(
            "{ROLE_TIMEOUT_ENV} must be a positive number of seconds (e.g. \"1.5\"): {e}"
        ))
    })?;
    role_timeout_from_secs(secs)
}

/// Validate a role-lookup timeout given in seconds. Values above the maximum
/// are clamped with a warning.
pub fn role_timeout_from_secs(secs: f64) -> SessionResult<Duration> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(SessionError::InvalidConfig(format!(
            "role timeout must be greater than zero (got {secs})"
        )));
    }
    let normalized = secs.min(MAX_ROLE_TIMEOUT_SECS);
    if (normalized - secs).abs() > f64::EPSILON {
        tracing::warn!(
            requested = secs,
            used = normalized,
            max = MAX_ROLE_TIMEOUT_SECS,
            "role timeout exceeded maximum and was clamped"
        );
    }
    Ok(Duration::from_secs_f64(normalized))
}
