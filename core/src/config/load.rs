use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::types::{AppConfig, PolicyMode};
use crate::error::ConfigError;

pub fn load_default() -> Result<AppConfig, ConfigError> {
    load_from(None)
}

/// Reads `path` (or `./config.toml` when present), then applies `.env` and
/// process environment overrides.
pub fn load_from(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            tracing::warn!(error = %e, "failed to read .env file");
        }
    }

    let mut cfg = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ConfigError::NotFound(p.display().to_string()));
            }
            read_file(p)?
        }
        None if Path::new("config.toml").exists() => read_file(Path::new("config.toml"))?,
        None => AppConfig::default(),
    };

    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok())?;
    validate(&cfg)?;
    Ok(cfg)
}

fn read_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str::<AppConfig>(&s).map_err(|e| ConfigError::Parse(e.into()))
}

/// Overrides config values from `lookup` (normally `std::env::var`).
/// Blank values are ignored.
pub fn apply_env_overrides<F>(cfg: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("SANDBOX_ROOT") {
        cfg.policy.sandbox_root = PathBuf::from(v.trim());
    }
    if let Some(v) = get("OPERATOR_POLICY_MODE") {
        cfg.policy.mode = PolicyMode::from_str(&v).map_err(|msg| ConfigError::EnvInvalid {
            key: "OPERATOR_POLICY_MODE".into(),
            source: anyhow::anyhow!(msg),
        })?;
    }
    if let Some(v) = get("OPERATOR_COMMAND_TIMEOUT_SEC") {
        cfg.executor.timeout_secs = parse_env("OPERATOR_COMMAND_TIMEOUT_SEC", &v)?;
    }
    if let Some(v) = get("OPERATOR_MAX_OUTPUT_CHARS") {
        cfg.executor.max_output_chars = parse_env("OPERATOR_MAX_OUTPUT_CHARS", &v)?;
    }
    if let Some(v) = get("OPERATOR_HOST") {
        cfg.server.host = v.trim().to_string();
    }
    if let Some(v) = get("OPERATOR_PORT") {
        cfg.server.port = parse_env("OPERATOR_PORT", &v)?;
    }
    if let Some(v) = get("OLLAMA_BASE_URL") {
        cfg.llm.base_url = v.trim().to_string();
    }
    // OLLAMA_MODEL set but blank clears the preferred model.
    if let Some(v) = lookup("OLLAMA_MODEL") {
        let v = v.trim();
        cfg.llm.model = (!v.is_empty()).then(|| v.to_string());
    }
    if let Some(v) = get("OLLAMA_FALLBACK_MODEL") {
        cfg.llm.fallback_model = v.trim().to_string();
    }
    if let Some(v) = get("OLLAMA_TIMEOUT_SEC") {
        cfg.llm.timeout_secs = parse_env("OLLAMA_TIMEOUT_SEC", &v)?;
    }

    Ok(())
}

fn parse_env<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::EnvInvalid {
            key: key.to_string(),
            source: e.into(),
        })
}

pub fn validate(cfg: &AppConfig) -> Result<(), ConfigError> {
    if cfg.executor.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "executor.timeout_secs must be greater than zero".into(),
        ));
    }
    if cfg.executor.max_output_chars == 0 {
        return Err(ConfigError::Validation(
            "executor.max_output_chars must be greater than zero".into(),
        ));
    }
    if cfg.policy.allowed_prefixes.iter().any(|p| p.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "policy.allowed_prefixes must not contain empty entries".into(),
        ));
    }
    if cfg.memory.max_messages == 0 {
        return Err(ConfigError::Validation(
            "memory.max_messages must be greater than zero".into(),
        ));
    }
    if cfg.memory.max_sessions == 0 {
        return Err(ConfigError::Validation(
            "memory.max_sessions must be greater than zero".into(),
        ));
    }
    Ok(())
}
