//! Process settings from the environment (`.env` honoured).

use crate::error::ConfigError;
use std::path::PathBuf;

pub const DEFAULT_SERVICE_PATH: &str = "odata";
pub const DEFAULT_MAX_TOP: u32 = 1000;

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: String,
    /// Path prefix of the OData service root, without slashes (e.g. `odata`).
    pub service_path: String,
    pub model_path: PathBuf,
    pub max_connections: u32,
    /// Upper bound applied to `$top`.
    pub max_top: u32,
}

impl Settings {
    /// Load `.env` if present, then read settings from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| "postgres://localhost/odata".into());
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".into());
        let service_path = lookup("ODATA_SERVICE_PATH")
            .map(|s| s.trim_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_SERVICE_PATH.into());
        if service_path.is_empty() {
            return Err(ConfigError::Validation("ODATA_SERVICE_PATH must not be empty".into()));
        }
        let model_path = lookup("ODATA_MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("model.json"));
        let max_connections = parse_number(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?;
        let max_top = parse_number(&lookup, "ODATA_MAX_TOP", DEFAULT_MAX_TOP)?;
        Ok(Settings {
            database_url,
            bind_addr,
            service_path,
            model_path,
            max_connections,
            max_top,
        })
    }
}

fn parse_number(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u32) -> Result<u32, ConfigError> {
    match lookup(key) {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| ConfigError::Validation(format!("{} must be a positive integer, got '{}'", key, v))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_apply() {
        let s = Settings::from_lookup(|_| None).unwrap();
        assert_eq!(s.service_path, "odata");
        assert_eq!(s.bind_addr, "0.0.0.0:3000");
        assert_eq!(s.max_connections, 5);
        assert_eq!(s.max_top, DEFAULT_MAX_TOP);
    }

    #[test]
    fn overrides_and_trims_service_path() {
        let env: HashMap<&str, &str> = [("ODATA_SERVICE_PATH", "/api/odata/"), ("ODATA_MAX_TOP", "50")].into();
        let s = Settings::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(s.service_path, "api/odata");
        assert_eq!(s.max_top, 50);
    }

    #[test]
    fn rejects_garbage_numbers() {
        let err = Settings::from_lookup(|k| (k == "DATABASE_MAX_CONNECTIONS").then(|| "many".to_string())).unwrap_err();
        assert!(err.to_string().contains("DATABASE_MAX_CONNECTIONS"));
    }
}
