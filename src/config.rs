use anyhow::{bail, Result};
use std::path::PathBuf;

pub const DB_ENV: &str = "TASKPAD_DB";
pub const LOG_DIR_ENV: &str = "TASKPAD_LOG_DIR";
pub const LOG_LEVEL_ENV: &str = "TASKPAD_LOG";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: &'static str,
}

impl Config {
    pub fn from_env(db_flag: Option<PathBuf>) -> Result<Self> {
        Self::resolve(db_flag, |key| std::env::var(key).ok())
    }

    /// Flag beats environment, environment beats the `$HOME` defaults.
    pub fn resolve<F>(db_flag: Option<PathBuf>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let home = PathBuf::from(env("HOME").unwrap_or_else(|| ".".to_string()));
        let non_empty = |key: &str| env(key).filter(|value| !value.trim().is_empty());

        let db_path = db_flag
            .or_else(|| non_empty(DB_ENV).map(PathBuf::from))
            .unwrap_or_else(|| home.join(".taskpad.db"));
        let log_dir = non_empty(LOG_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join(".taskpad").join("logs"));
        let log_level = match non_empty(LOG_LEVEL_ENV) {
            Some(level) => normalize_level(&level)?,
            None => default_log_level(),
        };

        Ok(Config {
            db_path,
            log_dir,
            log_level,
        })
    }
}

pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

pub fn normalize_level(level: &str) -> Result<&'static str> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => bail!("unsupported log level `{other}`; expected trace|debug|info|warn|error"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_live_under_home() {
        let config = Config::resolve(None, env_of(&[("HOME", "/home/u")])).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/home/u/.taskpad.db"));
        assert_eq!(config.log_dir, PathBuf::from("/home/u/.taskpad/logs"));
        assert_eq!(config.log_level, default_log_level());
    }

    #[test]
    fn missing_home_falls_back_to_cwd() {
        let config = Config::resolve(None, env_of(&[])).unwrap();
        assert_eq!(config.db_path, PathBuf::from("./.taskpad.db"));
    }

    #[test]
    fn flag_overrides_env() {
        let env = env_of(&[("HOME", "/home/u"), (DB_ENV, "/env/t.db")]);
        let config = Config::resolve(Some(PathBuf::from("/flag/t.db")), &env).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/flag/t.db"));

        let config = Config::resolve(None, &env).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/env/t.db"));
    }

    #[test]
    fn log_level_is_normalized() {
        let config = Config::resolve(None, env_of(&[(LOG_LEVEL_ENV, " WARNING ")])).unwrap();
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        assert!(Config::resolve(None, env_of(&[(LOG_LEVEL_ENV, "loud")])).is_err());
    }
}
