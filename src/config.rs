use std::env;
use std::time::Duration;

use failure::Fail;

pub const DEFAULT_POOL_SIZE: u32 = 10;
pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_DB_WORKERS: usize = 4;

#[derive(Debug, Fail, PartialEq)]
pub enum ConfigError {
    #[fail(display = "DATABASE_URL is not set")]
    MissingDatabaseUrl,

    #[fail(display = "{} must be a positive integer, got {:?}", _0, _1)]
    InvalidNumber(&'static str, String),
}

/// Everything needed to reach the store. Built once per process and handed
/// to [`crate::store::init_pool`] and [`crate::db::start`].
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_url: String,
    pub pool_size: u32,
    pub connection_timeout: Duration,
    pub db_workers: usize,
}

impl Config {
    pub fn new(database_url: &str) -> Config {
        Config {
            database_url: database_url.to_string(),
            pool_size: DEFAULT_POOL_SIZE,
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
            db_workers: DEFAULT_DB_WORKERS,
        }
    }

    /// Reads the configuration from the environment, after loading `.env`
    /// if one is present.
    pub fn from_env() -> Result<Config, ConfigError> {
        let _ = dotenv::dotenv();
        Config::from_vars(|key| env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with an explicit variable source.
    pub fn from_vars<F>(var: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = var("DATABASE_URL").ok_or(ConfigError::MissingDatabaseUrl)?;
        let mut config = Config::new(&database_url);

        if let Some(size) = number(&var, "FORUM_POOL_SIZE")? {
            config.pool_size = size as u32;
        }
        if let Some(secs) = number(&var, "FORUM_CONNECTION_TIMEOUT_SECS")? {
            config.connection_timeout = Duration::from_secs(secs);
        }
        if let Some(workers) = number(&var, "FORUM_DB_WORKERS")? {
            config.db_workers = workers as usize;
        }

        Ok(config)
    }
}

fn number<F>(var: &F, key: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        None => Ok(None),
        Some(raw) => match raw.trim().parse::<u32>() {
            Ok(n) if n > 0 => Ok(Some(u64::from(n))),
            _ => Err(ConfigError::InvalidNumber(key, raw)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|&(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_vars(vars(&[("DATABASE_URL", "postgres://localhost/forum")]))
            .unwrap();
        assert_eq!(config, Config::new("postgres://localhost/forum"));
        assert_eq!(config.connection_timeout, Duration::from_secs(2));
    }

    #[test]
    fn overrides_apply() {
        let config = Config::from_vars(vars(&[
            ("DATABASE_URL", "postgres://db/forum"),
            ("FORUM_POOL_SIZE", "32"),
            ("FORUM_CONNECTION_TIMEOUT_SECS", "5"),
            ("FORUM_DB_WORKERS", "8"),
        ]))
        .unwrap();
        assert_eq!(config.pool_size, 32);
        assert_eq!(config.connection_timeout, Duration::from_secs(5));
        assert_eq!(config.db_workers, 8);
    }

    #[test]
    fn missing_url_is_an_error() {
        assert_eq!(
            Config::from_vars(vars(&[])).unwrap_err(),
            ConfigError::MissingDatabaseUrl
        );
    }

    #[test]
    fn zero_and_garbage_are_rejected() {
        let err = Config::from_vars(vars(&[
            ("DATABASE_URL", "postgres://db/forum"),
            ("FORUM_DB_WORKERS", "0"),
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidNumber("FORUM_DB_WORKERS", "0".to_string())
        );

        assert!(Config::from_vars(vars(&[
            ("DATABASE_URL", "postgres://db/forum"),
            ("FORUM_POOL_SIZE", "lots"),
        ]))
        .is_err());
    }
}
