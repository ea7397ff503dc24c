//! Process settings loaded from the environment.
//!
//! Every variable is optional and falls back to a local-development
//! default. Numeric variables that are set but unparsable are a
//! `Error::ConfigError`, never silently replaced by the default.

use crate::error::{Error, Result};
use crate::observability::TtlPolicy;
use crate::service::ServiceConfig;
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

#[cfg(feature = "redis")]
use crate::backend::RedisConfig;
#[cfg(feature = "elasticsearch")]
use crate::search::ElasticsearchConfig;

/// Application settings.
#[derive(Clone, Debug)]
pub struct Settings {
    pub project_name: String,
    pub project_description: String,
    pub project_version: String,

    pub redis_host: String,
    pub redis_port: u16,
    pub redis_pool_size: u32,

    pub elastic_host: String,
    pub elastic_port: u16,

    pub server_host: String,
    pub server_port: u16,

    /// Default TTL for every entity type.
    pub cache_ttl: Duration,
    pub film_cache_ttl: Option<Duration>,
    pub genre_cache_ttl: Option<Duration>,
    pub person_cache_ttl: Option<Duration>,

    pub cache_timeout: Duration,
    pub search_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            project_name: "Pet-movies".to_string(),
            project_description: "Put your description here".to_string(),
            project_version: crate::VERSION.to_string(),
            redis_host: "127.0.0.1".to_string(),
            redis_port: 6379,
            redis_pool_size: 16,
            elastic_host: "127.0.0.1".to_string(),
            elastic_port: 9200,
            server_host: "0.0.0.0".to_string(),
            server_port: 8000,
            cache_ttl: crate::observability::DEFAULT_TTL,
            film_cache_ttl: None,
            genre_cache_ttl: None,
            person_cache_ttl: None,
            cache_timeout: crate::service::DEFAULT_CACHE_TIMEOUT,
            search_timeout: crate::service::DEFAULT_SEARCH_TIMEOUT,
        }
    }
}

impl Settings {
    /// Load settings from process environment variables.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` if a numeric variable cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` if a numeric variable cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();
        let env = Env { lookup };

        Ok(Settings {
            project_name: env.string("PROJECT_NAME", defaults.project_name),
            project_description: env.string("PROJECT_DESC", defaults.project_description),
            project_version: env.string("PROJECT_VERSION", defaults.project_version),

            redis_host: env.string("REDIS_HOST", defaults.redis_host),
            redis_port: env.parse("REDIS_PORT", defaults.redis_port)?,
            redis_pool_size: env.parse("REDIS_POOL_SIZE", defaults.redis_pool_size)?,

            elastic_host: env.string("ELASTIC_HOST", defaults.elastic_host),
            elastic_port: env.parse("ELASTIC_PORT", defaults.elastic_port)?,

            server_host: env.string("SERVER_HOST", defaults.server_host),
            server_port: env.parse("SERVER_PORT", defaults.server_port)?,

            cache_ttl: env
                .seconds("CACHE_TTL_SECONDS")?
                .unwrap_or(defaults.cache_ttl),
            film_cache_ttl: env.seconds("FILM_CACHE_TTL_SECONDS")?,
            genre_cache_ttl: env.seconds("GENRE_CACHE_TTL_SECONDS")?,
            person_cache_ttl: env.seconds("PERSON_CACHE_TTL_SECONDS")?,

            cache_timeout: env
                .millis("CACHE_TIMEOUT_MS")?
                .unwrap_or(defaults.cache_timeout),
            search_timeout: env
                .millis("SEARCH_TIMEOUT_MS")?
                .unwrap_or(defaults.search_timeout),
        })
    }

    /// TTL for entries of the given index.
    pub fn ttl_for(&self, index: &str) -> Duration {
        let override_ttl = match index {
            "movies" => self.film_cache_ttl,
            "genres" => self.genre_cache_ttl,
            "persons" => self.person_cache_ttl,
            _ => None,
        };
        override_ttl.unwrap_or(self.cache_ttl)
    }

    pub fn ttl_policy(&self) -> TtlPolicy {
        let overrides: HashMap<String, Duration> = ["movies", "genres", "persons"]
            .into_iter()
            .map(|index| (index.to_string(), self.ttl_for(index)))
            .collect();

        TtlPolicy::PerIndex {
            default: self.cache_ttl,
            overrides,
        }
    }

    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig::default()
            .with_cache_timeout(self.cache_timeout)
            .with_search_timeout(self.search_timeout)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    #[cfg(feature = "redis")]
    pub fn redis_config(&self) -> RedisConfig {
        RedisConfig {
            host: self.redis_host.clone(),
            port: self.redis_port,
            pool_size: self.redis_pool_size,
            ..RedisConfig::default()
        }
    }

    #[cfg(feature = "elasticsearch")]
    pub fn elasticsearch_config(&self) -> ElasticsearchConfig {
        ElasticsearchConfig {
            host: self.elastic_host.clone(),
            port: self.elastic_port,
            request_timeout: self.search_timeout,
        }
    }
}

struct Env<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn string(&self, name: &str, default: String) -> String {
        (self.lookup)(name).unwrap_or(default)
    }

    fn parse<T>(&self, name: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        match (self.lookup)(name) {
            Some(raw) => raw.trim().parse().map_err(|e| {
                Error::ConfigError(format!("{} has invalid value {:?}: {}", name, raw, e))
            }),
            None => Ok(default),
        }
    }

    fn optional_u64(&self, name: &str) -> Result<Option<u64>> {
        match (self.lookup)(name) {
            Some(_) => self.parse(name, 0).map(Some),
            None => Ok(None),
        }
    }

    fn seconds(&self, name: &str) -> Result<Option<Duration>> {
        Ok(self.optional_u64(name)?.map(Duration::from_secs))
    }

    fn millis(&self, name: &str) -> Result<Option<Duration>> {
        Ok(self.optional_u64(name)?.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = settings(&[]).unwrap();

        assert_eq!(settings.project_name, "Pet-movies");
        assert_eq!(settings.redis_host, "127.0.0.1");
        assert_eq!(settings.redis_port, 6379);
        assert_eq!(settings.elastic_port, 9200);
        assert_eq!(settings.bind_address(), "0.0.0.0:8000");
        assert_eq!(settings.ttl_for("movies"), Duration::from_secs(300));
        assert_eq!(settings.cache_timeout, Duration::from_millis(200));
        assert_eq!(settings.search_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_overrides() {
        let settings = settings(&[
            ("REDIS_HOST", "redis"),
            ("REDIS_PORT", "6380"),
            ("ELASTIC_HOST", "es"),
            ("CACHE_TTL_SECONDS", "60"),
            ("GENRE_CACHE_TTL_SECONDS", "3600"),
            ("SEARCH_TIMEOUT_MS", "750"),
        ])
        .unwrap();

        assert_eq!(settings.redis_host, "redis");
        assert_eq!(settings.redis_port, 6380);
        assert_eq!(settings.elastic_host, "es");
        assert_eq!(settings.ttl_for("movies"), Duration::from_secs(60));
        assert_eq!(settings.ttl_for("genres"), Duration::from_secs(3600));
        assert_eq!(settings.ttl_for("unknown"), Duration::from_secs(60));
        assert_eq!(settings.service_config().search_timeout, Duration::from_millis(750));

        let policy = settings.ttl_policy();
        assert_eq!(policy.get_ttl("genres"), Duration::from_secs(3600));
        assert_eq!(policy.get_ttl("persons"), Duration::from_secs(60));
    }

    #[test]
    fn test_invalid_number_is_config_error() {
        let err = settings(&[("REDIS_PORT", "not-a-port")]).unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));

        let err = settings(&[("CACHE_TTL_SECONDS", "-5")]).unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }
}
