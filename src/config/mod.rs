use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::ConfigError;

/// Persistence backend for the resolution cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheBackend {
    File,
    Redis,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cache_backend: CacheBackend,
    pub cache_path: String,
    pub redis_url: Option<String>,
    pub redis_cache_key: String,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub lookup_sources: Vec<String>,
    pub lookup_timeout: Duration,
    pub ascii_prefix_max_discriminator: u64,
    /// Exact leading runs stripped before ASCII decoding, tried before the `1.N` rule.
    pub ascii_prefixes: Vec<Vec<u64>>,
    pub single_flight: bool,
    pub icon_base_url: String,
    pub user_agent: String,
}

/// Default HTTP lookup order, most reliable first.
pub const DEFAULT_LOOKUP_SOURCES: &str = "alvestrand,oidref,oid-info,mib-depot,snmplink";

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build the configuration from a variable lookup.
    ///
    /// Blank values count as unset. A value that is present but does not
    /// parse is an error rather than a silent fallback to the default.
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let cache_backend = match var("CACHE_BACKEND")
            .unwrap_or_else(|| "file".to_string())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "file" => CacheBackend::File,
            "redis" => CacheBackend::Redis,
            other => {
                return Err(ConfigError::Invalid {
                    key: "CACHE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        let redis_url = var("REDIS_URL");
        if cache_backend == CacheBackend::Redis && redis_url.is_none() {
            return Err(ConfigError::Missing("REDIS_URL"));
        }

        let database_url = var("DATABASE_URL");

        let lookup_sources = parse_sources(
            &var("LOOKUP_SOURCES").unwrap_or_else(|| DEFAULT_LOOKUP_SOURCES.to_string()),
            database_url.is_some(),
        );

        let timeout_secs: u64 = parse_var(&var, "LOOKUP_TIMEOUT_SECS", 5)?;
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "LOOKUP_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }

        let ascii_prefixes = match var("ASCII_PREFIXES") {
            Some(list) => parse_prefixes(&list)?,
            None => Vec::new(),
        };

        Ok(Self {
            host: var("BACKEND_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_var(&var, "BACKEND_PORT", 3000)?,
            cache_backend,
            cache_path: var("CACHE_PATH").unwrap_or_else(|| ".oid_lookup_cache.json".to_string()),
            redis_url,
            redis_cache_key: var("REDIS_CACHE_KEY")
                .unwrap_or_else(|| "netident:oid_cache".to_string()),
            database_url,
            database_max_connections: parse_var(&var, "DATABASE_MAX_CONNECTIONS", 5)?,
            lookup_sources,
            lookup_timeout: Duration::from_secs(timeout_secs),
            ascii_prefix_max_discriminator: parse_var(&var, "ASCII_PREFIX_MAX_DISCRIMINATOR", 20)?,
            ascii_prefixes,
            single_flight: parse_flag(&var, "RESOLVE_SINGLE_FLIGHT", false)?,
            icon_base_url: var("ICON_BASE_URL")
                .unwrap_or_else(|| "/nedi/icon_library".to_string()),
            user_agent: var("HTTP_USER_AGENT")
                .unwrap_or_else(|| "Network-Observability-Platform/1.0".to_string()),
        })
    }
}

/// Parse `key` with `FromStr`, or return `default` when it is unset.
fn parse_var<T, F>(var: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

/// Parse a boolean switch: `true/false`, `1/0` or `yes/no`.
fn parse_flag<F>(var: &F, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = var(key) else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid { key, value }),
    }
}

/// Parse `ASCII_PREFIXES`, a comma list of dotted prefixes such as `1.16,1.3.6.1.4.1`.
pub fn parse_prefixes(list: &str) -> Result<Vec<Vec<u64>>, ConfigError> {
    list.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|prefix| {
            prefix
                .split('.')
                .map(|t| t.parse::<u64>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| ConfigError::Invalid {
                    key: "ASCII_PREFIXES",
                    value: prefix.to_string(),
                })
        })
        .collect()
}

/// Split a comma list of source names, dropping blanks and duplicates.
///
/// `local-db` is placed first when a database is configured and the list
/// does not already name it.
pub fn parse_sources(list: &str, has_database: bool) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();
    for name in list.split(',').map(|s| s.trim().to_ascii_lowercase()) {
        if !name.is_empty() && !sources.contains(&name) {
            sources.push(name);
        }
    }
    if has_database && !sources.iter().any(|s| s == "local-db") {
        sources.insert(0, "local-db".to_string());
    }
    sources
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_vars(|key| vars.get(key).cloned())
    }

    fn invalid_key(err: ConfigError) -> &'static str {
        match err {
            ConfigError::Invalid { key, .. } => key,
            other => panic!("expected invalid value, got {other:?}"),
        }
    }

    #[test]
    fn defaults_when_unset() {
        let config = config(&[]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.cache_backend, CacheBackend::File);
        assert_eq!(config.lookup_timeout, Duration::from_secs(5));
        assert_eq!(config.ascii_prefix_max_discriminator, 20);
        assert!(config.ascii_prefixes.is_empty());
        assert!(!config.single_flight);
        assert_eq!(config.lookup_sources.len(), 5);
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = config(&[("BACKEND_PORT", " "), ("DATABASE_URL", "")]).unwrap();
        assert_eq!(config.port, 3000);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn explicit_values_are_used() {
        let config = config(&[
            ("BACKEND_PORT", "8080"),
            ("LOOKUP_TIMEOUT_SECS", "2"),
            ("ASCII_PREFIX_MAX_DISCRIMINATOR", "32"),
            ("RESOLVE_SINGLE_FLIGHT", "Yes"),
            ("DATABASE_URL", "postgres://localhost/oids"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.lookup_timeout, Duration::from_secs(2));
        assert_eq!(config.ascii_prefix_max_discriminator, 32);
        assert!(config.single_flight);
        assert_eq!(config.lookup_sources[0], "local-db");
    }

    #[test]
    fn unparsable_numbers_are_rejected() {
        for (key, value) in [
            ("LOOKUP_TIMEOUT_SECS", "five"),
            ("BACKEND_PORT", "http"),
            ("BACKEND_PORT", "70000"),
            ("ASCII_PREFIX_MAX_DISCRIMINATOR", "-3"),
            ("DATABASE_MAX_CONNECTIONS", "many"),
        ] {
            assert_eq!(invalid_key(config(&[(key, value)]).unwrap_err()), key, "{value}");
        }
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = config(&[("LOOKUP_TIMEOUT_SECS", "0")]).unwrap_err();
        assert_eq!(invalid_key(err), "LOOKUP_TIMEOUT_SECS");
    }

    #[test]
    fn single_flight_flag_values() {
        for (value, expected) in [
            ("1", true),
            ("true", true),
            ("no", false),
            ("0", false),
            ("FALSE", false),
        ] {
            let config = config(&[("RESOLVE_SINGLE_FLIGHT", value)]).unwrap();
            assert_eq!(config.single_flight, expected, "{value}");
        }
        let err = config(&[("RESOLVE_SINGLE_FLIGHT", "maybe")]).unwrap_err();
        assert_eq!(invalid_key(err), "RESOLVE_SINGLE_FLIGHT");
    }

    #[test]
    fn unknown_cache_backend_and_missing_redis_url() {
        let err = config(&[("CACHE_BACKEND", "memcached")]).unwrap_err();
        assert_eq!(invalid_key(err), "CACHE_BACKEND");
        assert!(matches!(
            config(&[("CACHE_BACKEND", "redis")]).unwrap_err(),
            ConfigError::Missing("REDIS_URL")
        ));
    }

    #[test]
    fn ascii_prefix_list() {
        let config = config(&[("ASCII_PREFIXES", "1.16, 1.3.6.1.4.1,")]).unwrap();
        assert_eq!(config.ascii_prefixes, vec![vec![1, 16], vec![1, 3, 6, 1, 4, 1]]);

        let err = parse_prefixes("1.16,1..3").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "ASCII_PREFIXES", value } if value == "1..3"));
    }

    #[test]
    fn default_sources_in_order() {
        assert_eq!(
            parse_sources(DEFAULT_LOOKUP_SOURCES, false),
            vec!["alvestrand", "oidref", "oid-info", "mib-depot", "snmplink"]
        );
    }

    #[test]
    fn local_db_is_prepended_when_database_configured() {
        assert_eq!(parse_sources("oidref", true), vec!["local-db", "oidref"]);
        assert_eq!(
            parse_sources("oidref, local-db", true),
            vec!["oidref", "local-db"]
        );
    }

    #[test]
    fn blanks_and_duplicates_are_dropped() {
        assert_eq!(parse_sources(" OidRef,,oidref , ", false), vec!["oidref"]);
        assert!(parse_sources("", false).is_empty());
    }
}
