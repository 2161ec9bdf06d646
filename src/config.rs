//! Configuration management
//!
//! Settings come from environment variables; command line flags override
//! them in the binary.

use std::env;
use std::path::PathBuf;

use crate::db::TablePrefix;
use crate::error::{Error, Result};

// Environment variable names
const ENV_DSN: &str = "NEXTCLOUD_SQL_ADDRESSBOOK_DSN";
const ENV_TABLE_PREFIX: &str = "NEXTCLOUD_SQL_ADDRESSBOOK_DBTABLEPREFIX";
const ENV_SQL_DEBUG: &str = "SQL_DEBUG";
const ENV_AUTOCOMPLETE: &str = "AUTOCOMPLETE_ADDRESSBOOKS";

/// Autocomplete source the host always has
pub const DEFAULT_AUTOCOMPLETE_SOURCE: &str = "sql";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Nextcloud SQLite database file
    pub database: Option<PathBuf>,
    pub table_prefix: TablePrefix,
    pub sql_debug: bool,
    pub autocomplete_sources: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: None,
            table_prefix: TablePrefix::default(),
            sql_debug: false,
            autocomplete_sources: vec![DEFAULT_AUTOCOMPLETE_SOURCE.to_string()],
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; missing keys keep their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(dsn) = lookup(ENV_DSN) {
            config.database = Some(parse_dsn(&dsn)?);
        }
        if let Some(prefix) = lookup(ENV_TABLE_PREFIX) {
            config.table_prefix = TablePrefix::parse(&prefix)?;
        }
        if let Some(debug) = lookup(ENV_SQL_DEBUG) {
            config.sql_debug = parse_bool(&debug);
        }
        if let Some(sources) = lookup(ENV_AUTOCOMPLETE) {
            config.autocomplete_sources = sources
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }

        Ok(config)
    }
}

/// Accepts `sqlite:///path`, `sqlite:/path` or a bare file path
pub fn parse_dsn(dsn: &str) -> Result<PathBuf> {
    let dsn = dsn.trim();
    let path = if let Some(rest) = dsn.strip_prefix("sqlite://") {
        rest
    } else if let Some(rest) = dsn.strip_prefix("sqlite:") {
        rest
    } else if dsn.contains("://") {
        return Err(Error::UnsupportedDsn(dsn.to_string()));
    } else {
        dsn
    };

    if path.is_empty() {
        return Err(Error::UnsupportedDsn(dsn.to_string()));
    }
    Ok(PathBuf::from(path))
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.table_prefix.as_str(), "oc_");
        assert_eq!(config.autocomplete_sources, vec!["sql"]);
    }

    #[test]
    fn test_from_lookup() {
        let config = Config::from_lookup(lookup(&[
            (ENV_DSN, "sqlite:///var/lib/nextcloud/owncloud.db"),
            (ENV_TABLE_PREFIX, "nc_"),
            (ENV_SQL_DEBUG, "TRUE"),
            (ENV_AUTOCOMPLETE, "sql, ldap,,"),
        ]))
        .unwrap();

        assert_eq!(
            config.database,
            Some(PathBuf::from("/var/lib/nextcloud/owncloud.db"))
        );
        assert_eq!(config.table_prefix.as_str(), "nc_");
        assert!(config.sql_debug);
        assert_eq!(config.autocomplete_sources, vec!["sql", "ldap"]);
    }

    #[test]
    fn test_bad_prefix_rejected() {
        let err = Config::from_lookup(lookup(&[(ENV_TABLE_PREFIX, "oc_;--")])).unwrap_err();
        assert!(matches!(err, Error::InvalidTablePrefix(_)));
    }

    #[test]
    fn test_parse_dsn() {
        assert_eq!(parse_dsn("sqlite:/tmp/nc.db").unwrap(), PathBuf::from("/tmp/nc.db"));
        assert_eq!(parse_dsn("/tmp/nc.db").unwrap(), PathBuf::from("/tmp/nc.db"));
        assert!(matches!(
            parse_dsn("mysql://user:pw@localhost/nextcloud"),
            Err(Error::UnsupportedDsn(_))
        ));
        assert!(parse_dsn("sqlite:").is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("1"));
        assert!(parse_bool(" on "));
        assert!(!parse_bool("0"));
        assert!(!parse_bool("nope"));
    }
}
