//! Runtime configuration from environment variables.

use crate::models::OperatorId;
use std::collections::HashSet;
use std::time::Duration;

/// Server and console settings. Every field has a default so the binary starts bare.
#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// SQLite file holding cards and players.
    pub database_path: String,
    /// Chat user ids allowed into the admin console.
    pub admin_ids: HashSet<OperatorId>,
    /// Control sessions and dialogues idle this long are dropped.
    pub session_timeout: Duration,
    /// How often the reaper runs.
    pub reap_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_path: "roster.db".to_string(),
            admin_ids: HashSet::new(),
            session_timeout: Duration::from_secs(30 * 60),
            reap_interval: Duration::from_secs(5 * 60),
        }
    }
}

/// Comma-separated ids; blanks and unparsable entries are skipped with a warning.
pub fn parse_admin_ids(raw: &str) -> HashSet<OperatorId> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse() {
            Ok(id) => Some(id),
            Err(_) => {
                log::warn!("Ignoring invalid admin id {:?}", s);
                None
            }
        })
        .collect()
}

/// Whole seconds, at least one. Anything else is ignored with a warning.
fn parse_secs(key: &str, raw: &str) -> Option<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
        _ => {
            log::warn!("Ignoring {}={:?}: expected a positive number of seconds", key, raw);
            None
        }
    }
}

fn env_secs(key: &str) -> Option<Duration> {
    std::env::var(key).ok().and_then(|raw| parse_secs(key, &raw))
}

impl Config {
    /// Read HOST, PORT, DATABASE_PATH, ADMIN_IDS, SESSION_TIMEOUT_SECS, REAP_INTERVAL_SECS.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            database_path: std::env::var("DATABASE_PATH").unwrap_or(defaults.database_path),
            admin_ids: std::env::var("ADMIN_IDS")
                .map(|raw| parse_admin_ids(&raw))
                .unwrap_or(defaults.admin_ids),
            session_timeout: env_secs("SESSION_TIMEOUT_SECS").unwrap_or(defaults.session_timeout),
            reap_interval: env_secs("REAP_INTERVAL_SECS").unwrap_or(defaults.reap_interval),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_ids_skip_garbage() {
        let ids = parse_admin_ids(" 42, ,abc,7 ");
        assert_eq!(ids, HashSet::from([42, 7]));
    }

    #[test]
    fn durations_must_be_positive() {
        assert_eq!(
            parse_secs("REAP_INTERVAL_SECS", " 90 "),
            Some(Duration::from_secs(90))
        );
        assert_eq!(parse_secs("REAP_INTERVAL_SECS", "0"), None);
        assert_eq!(parse_secs("SESSION_TIMEOUT_SECS", "-5"), None);
        assert_eq!(parse_secs("SESSION_TIMEOUT_SECS", "soon"), None);
    }
}
