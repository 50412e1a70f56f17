use std::env;
use std::time::Duration;

use crate::fields::FieldPreference;

/// Environment variables the binary understands. The launcher workflow sets
/// these as workflow variables; anything unset falls back to `defaults`.
pub mod env_vars {
    pub const ANKI_CONNECT_URL: &str = "ANKI_CONNECT_URL";
    pub const FRONT_FIELDS: &str = "FRONT_FIELDS";
    pub const BACK_FIELDS: &str = "BACK_FIELDS";
    pub const ANKI_TIMEOUT_MS: &str = "ANKI_TIMEOUT_MS";
}

pub mod defaults {
    pub const ANKI_CONNECT_URL: &str = "http://localhost:8765";
    pub const FRONT_FIELDS: &str = "Front,entry";
    pub const BACK_FIELDS: &str = "Back,Tags,definition";
    pub const TIMEOUT_MS: u64 = 5_000;
}

/// Runtime configuration, read once per invocation and threaded explicitly
/// through the pipeline.
#[derive(Debug, Clone)]
pub struct Config {
    pub connect_url: String,
    pub prefs: FieldPreference,
    pub timeout: Duration,
}

impl Config {
    /// Never fails: unset or unparsable variables fall back to defaults.
    pub fn from_env() -> Self {
        let connect_url = env::var(env_vars::ANKI_CONNECT_URL)
            .unwrap_or_else(|_| defaults::ANKI_CONNECT_URL.to_string());
        let front = split_fields(
            &env::var(env_vars::FRONT_FIELDS)
                .unwrap_or_else(|_| defaults::FRONT_FIELDS.to_string()),
        );
        let back = split_fields(
            &env::var(env_vars::BACK_FIELDS)
                .unwrap_or_else(|_| defaults::BACK_FIELDS.to_string()),
        );
        let timeout_ms = env::var(env_vars::ANKI_TIMEOUT_MS)
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(defaults::TIMEOUT_MS);

        Self {
            connect_url,
            prefs: FieldPreference::new(front, back),
            timeout: Duration::from_millis(timeout_ms),
        }
    }
}

/// Split a comma-separated field list, trimming entries and dropping
/// empties.
fn split_fields(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_fields_trims_and_drops_empties() {
        assert_eq!(split_fields("Front, entry , "), vec!["Front", "entry"]);
        assert_eq!(split_fields("Back"), vec!["Back"]);
        assert!(split_fields("").is_empty());
    }
}
