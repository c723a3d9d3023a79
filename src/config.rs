use std::env;
use std::path::PathBuf;

pub const STORE_URL_VAR: &str = "TUTORD_STORE_URL";
pub const STORE_KEY_VAR: &str = "TUTORD_STORE_KEY";

/// Scaffolding templates ship placeholder values; treat them as unset.
const PLACEHOLDER_MARKER: &str = "your-";

#[derive(Debug, Clone)]
pub struct Config {
    pub store_url: Option<String>,
    pub store_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Config {
        Config {
            store_url: read_var(STORE_URL_VAR),
            store_key: read_var(STORE_KEY_VAR),
        }
    }

    /// Both values must be present and real. Anything less puts the daemon
    /// in degraded mode instead of crashing.
    pub fn is_configured(&self) -> bool {
        self.store_url.is_some() && self.store_key.is_some()
    }

    /// Store location with an optional `sqlite://` scheme stripped.
    pub fn store_path(&self) -> Option<PathBuf> {
        let url = self.store_url.as_deref()?;
        let path = url.strip_prefix("sqlite://").unwrap_or(url);
        Some(PathBuf::from(path))
    }
}

fn read_var(name: &str) -> Option<String> {
    let value = env::var(name).ok()?;
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.contains(PLACEHOLDER_MARKER) {
        return None;
    }
    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_values_count_as_unconfigured() {
        let cfg = Config {
            store_url: None,
            store_key: None,
        };
        assert!(!cfg.is_configured());

        let cfg = Config {
            store_url: Some("sqlite:///tmp/tutor.sqlite3".into()),
            store_key: None,
        };
        assert!(!cfg.is_configured());

        let cfg = Config {
            store_url: Some("sqlite:///tmp/tutor.sqlite3".into()),
            store_key: Some("public-anon-key".into()),
        };
        assert!(cfg.is_configured());
    }

    #[test]
    fn store_path_strips_sqlite_scheme() {
        let cfg = Config {
            store_url: Some("sqlite:///tmp/tutor.sqlite3".into()),
            store_key: Some("k".into()),
        };
        assert_eq!(
            cfg.store_path(),
            Some(PathBuf::from("/tmp/tutor.sqlite3"))
        );

        let cfg = Config {
            store_url: Some("/tmp/plain-path.sqlite3".into()),
            store_key: Some("k".into()),
        };
        assert_eq!(cfg.store_path(), Some(PathBuf::from("/tmp/plain-path.sqlite3")));
    }
}
