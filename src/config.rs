use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

const CONFIG_FILE: &str = "config.yaml";
const BIND_ENV: &str = "NOTEMATE_BIND";

/// Project configuration, stored as `.notemate/config.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotemateConfig {
    /// Address the HTTP server binds to.
    pub bind: String,
    /// Debounce window for client reorder calls, in milliseconds.
    pub debounce_ms: u64,
    /// Bearer token -> owner.
    pub tokens: HashMap<String, String>,
}

impl Default for NotemateConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
            debounce_ms: 500,
            tokens: HashMap::new(),
        }
    }
}

impl NotemateConfig {
    /// Load for running the server: the file plus environment overrides.
    /// `NOTEMATE_BIND` overrides the bind address.
    pub fn load(notemate_dir: &Path) -> Result<Self> {
        let mut config = Self::load_file(notemate_dir)?;
        config.apply_overrides(std::env::var(BIND_ENV).ok());
        Ok(config)
    }

    /// Exactly what the file says, defaults for missing keys. Use this when
    /// the config will be saved back.
    pub fn load_file(notemate_dir: &Path) -> Result<Self> {
        let path = notemate_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(&fs::read_to_string(&path)?)?)
    }

    fn apply_overrides(&mut self, bind: Option<String>) {
        if let Some(bind) = bind.filter(|b| !b.trim().is_empty()) {
            self.bind = bind;
        }
    }

    pub fn save(&self, notemate_dir: &Path) -> Result<()> {
        fs::write(notemate_dir.join(CONFIG_FILE), serde_yaml::to_string(self)?)?;
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Owner a bearer token belongs to, if any.
    pub fn owner_for_token(&self, token: &str) -> Option<&str> {
        self.tokens.get(token).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = NotemateConfig::default();
        assert_eq!(config.bind, "127.0.0.1:5000");
        assert_eq!(config.debounce(), Duration::from_millis(500));
        assert!(config.tokens.is_empty());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = NotemateConfig::load(tmp.path()).unwrap();
        assert_eq!(config.debounce_ms, 500);
    }

    #[test]
    fn test_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let mut config = NotemateConfig::default();
        config.debounce_ms = 250;
        config.tokens.insert("secret".to_string(), "alice".to_string());
        config.save(tmp.path()).unwrap();

        let loaded = NotemateConfig::load(tmp.path()).unwrap();
        assert_eq!(loaded.debounce_ms, 250);
        assert_eq!(loaded.owner_for_token("secret"), Some("alice"));
        assert_eq!(loaded.owner_for_token("other"), None);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "debounce_ms: 100\n").unwrap();
        let loaded = NotemateConfig::load(tmp.path()).unwrap();
        assert_eq!(loaded.debounce_ms, 100);
        assert!(loaded.tokens.is_empty());
    }

    #[test]
    fn test_bind_override_is_not_persisted() {
        let tmp = TempDir::new().unwrap();
        NotemateConfig::default().save(tmp.path()).unwrap();

        let mut config = NotemateConfig::load_file(tmp.path()).unwrap();
        config.apply_overrides(Some("0.0.0.0:9000".to_string()));
        assert_eq!(config.bind, "0.0.0.0:9000");

        // Saving goes through load_file, which never sees the override.
        let mut editable = NotemateConfig::load_file(tmp.path()).unwrap();
        editable.tokens.insert("t".to_string(), "alice".to_string());
        editable.save(tmp.path()).unwrap();

        let reloaded = NotemateConfig::load_file(tmp.path()).unwrap();
        assert_eq!(reloaded.bind, "127.0.0.1:5000");
        assert_eq!(reloaded.owner_for_token("t"), Some("alice"));
    }

    #[test]
    fn test_blank_override_ignored() {
        let mut config = NotemateConfig::default();
        config.apply_overrides(Some("  ".to_string()));
        assert_eq!(config.bind, "127.0.0.1:5000");
        config.apply_overrides(None);
        assert_eq!(config.bind, "127.0.0.1:5000");
    }
}
