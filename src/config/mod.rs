use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::policy::PolicySet;

/// Top-level configuration from `.sgaudit.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub policy: PolicySet,
}

impl Config {
    /// Load config from a TOML file. Returns default if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Generate a starter config file.
    pub fn starter_toml() -> &'static str {
        r#"# sgaudit configuration

[policy]
# Ports that should never be open to the internet.
# Defaults: SSH, RDP, MySQL, PostgreSQL, MSSQL, MongoDB.
risky_ports = [22, 3389, 3306, 5432, 1433, 27017]

# Treat any CIDR with prefix length 0 as unrestricted, not only the
# literal 0.0.0.0/0 and ::/0 sentinels.
match_zero_prefix = false

# Emit warn findings for non-risky ports open to the internet.
warn_on_open = true
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let config = Config::load(Path::new("/nonexistent/.sgaudit.toml")).unwrap();
        assert_eq!(config.policy, PolicySet::default());
    }

    #[test]
    fn starter_toml_parses_to_defaults() {
        let config: Config = toml::from_str(Config::starter_toml()).unwrap();
        assert_eq!(config.policy, PolicySet::default());
    }

    #[test]
    fn custom_risky_ports_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".sgaudit.toml");
        std::fs::write(&path, "[policy]\nrisky_ports = [23, 8080]\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert!(config.policy.risky_ports.contains(&8080));
        assert!(!config.policy.risky_ports.contains(&22));
        assert!(config.policy.warn_on_open);
    }

    #[test]
    fn bad_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".sgaudit.toml");
        std::fs::write(&path, "[policy\nrisky_ports = oops").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
