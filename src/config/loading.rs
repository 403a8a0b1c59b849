//! Configuration loading from TOML files

use anyhow::Result;

use super::types::{Config, GroupEntry};

/// Load and validate configuration from a TOML file.
pub fn load_config(config_path: &str) -> Result<Config> {
    let content = std::fs::read_to_string(config_path)
        .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", config_path, e))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", config_path, e))?;

    config.validate()?;

    Ok(config)
}

/// A minimal working configuration, written out when none exists yet.
#[must_use]
pub fn create_default_config() -> Config {
    let mut config = Config::default();
    config.groups.push(GroupEntry {
        name: "local.test".to_string(),
        id: 1,
        flags: 0,
    });
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_round_trip() {
        let config = create_default_config();
        let toml_str = toml::to_string_pretty(&config).unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(toml_str.as_bytes()).unwrap();

        let loaded = load_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_full_config() {
        let toml_str = r#"
            storage = "memory"

            [server]
            host = "127.0.0.1"
            port = 2119
            hostname = "news.example.org"
            reader_workers = 4

            [[groups]]
            name = "alt.test"
            id = 1

            [[groups]]
            name = "misc.test"
            id = 2
            flags = 2

            [[subscriptions]]
            host = "peer.example.org"
            port = 119
            group = "alt.test"
        "#;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(toml_str.as_bytes()).unwrap();

        let config = load_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.server.hostname, "news.example.org");
        assert_eq!(config.server.reader_workers, 4);
        assert_eq!(config.groups.len(), 2);
        assert_eq!(config.groups[1].flags, 2);
        assert_eq!(config.subscriptions[0].group, "alt.test");
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(load_config("/no/such/config.toml").is_err());
    }

    #[test]
    fn test_invalid_config_rejected_on_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        // Subscription names a group that is not carried.
        file.write_all(
            br#"
            [[subscriptions]]
            host = "peer.example.org"
            group = "alt.test"
        "#,
        )
        .unwrap();

        assert!(load_config(file.path().to_str().unwrap()).is_err());
    }
}
