//! Configuration validation

use anyhow::{bail, Result};

use super::types::Config;

impl Config {
    /// Validate the loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero port or worker count, duplicate or
    /// invalid group entries, or a subscription naming a group this server
    /// does not carry.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            bail!("server.port must be non-zero");
        }
        if self.server.reader_workers == 0 {
            bail!("server.reader_workers must be at least 1");
        }
        if self.server.hostname.is_empty() {
            bail!("server.hostname must not be empty");
        }

        let mut seen_names = std::collections::HashSet::new();
        let mut seen_ids = std::collections::HashSet::new();
        for group in &self.groups {
            if group.name.is_empty() {
                bail!("group name must not be empty");
            }
            if group.id <= 0 {
                bail!("group '{}' has non-positive id {}", group.name, group.id);
            }
            if !seen_names.insert(&group.name) {
                bail!("duplicate group name '{}'", group.name);
            }
            if !seen_ids.insert(group.id) {
                bail!("duplicate group id {} ('{}')", group.id, group.name);
            }
        }

        for sub in &self.subscriptions {
            if sub.host.is_empty() {
                bail!("subscription host must not be empty");
            }
            if sub.port == 0 {
                bail!("subscription to '{}' has port 0", sub.host);
            }
            if !self.groups.iter().any(|g| g.name == sub.group) {
                bail!(
                    "subscription for '{}' names unknown group '{}'",
                    sub.host,
                    sub.group
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::types::{GroupEntry, SubscriptionConfig};
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.groups.push(GroupEntry {
            name: "alt.test".to_string(),
            id: 1,
            flags: 0,
        });
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_zero_port_rejected() {
        let mut config = valid_config();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = valid_config();
        config.server.reader_workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_group_rejected() {
        let mut config = valid_config();
        config.groups.push(GroupEntry {
            name: "alt.test".to_string(),
            id: 2,
            flags: 0,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_subscription_unknown_group_rejected() {
        let mut config = valid_config();
        config.subscriptions.push(SubscriptionConfig {
            host: "peer.example.org".to_string(),
            port: 119,
            group: "no.such.group".to_string(),
        });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("no.such.group"));
    }
}
