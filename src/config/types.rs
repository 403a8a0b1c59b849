//! Configuration type definitions

use serde::{Deserialize, Serialize};

use super::defaults;

/// Storage provider selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    /// In-process memory backend, the default for small installations.
    #[default]
    Memory,
}

/// Main daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    /// Listener and identity settings.
    #[serde(default)]
    pub server: ServerSettings,
    /// Storage provider selector.
    #[serde(default)]
    pub storage: StorageProvider,
    /// Newsgroups this server carries.
    #[serde(default)]
    pub groups: Vec<GroupEntry>,
    /// Outbound feed subscriptions.
    #[serde(default)]
    pub subscriptions: Vec<SubscriptionConfig>,
}

/// Listener and identity settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerSettings {
    /// Host/IP to bind to (default: 0.0.0.0)
    pub host: String,
    /// Port to listen on (default: 1119; the privileged 119 needs root)
    pub port: u16,
    /// This server's name, recorded in Path headers and used by peers'
    /// propagation loop checks.
    pub hostname: String,
    /// Number of reader worker tasks sharing the ready queue.
    pub reader_workers: usize,
    /// Close connections with no traffic for this many seconds.
    /// 0 disables the sweep.
    pub idle_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: defaults::host(),
            port: defaults::port(),
            hostname: defaults::hostname(),
            reader_workers: defaults::reader_workers(),
            idle_timeout_secs: defaults::idle_timeout_secs(),
        }
    }
}

/// One newsgroup: `name id flags`, mirroring the classic groups.conf line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupEntry {
    pub name: String,
    pub id: i64,
    /// Bit flags: 0x1 mailing list, 0x2 read-only, 0x80 deleted.
    #[serde(default)]
    pub flags: u32,
}

/// One outbound feed target: articles posted to `group` are pushed to
/// `host:port`. Many subscriptions may share a host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubscriptionConfig {
    pub host: String,
    #[serde(default = "defaults::nntp_port")]
    pub port: u16,
    pub group: String,
}

impl Config {
    /// Formatted listen address, e.g. `0.0.0.0:1119`.
    #[must_use]
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
