//! Connection registry
//!
//! Maps the identity of an active socket to its [`Connection`] so reader
//! workers can look up per-connection state for a ready socket. Safe for
//! concurrent lookups from any worker.

use std::sync::Arc;

use dashmap::DashMap;

use crate::connection::{ConnId, Connection};

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: DashMap<ConnId, Arc<Connection>>,
}

impl ConnectionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, conn: Arc<Connection>) {
        self.connections.insert(conn.id(), conn);
    }

    #[must_use]
    pub fn get(&self, id: ConnId) -> Option<Arc<Connection>> {
        self.connections.get(&id).map(|entry| Arc::clone(&entry))
    }

    pub fn remove(&self, id: ConnId) {
        self.connections.remove(&id);
    }

    /// All currently registered connections, for periodic sweeps. The
    /// snapshot is a point-in-time copy; entries may close concurrently.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<Connection>> {
        self.connections
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
