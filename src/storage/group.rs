//! Newsgroups and the process-wide group registry
//!
//! The registry is constructed once at startup from the configuration and
//! injected wherever group lookups are needed. Deletion is a flag update:
//! a DELETED group disappears from every enumeration but stays in the map,
//! physical removal being a collaborator's job.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Group is a mirror of a mailing list; postings go through the gateway.
pub const MAILINGLIST: u32 = 0x1;
/// Posting to the group is prohibited (one-way sync).
pub const READONLY: u32 = 0x2;
/// Group is logically deleted and must not occur in any output.
pub const DELETED: u32 = 0x80;

/// A logical newsgroup served by this daemon.
#[derive(Debug)]
pub struct Group {
    name: String,
    id: i64,
    flags: AtomicU32,
}

impl Group {
    #[must_use]
    pub fn new(name: impl Into<String>, id: i64, flags: u32) -> Self {
        Self {
            name: name.into(),
            id,
            flags: AtomicU32::new(flags),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn id(&self) -> i64 {
        self.id
    }

    #[must_use]
    pub fn flags(&self) -> u32 {
        self.flags.load(Ordering::Acquire)
    }

    /// Set a flag in place (administrative operation).
    pub fn set_flag(&self, flag: u32) {
        self.flags.fetch_or(flag, Ordering::AcqRel);
    }

    /// Clear a flag in place.
    pub fn unset_flag(&self, flag: u32) {
        self.flags.fetch_and(!flag, Ordering::AcqRel);
    }

    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.flags() & DELETED != 0
    }

    #[must_use]
    pub fn is_mailing_list(&self) -> bool {
        self.flags() & MAILINGLIST != 0
    }

    #[must_use]
    pub fn is_writeable(&self) -> bool {
        self.flags() & (READONLY | DELETED) == 0
    }
}

impl PartialEq for Group {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Group {}

/// Registry of every group this server handles, keyed by name.
#[derive(Debug, Default)]
pub struct GroupRegistry {
    groups: HashMap<String, Arc<Group>>,
}

impl GroupRegistry {
    /// Build the registry from `(name, id, flags)` triples, typically the
    /// configuration collaborator's group list.
    #[must_use]
    pub fn from_triples<I, S>(triples: I) -> Self
    where
        I: IntoIterator<Item = (S, i64, u32)>,
        S: Into<String>,
    {
        let mut groups = HashMap::new();
        for (name, id, flags) in triples {
            let name = name.into();
            groups.insert(name.clone(), Arc::new(Group::new(name, id, flags)));
        }
        Self { groups }
    }

    /// Look up a group that is visible to clients. Deleted groups resolve
    /// to `None` just like unknown names.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<Group>> {
        self.groups
            .get(name)
            .filter(|g| !g.is_deleted())
            .cloned()
    }

    /// Look up a group regardless of its DELETED flag (administrative use).
    #[must_use]
    pub fn get_any(&self, name: &str) -> Option<Arc<Group>> {
        self.groups.get(name).cloned()
    }

    /// Every visible group, sorted by name for deterministic listings.
    #[must_use]
    pub fn all(&self) -> Vec<Arc<Group>> {
        let mut visible: Vec<_> = self
            .groups
            .values()
            .filter(|g| !g.is_deleted())
            .cloned()
            .collect();
        visible.sort_by(|a, b| a.name().cmp(b.name()));
        visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> GroupRegistry {
        GroupRegistry::from_triples(vec![
            ("alt.test", 1, 0),
            ("misc.test", 2, READONLY),
            ("alt.gone", 3, DELETED),
        ])
    }

    #[test]
    fn test_lookup_and_flags() {
        let reg = registry();
        let g = reg.get("alt.test").unwrap();
        assert_eq!(g.id(), 1);
        assert!(g.is_writeable());

        let ro = reg.get("misc.test").unwrap();
        assert!(!ro.is_writeable());
        assert!(!ro.is_deleted());
    }

    #[test]
    fn test_deleted_group_hidden_but_retained() {
        let reg = registry();
        assert!(reg.get("alt.gone").is_none());
        assert!(reg.get_any("alt.gone").is_some());

        let names: Vec<_> = reg.all().iter().map(|g| g.name().to_string()).collect();
        assert_eq!(names, vec!["alt.test", "misc.test"]);
    }

    #[test]
    fn test_flag_mutation_in_place() {
        let reg = registry();
        let g = reg.get("alt.test").unwrap();
        g.set_flag(DELETED);
        assert!(g.is_deleted());
        // Enumeration reflects the flag immediately.
        assert!(reg.get("alt.test").is_none());
        g.unset_flag(DELETED);
        assert!(reg.get("alt.test").is_some());
    }

    #[test]
    fn test_groups_equal_by_id() {
        let a = Group::new("one.name", 7, 0);
        let b = Group::new("other.name", 7, READONLY);
        assert_eq!(a, b);
    }
}
