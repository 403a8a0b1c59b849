//! In-memory storage backend
//!
//! The default provider for small installations and the backend used by
//! the test suite. Articles live in per-group BTreeMaps keyed by article
//! number. A fault hook lets tests inject transient storage faults to
//! exercise the dispatcher's single-retry policy.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::{header_names, Article, ArticleHead, Group, Storage, StorageError};

#[derive(Default)]
struct GroupArticles {
    by_number: BTreeMap<u64, Article>,
    next_number: u64,
}

/// Memory-backed [`Storage`] implementation.
#[derive(Default)]
pub struct MemoryStorage {
    groups: RwLock<HashMap<i64, GroupArticles>>,
    /// Name to id mapping, learned as articles arrive. The postings-count
    /// operation is keyed by name for parity with SQL backends.
    names: RwLock<HashMap<String, i64>>,
    /// Remaining calls that should fail with a transient fault.
    fault_budget: AtomicU32,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make the next `n` storage calls fail with a transient fault.
    pub fn inject_transient_faults(&self, n: u32) {
        self.fault_budget.store(n, Ordering::SeqCst);
    }

    fn check_fault(&self) -> Result<(), StorageError> {
        let mut budget = self.fault_budget.load(Ordering::SeqCst);
        while budget > 0 {
            match self.fault_budget.compare_exchange(
                budget,
                budget - 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return Err(StorageError::Transient("injected fault".into())),
                Err(actual) => budget = actual,
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_article(
        &self,
        group_id: i64,
        number: u64,
    ) -> Result<Option<Article>, StorageError> {
        self.check_fault()?;
        let groups = self.groups.read().expect("storage lock poisoned");
        Ok(groups
            .get(&group_id)
            .and_then(|g| g.by_number.get(&number))
            .cloned())
    }

    async fn get_article_heads(
        &self,
        group: &Group,
        first: u64,
        last: u64,
    ) -> Result<Vec<ArticleHead>, StorageError> {
        self.check_fault()?;
        // BTreeMap::range panics on an inverted bound.
        if first > last {
            return Ok(Vec::new());
        }
        let groups = self.groups.read().expect("storage lock poisoned");
        let Some(articles) = groups.get(&group.id()) else {
            return Ok(Vec::new());
        };
        Ok(articles
            .by_number
            .range(first..=last)
            .map(|(&number, article)| ArticleHead {
                number,
                message_id: article.message_id().unwrap_or_default().to_string(),
                subject: article
                    .header(header_names::SUBJECT)
                    .unwrap_or_default()
                    .to_string(),
            })
            .collect())
    }

    async fn get_article_numbers(&self, group_id: i64) -> Result<Vec<u64>, StorageError> {
        self.check_fault()?;
        let groups = self.groups.read().expect("storage lock poisoned");
        Ok(groups
            .get(&group_id)
            .map(|g| g.by_number.keys().copied().collect())
            .unwrap_or_default())
    }

    async fn get_first_article_number(&self, group: &Group) -> Result<u64, StorageError> {
        self.check_fault()?;
        let groups = self.groups.read().expect("storage lock poisoned");
        Ok(groups
            .get(&group.id())
            .and_then(|g| g.by_number.keys().next().copied())
            .unwrap_or(0))
    }

    async fn get_last_article_number(&self, group: &Group) -> Result<u64, StorageError> {
        self.check_fault()?;
        let groups = self.groups.read().expect("storage lock poisoned");
        Ok(groups
            .get(&group.id())
            .and_then(|g| g.by_number.keys().next_back().copied())
            .unwrap_or(0))
    }

    async fn get_postings_count(&self, group_name: &str) -> Result<u64, StorageError> {
        self.check_fault()?;
        let names = self.names.read().expect("storage lock poisoned");
        let Some(&id) = names.get(group_name) else {
            return Ok(0);
        };
        let groups = self.groups.read().expect("storage lock poisoned");
        Ok(groups
            .get(&id)
            .map(|g| g.by_number.len() as u64)
            .unwrap_or(0))
    }

    async fn get_article_index(
        &self,
        article: &Article,
        group: &Group,
    ) -> Result<Option<u64>, StorageError> {
        self.check_fault()?;
        let Some(message_id) = article.message_id() else {
            return Ok(None);
        };
        let groups = self.groups.read().expect("storage lock poisoned");
        Ok(groups.get(&group.id()).and_then(|g| {
            g.by_number
                .iter()
                .find(|(_, a)| a.message_id() == Some(message_id))
                .map(|(&n, _)| n)
        }))
    }

    async fn add_article(
        &self,
        article: &Article,
        groups: &[Arc<Group>],
    ) -> Result<(), StorageError> {
        self.check_fault()?;
        {
            let mut names = self.names.write().expect("storage lock poisoned");
            for group in groups {
                names.insert(group.name().to_string(), group.id());
            }
        }
        let mut map = self.groups.write().expect("storage lock poisoned");
        for group in groups {
            let entry = map.entry(group.id()).or_default();
            entry.next_number += 1;
            entry.by_number.insert(entry.next_number, article.clone());
        }
        Ok(())
    }
}
