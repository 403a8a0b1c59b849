//! Storage collaborator
//!
//! The daemon never interprets storage internals; it only speaks this
//! operation contract. Any call may fail with a recoverable
//! [`StorageError::Transient`], which the dispatcher answers with exactly
//! one re-delivery of the current line (see `connection.rs`).

mod article;
mod group;
mod memory;

pub use article::{Article, header_names};
pub use group::{Group, GroupRegistry, DELETED, MAILINGLIST, READONLY};
pub use memory::MemoryStorage;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

/// Errors from the storage backend.
#[derive(Debug)]
pub enum StorageError {
    /// Recoverable fault; the caller may retry the operation once.
    Transient(String),
    /// Unrecoverable backend failure.
    Backend(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient(msg) => write!(f, "transient storage fault: {}", msg),
            Self::Backend(msg) => write!(f, "storage backend failure: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

impl StorageError {
    /// True when the dispatcher's single-retry policy applies.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Header-only view of a stored article, as returned by overview queries.
#[derive(Debug, Clone)]
pub struct ArticleHead {
    pub number: u64,
    pub message_id: String,
    pub subject: String,
}

/// Article/group CRUD contract the daemon dispatches against.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Fetch an article by number within a group.
    async fn get_article(&self, group_id: i64, number: u64) -> Result<Option<Article>, StorageError>;

    /// Header summaries for the numbered range `[first, last]` of a group.
    async fn get_article_heads(
        &self,
        group: &Group,
        first: u64,
        last: u64,
    ) -> Result<Vec<ArticleHead>, StorageError>;

    /// All article numbers present in a group, ascending.
    async fn get_article_numbers(&self, group_id: i64) -> Result<Vec<u64>, StorageError>;

    /// Lowest article number in a group; 0 when empty.
    async fn get_first_article_number(&self, group: &Group) -> Result<u64, StorageError>;

    /// Highest article number in a group; 0 when empty.
    async fn get_last_article_number(&self, group: &Group) -> Result<u64, StorageError>;

    /// Number of postings currently held for the named group.
    async fn get_postings_count(&self, group_name: &str) -> Result<u64, StorageError>;

    /// The number an article carries within a group, if present there.
    async fn get_article_index(
        &self,
        article: &Article,
        group: &Group,
    ) -> Result<Option<u64>, StorageError>;

    /// Store a newly accepted article under every group it names.
    async fn add_article(
        &self,
        article: &Article,
        groups: &[Arc<Group>],
    ) -> Result<(), StorageError>;
}
