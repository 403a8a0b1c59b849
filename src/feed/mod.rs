//! Feed pipeline: push propagation of accepted articles to peer servers
//!
//! Article acceptance and peer propagation are decoupled by an unbounded
//! queue owned by one dedicated worker. The worker sleeps while the queue
//! is empty and drains one article at a time in enqueue order. Delivery is
//! best-effort: a failed peer is logged and never aborts the remaining
//! peers or articles, and there is no pipeline-level retry — the next
//! naturally occurring post is the retry.

mod client;

pub use client::{push_article, FeedError};

use std::sync::Arc;

use crossbeam::queue::SegQueue;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::config::SubscriptionConfig;
use crate::storage::{header_names, Article};

/// Headers that are local to this server and must not travel to peers.
const STRIPPED_HEADERS: &[&str] = &[
    header_names::NNTP_POSTING_DATE,
    header_names::NNTP_POSTING_HOST,
    header_names::X_COMPLAINTS_TO,
    header_names::X_TRACE,
    header_names::XREF,
];

/// One outbound feed target. Many subscriptions may share a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub host: String,
    pub port: u16,
    pub group: String,
}

impl From<SubscriptionConfig> for Subscription {
    fn from(config: SubscriptionConfig) -> Self {
        Self {
            host: config.host,
            port: config.port,
            group: config.group,
        }
    }
}

/// Why an article is or is not pushed to a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedDecision {
    Deliver,
    /// The routing path already names the peer host; sending it back would
    /// create a propagation loop.
    SkipLoop,
    /// The article's newsgroups do not include the subscribed group.
    SkipGroup,
}

/// Decide whether `article` should be pushed to `sub`. The loop check wins
/// over group matching: an article is never sent back toward a server it
/// already passed through.
#[must_use]
pub fn decide(article: &Article, sub: &Subscription) -> FeedDecision {
    let path = article.header(header_names::PATH).unwrap_or("");
    if path.contains(&sub.host) {
        return FeedDecision::SkipLoop;
    }
    if article.newsgroups().iter().any(|g| g == &sub.group) {
        FeedDecision::Deliver
    } else {
        FeedDecision::SkipGroup
    }
}

/// Thread-safe unbounded queue of accepted articles awaiting propagation.
#[derive(Debug, Default)]
pub struct FeedQueue {
    queue: SegQueue<Article>,
    notify: Notify,
}

impl FeedQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an article for pushing and wake the feed worker.
    pub fn enqueue(&self, article: Article) {
        self.queue.push(article);
        self.notify.notify_one();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Start the dedicated feed worker.
pub fn spawn_feeder(
    queue: Arc<FeedQueue>,
    subscriptions: Vec<Subscription>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let Some(article) = queue.queue.pop() else {
                queue.notify.notified().await;
                continue;
            };
            feed_one(&article, &subscriptions).await;
        }
    })
}

/// Push one article to every matching subscription. Faults are logged and
/// isolated to the single (peer, article) attempt.
async fn feed_one(article: &Article, subscriptions: &[Subscription]) {
    let message_id = article.message_id().unwrap_or("<?>").to_string();
    info!("feeding {}", message_id);

    for sub in subscriptions {
        match decide(article, sub) {
            FeedDecision::SkipLoop => {
                info!("{} skipped for host {} (already in path)", message_id, sub.host);
                continue;
            }
            FeedDecision::SkipGroup => {
                debug!(
                    "{} not in group {} for {}",
                    message_id, sub.group, sub.host
                );
                continue;
            }
            FeedDecision::Deliver => {}
        }

        let mut copy = article.clone();
        for header in STRIPPED_HEADERS {
            copy.remove_header(header);
        }

        if let Err(e) = push_article(&copy, &sub.host, sub.port).await {
            warn!("failed to push {} to {}:{}: {}", message_id, sub.host, sub.port, e);
        } else {
            debug!("pushed {} to {}:{}", message_id, sub.host, sub.port);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(path: &str, newsgroups: &str) -> Article {
        let mut a = Article::new();
        a.add_header(header_names::PATH, path);
        a.add_header(header_names::NEWSGROUPS, newsgroups);
        a.add_header(header_names::MESSAGE_ID, "<t@test>");
        a
    }

    fn sub(host: &str, group: &str) -> Subscription {
        Subscription {
            host: host.to_string(),
            port: 119,
            group: group.to_string(),
        }
    }

    #[test]
    fn test_loop_prevention_beats_group_match() {
        let a = article("peerA.example.org!origin", "alt.test");
        assert_eq!(
            decide(&a, &sub("peerA.example.org", "alt.test")),
            FeedDecision::SkipLoop
        );
    }

    #[test]
    fn test_group_routing() {
        let a = article("origin", "alt.test,misc.test");
        assert_eq!(
            decide(&a, &sub("peerB.example.org", "alt.test")),
            FeedDecision::Deliver
        );
        assert_eq!(
            decide(&a, &sub("peerC.example.org", "misc.other")),
            FeedDecision::SkipGroup
        );
    }

    #[test]
    fn test_missing_path_header_still_delivers() {
        let mut a = Article::new();
        a.add_header(header_names::NEWSGROUPS, "alt.test");
        assert_eq!(
            decide(&a, &sub("peerB.example.org", "alt.test")),
            FeedDecision::Deliver
        );
    }

    #[test]
    fn test_stripped_header_list_matches_policy() {
        let mut a = article("origin", "alt.test");
        for h in STRIPPED_HEADERS {
            a.add_header(*h, "value");
        }
        let mut copy = a.clone();
        for h in STRIPPED_HEADERS {
            copy.remove_header(h);
        }
        for h in STRIPPED_HEADERS {
            assert!(copy.header(h).is_none());
        }
        // Non-local headers survive.
        assert!(copy.header(header_names::NEWSGROUPS).is_some());
    }

    #[test]
    fn test_queue_preserves_enqueue_order() {
        let queue = FeedQueue::new();
        queue.enqueue(article("a", "alt.test"));
        queue.enqueue(article("b", "alt.test"));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.queue.pop().unwrap().header(header_names::PATH), Some("a"));
        assert_eq!(queue.queue.pop().unwrap().header(header_names::PATH), Some("b"));
    }
}
