//! POST command (RFC 3977 §6.3.1)
//!
//! The one stateful command in the catalog: after the `340` continuation
//! the handler stays bound and accumulates header and body lines until the
//! client sends the lone terminating dot. The accepted article is stored
//! and handed to the feed pipeline for peer propagation.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tracing::info;

use super::{Command, CommandError};
use crate::connection::Connection;
use crate::daemon::ServerContext;
use crate::protocol;
use crate::storage::{header_names, Article};

enum PostState {
    /// Waiting for the POST verb line itself.
    AwaitingVerb,
    /// Collecting header lines until the blank separator.
    Headers,
    /// Collecting body lines until the lone dot.
    Body,
    Done,
}

pub struct PostCommand {
    state: PostState,
    article: Article,
}

impl PostCommand {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: PostState::AwaitingVerb,
            article: Article::new(),
        }
    }

    fn append_header_line(&mut self, line: &str) {
        // Folded continuation lines belong to the previous header.
        if line.starts_with(' ') || line.starts_with('\t') {
            let folded: Option<(String, String)> = self
                .article
                .headers()
                .last()
                .map(|(n, v)| (n.to_string(), format!("{} {}", v, line.trim())));
            if let Some((name, value)) = folded {
                self.article.set_header(&name, value);
            }
            return;
        }
        if let Some((name, value)) = line.split_once(':') {
            self.article.add_header(name.trim(), value.trim());
        }
        // A malformed header line is silently skipped, matching the
        // permissive handling of real-world clients.
    }

    async fn finalize(
        &mut self,
        conn: &Arc<Connection>,
        ctx: &Arc<ServerContext>,
    ) -> Result<(), CommandError> {
        // Every article needs a globally unique message id; supply one for
        // clients that left it out.
        if self.article.message_id().is_none() {
            let nanos = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0);
            self.article.set_header(
                header_names::MESSAGE_ID,
                format!("<{}.{}@{}>", nanos, conn.id(), ctx.hostname),
            );
        }

        // Record this hop in the routing path. Skipped when already
        // recorded, so a re-delivered terminator finalizes the identical
        // article.
        let hop = format!("{}!", ctx.hostname);
        let path = match self.article.header(header_names::PATH) {
            Some(existing) if existing.starts_with(&hop) => None,
            Some(existing) => Some(format!("{}{}", hop, existing)),
            None => Some(format!("{}not-for-mail", hop)),
        };
        if let Some(path) = path {
            self.article.set_header(header_names::PATH, path);
        }

        let groups: Vec<_> = self
            .article
            .newsgroups()
            .iter()
            .filter_map(|name| ctx.groups.get(name))
            .filter(|g| g.is_writeable())
            .collect();

        if groups.is_empty() {
            conn.println(&protocol::response(
                protocol::POSTING_FAILED,
                "Posting failed (no such group)",
            ));
            return Ok(());
        }

        ctx.storage.add_article(&self.article, &groups).await?;
        info!(
            "accepted article {} for {} group(s)",
            self.article.message_id().unwrap_or("<?>"),
            groups.len()
        );

        if let Some(feed) = &ctx.feed {
            feed.enqueue(self.article.clone());
        }

        conn.println(&protocol::response(
            protocol::ARTICLE_POSTED,
            "Article received",
        ));
        Ok(())
    }
}

impl Default for PostCommand {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Command for PostCommand {
    async fn process_line(
        &mut self,
        conn: &Arc<Connection>,
        ctx: &Arc<ServerContext>,
        line: &str,
    ) -> Result<(), CommandError> {
        match self.state {
            PostState::AwaitingVerb => {
                self.state = PostState::Headers;
                conn.println(&protocol::response(
                    protocol::SEND_ARTICLE_POST,
                    "Send article to be posted. End with <CR-LF>.<CR-LF>",
                ));
            }
            PostState::Headers => {
                if line == protocol::MULTILINE_END {
                    // Advance only on success: a transient storage fault
                    // leaves the state intact so the re-delivered
                    // terminator line runs finalize again.
                    self.finalize(conn, ctx).await?;
                    self.state = PostState::Done;
                    return Ok(());
                }
                if line.is_empty() {
                    self.state = PostState::Body;
                } else {
                    self.append_header_line(line);
                }
            }
            PostState::Body => {
                if line == protocol::MULTILINE_END {
                    self.finalize(conn, ctx).await?;
                    self.state = PostState::Done;
                    return Ok(());
                }
                // Undo dot-stuffing applied by the client.
                let line = line.strip_prefix('.').map_or(line, |rest| rest);
                self.article.push_body_line(line);
            }
            PostState::Done => {}
        }
        Ok(())
    }

    fn has_finished(&self) -> bool {
        matches!(self.state, PostState::Done)
    }

    fn is_stateful(&self) -> bool {
        true
    }
}
