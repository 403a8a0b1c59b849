//! ARTICLE command (RFC 3977 §6.2.1)
//!
//! Retrieval by article number within the currently selected group. With
//! no argument the currently selected article is returned. Body lines
//! beginning with a dot are dot-stuffed on the wire.

use std::sync::Arc;

use async_trait::async_trait;

use super::{Command, CommandError};
use crate::connection::Connection;
use crate::daemon::ServerContext;
use crate::protocol;
use crate::storage::Article;

pub struct ArticleCommand {
    _private: (),
}

impl ArticleCommand {
    #[must_use]
    pub fn new() -> Self {
        Self { _private: () }
    }

    fn send_article(conn: &Arc<Connection>, number: u64, article: &Article) {
        let message_id = article.message_id().unwrap_or("<0>");
        conn.println(&format!(
            "{} {} {} article",
            protocol::ARTICLE_FOLLOWS,
            number,
            message_id
        ));
        for line in article.wire_lines() {
            if line.starts_with('.') {
                conn.println(&format!(".{}", line));
            } else {
                conn.println(&line);
            }
        }
        conn.println(protocol::MULTILINE_END);
    }
}

impl Default for ArticleCommand {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Command for ArticleCommand {
    async fn process_line(
        &mut self,
        conn: &Arc<Connection>,
        ctx: &Arc<ServerContext>,
        line: &str,
    ) -> Result<(), CommandError> {
        let Some(group) = conn.session().current_group.clone() else {
            conn.println(&protocol::response(
                protocol::NO_GROUP_SELECTED,
                "No newsgroup selected",
            ));
            return Ok(());
        };

        let number = match line.split_whitespace().nth(1) {
            Some(arg) => match arg.parse::<u64>() {
                Ok(n) => n,
                Err(_) => {
                    conn.println(&protocol::response(
                        protocol::SYNTAX_ERROR,
                        "Syntax: ARTICLE [number]",
                    ));
                    return Ok(());
                }
            },
            None => {
                // No argument: the currently selected article.
                if let Some((number, article)) = conn.session().current_article.clone() {
                    Self::send_article(conn, number, &article);
                } else {
                    conn.println(&protocol::response(
                        protocol::NO_SUCH_ARTICLE_NUMBER,
                        "No article selected",
                    ));
                }
                return Ok(());
            }
        };

        let Some(article) = ctx.storage.get_article(group.id(), number).await? else {
            conn.println(&protocol::response(
                protocol::NO_SUCH_ARTICLE_NUMBER,
                "No article with that number",
            ));
            return Ok(());
        };

        conn.session().current_article = Some((number, article.clone()));
        Self::send_article(conn, number, &article);
        Ok(())
    }

    fn has_finished(&self) -> bool {
        true
    }
}
