//! OVER command (RFC 3977 §8.3)
//!
//! Overview lines for a range of article numbers in the selected group,
//! one tab-separated line per article.

use std::sync::Arc;

use async_trait::async_trait;

use super::{Command, CommandError};
use crate::connection::Connection;
use crate::daemon::ServerContext;
use crate::protocol;

pub struct OverCommand;

/// Parse the range argument: `n`, `n-`, or `n-m`. `None` is a syntax
/// error; an inverted `n-m` range is one too.
fn parse_range(arg: &str) -> Option<(u64, u64)> {
    match arg.split_once('-') {
        Some((first, "")) => {
            let first = first.parse().ok()?;
            Some((first, u64::MAX))
        }
        Some((first, last)) => {
            let first: u64 = first.parse().ok()?;
            let last: u64 = last.parse().ok()?;
            if first > last {
                return None;
            }
            Some((first, last))
        }
        None => {
            let n = arg.parse().ok()?;
            Some((n, n))
        }
    }
}

#[async_trait]
impl Command for OverCommand {
    async fn process_line(
        &mut self,
        conn: &Arc<Connection>,
        ctx: &Arc<ServerContext>,
        line: &str,
    ) -> Result<(), CommandError> {
        let session_state = {
            let session = conn.session();
            (
                session.current_group.clone(),
                session.current_article.as_ref().map(|(n, _)| *n),
            )
        };
        let Some(group) = session_state.0 else {
            conn.println(&protocol::response(
                protocol::NO_GROUP_SELECTED,
                "No newsgroup selected",
            ));
            return Ok(());
        };

        let (first, last) = match line.split_whitespace().nth(1) {
            Some(arg) => match parse_range(arg) {
                Some(range) => range,
                None => {
                    conn.println(&protocol::response(
                        protocol::SYNTAX_ERROR,
                        "Syntax: OVER [range]",
                    ));
                    return Ok(());
                }
            },
            // No argument: the currently selected article.
            None => match session_state.1 {
                Some(n) => (n, n),
                None => {
                    conn.println(&protocol::response(
                        protocol::NO_SUCH_ARTICLE_NUMBER,
                        "No article selected",
                    ));
                    return Ok(());
                }
            },
        };

        let heads = ctx.storage.get_article_heads(&group, first, last).await?;
        if heads.is_empty() {
            conn.println(&protocol::response(
                protocol::NO_SUCH_ARTICLE_NUMBER,
                "No articles in that range",
            ));
            return Ok(());
        }

        conn.println(&protocol::response(
            protocol::OVERVIEW_FOLLOWS,
            "Overview information follows",
        ));
        for head in heads {
            // number, subject, from, date, message-id, references, bytes,
            // lines; fields this backend does not track stay empty.
            conn.println(&format!(
                "{}\t{}\t\t\t{}\t\t\t",
                head.number, head.subject, head.message_id
            ));
        }
        conn.println(protocol::MULTILINE_END);
        Ok(())
    }

    fn has_finished(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_range("3"), Some((3, 3)));
        assert_eq!(parse_range("2-5"), Some((2, 5)));
        assert_eq!(parse_range("7-"), Some((7, u64::MAX)));
        assert_eq!(parse_range("x"), None);
        assert_eq!(parse_range("2-x"), None);
        // Inverted ranges are rejected up front, not passed to storage.
        assert_eq!(parse_range("5-2"), None);
    }
}
