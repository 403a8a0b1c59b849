//! LIST command (RFC 3977 §7.6.1)
//!
//! Enumerates the visible newsgroups as `name last first status` lines.
//! Groups flagged DELETED are excluded from the listing.

use std::sync::Arc;

use async_trait::async_trait;

use super::{Command, CommandError};
use crate::connection::Connection;
use crate::daemon::ServerContext;
use crate::protocol;

pub struct ListCommand;

#[async_trait]
impl Command for ListCommand {
    async fn process_line(
        &mut self,
        conn: &Arc<Connection>,
        ctx: &Arc<ServerContext>,
        _line: &str,
    ) -> Result<(), CommandError> {
        // Query storage for every group before emitting the first line, so
        // a fault cannot leave a half-written multi-line block behind.
        let mut rows = Vec::new();
        for group in ctx.groups.all() {
            let first = ctx.storage.get_first_article_number(&group).await?;
            let last = ctx.storage.get_last_article_number(&group).await?;
            let status = if group.is_writeable() { 'y' } else { 'n' };
            rows.push(format!("{} {} {} {}", group.name(), last, first, status));
        }

        conn.println(&protocol::response(
            protocol::INFORMATION_FOLLOWS,
            "list of newsgroups follows",
        ));
        for row in rows {
            conn.println(&row);
        }
        conn.println(protocol::MULTILINE_END);
        Ok(())
    }

    fn has_finished(&self) -> bool {
        true
    }
}
