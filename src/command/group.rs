//! GROUP command (RFC 3977 §6.1.1)

use std::sync::Arc;

use async_trait::async_trait;

use super::{Command, CommandError};
use crate::connection::Connection;
use crate::daemon::ServerContext;
use crate::protocol;

pub struct GroupCommand;

#[async_trait]
impl Command for GroupCommand {
    async fn process_line(
        &mut self,
        conn: &Arc<Connection>,
        ctx: &Arc<ServerContext>,
        line: &str,
    ) -> Result<(), CommandError> {
        let Some(name) = line.split_whitespace().nth(1) else {
            conn.println(&protocol::response(
                protocol::SYNTAX_ERROR,
                "Syntax: GROUP newsgroup",
            ));
            return Ok(());
        };

        // Deleted groups are invisible here, same as unknown names.
        let Some(group) = ctx.groups.get(name) else {
            conn.println(&protocol::response(
                protocol::NO_SUCH_GROUP,
                "No such newsgroup",
            ));
            return Ok(());
        };

        let count = ctx.storage.get_postings_count(group.name()).await?;
        let first = ctx.storage.get_first_article_number(&group).await?;
        let last = ctx.storage.get_last_article_number(&group).await?;

        {
            let mut session = conn.session();
            session.current_group = Some(Arc::clone(&group));
            session.current_article = None;
        }

        conn.println(&format!(
            "{} {} {} {} {}",
            protocol::GROUP_SELECTED,
            count,
            first,
            last,
            group.name()
        ));
        Ok(())
    }

    fn has_finished(&self) -> bool {
        true
    }
}
