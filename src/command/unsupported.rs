//! Fallback handler for verbs this server does not implement

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{Command, CommandError};
use crate::connection::Connection;
use crate::daemon::ServerContext;
use crate::protocol;

pub struct UnsupportedCommand;

#[async_trait]
impl Command for UnsupportedCommand {
    async fn process_line(
        &mut self,
        conn: &Arc<Connection>,
        _ctx: &Arc<ServerContext>,
        line: &str,
    ) -> Result<(), CommandError> {
        debug!("connection {}: unknown command '{}'", conn.id(), line);
        conn.println(&protocol::response(
            protocol::UNKNOWN_COMMAND,
            "Unknown command",
        ));
        Ok(())
    }

    fn has_finished(&self) -> bool {
        true
    }
}
