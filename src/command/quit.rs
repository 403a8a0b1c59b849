//! QUIT command (RFC 3977 §5.4)

use std::sync::Arc;

use async_trait::async_trait;

use super::{Command, CommandError};
use crate::connection::Connection;
use crate::daemon::ServerContext;
use crate::protocol;

pub struct QuitCommand;

#[async_trait]
impl Command for QuitCommand {
    async fn process_line(
        &mut self,
        conn: &Arc<Connection>,
        _ctx: &Arc<ServerContext>,
        _line: &str,
    ) -> Result<(), CommandError> {
        conn.println(&protocol::response(
            protocol::CONNECTION_CLOSING,
            "Closing connection",
        ));
        conn.shutdown();
        Ok(())
    }

    fn has_finished(&self) -> bool {
        true
    }
}
