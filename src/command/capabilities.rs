//! CAPABILITIES command (RFC 3977 §5.2)
//!
//! May be issued at any time; the response is a multi-line block whose
//! first capability line is the VERSION and whose terminator is the lone
//! dot. Absent server-state changes, repeated invocations in one session
//! yield byte-identical responses.

use std::sync::Arc;

use async_trait::async_trait;

use super::{Command, CommandError};
use crate::connection::Connection;
use crate::daemon::ServerContext;
use crate::protocol;

/// Fixed capability strings; VERSION 2 (RFC 3977) must come first.
const CAPABILITIES: &[&str] = &["VERSION 2", "READER", "POST", "OVER"];

pub struct CapabilitiesCommand;

#[async_trait]
impl Command for CapabilitiesCommand {
    async fn process_line(
        &mut self,
        conn: &Arc<Connection>,
        _ctx: &Arc<ServerContext>,
        _line: &str,
    ) -> Result<(), CommandError> {
        conn.println(&protocol::response(
            protocol::CAPABILITY_LIST,
            "Capabilities list:",
        ));
        for capability in CAPABILITIES {
            conn.println(capability);
        }
        conn.println(protocol::MULTILINE_END);
        Ok(())
    }

    fn has_finished(&self) -> bool {
        true
    }
}
