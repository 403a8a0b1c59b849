//! Command handlers and the verb registry
//!
//! The first whitespace-delimited token of a line received on an unbound
//! connection selects a handler from [`CommandSelector`]. The handler stays
//! bound to that connection and receives every subsequent line until it
//! reports completion, which is how multi-line exchanges such as article
//! submission work. Handler faults surface to the dispatcher in
//! `connection.rs`, never to the reader loop.

mod article;
mod capabilities;
mod group;
mod list;
mod over;
mod post;
mod quit;
mod unsupported;

pub use article::ArticleCommand;
pub use capabilities::CapabilitiesCommand;
pub use group::GroupCommand;
pub use list::ListCommand;
pub use over::OverCommand;
pub use post::PostCommand;
pub use quit::QuitCommand;
pub use unsupported::UnsupportedCommand;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::connection::Connection;
use crate::daemon::ServerContext;
use crate::storage::StorageError;

/// Faults a command handler can raise.
#[derive(Debug)]
pub enum CommandError {
    /// Storage collaborator fault; transient ones get one retry.
    Storage(StorageError),
    /// I/O fault talking to the client.
    Io(std::io::Error),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "command failed: {}", e),
            Self::Io(e) => write!(f, "command I/O failed: {}", e),
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Storage(e) => Some(e),
            Self::Io(e) => Some(e),
        }
    }
}

impl CommandError {
    /// True when the dispatcher's single-retry policy applies.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Storage(StorageError::Transient(_)))
    }
}

impl From<StorageError> for CommandError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

impl From<std::io::Error> for CommandError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// One protocol command bound to one connection for the duration of its
/// exchange. Stateless commands finish after a single line; stateful ones
/// accumulate state across `process_line` calls until they self-report
/// completion.
#[async_trait]
pub trait Command: Send {
    /// Process one received line. The first call receives the verb line
    /// itself; later calls (stateful commands only) receive body lines.
    async fn process_line(
        &mut self,
        conn: &Arc<Connection>,
        ctx: &Arc<ServerContext>,
        line: &str,
    ) -> Result<(), CommandError>;

    /// Whether the exchange is complete. Checked after every processed
    /// line; once true the dispatcher unbinds the handler.
    fn has_finished(&self) -> bool;

    /// Whether this command spans multiple received lines.
    fn is_stateful(&self) -> bool {
        false
    }
}

pub type BoxedCommand = Box<dyn Command>;

type CommandFactory = fn() -> BoxedCommand;

/// Registry resolving a verb token to a fresh command handler instance.
pub struct CommandSelector {
    factories: HashMap<&'static str, CommandFactory>,
}

impl Default for CommandSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandSelector {
    /// Build the registry with every built-in handler registered.
    #[must_use]
    pub fn new() -> Self {
        let mut factories: HashMap<&'static str, CommandFactory> = HashMap::new();
        factories.insert("ARTICLE", || Box::new(ArticleCommand::new()));
        factories.insert("CAPABILITIES", || Box::new(CapabilitiesCommand));
        factories.insert("GROUP", || Box::new(GroupCommand));
        factories.insert("LIST", || Box::new(ListCommand));
        factories.insert("OVER", || Box::new(OverCommand));
        factories.insert("POST", || Box::new(PostCommand::new()));
        factories.insert("QUIT", || Box::new(QuitCommand));
        Self { factories }
    }

    /// Resolve the verb of a command line. Unknown verbs get the fallback
    /// handler, which answers `500`.
    #[must_use]
    pub fn select(&self, line: &str) -> BoxedCommand {
        let verb = line
            .trim()
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_ascii_uppercase();
        match self.factories.get(verb.as_str()) {
            Some(factory) => factory(),
            None => Box::new(UnsupportedCommand),
        }
    }
}

impl fmt::Debug for CommandSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut verbs: Vec<_> = self.factories.keys().collect();
        verbs.sort();
        f.debug_struct("CommandSelector").field("verbs", &verbs).finish()
    }
}
