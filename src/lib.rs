//! NNTP server daemon core
//!
//! A news server built around three cooperating pieces: a connection layer
//! that multiplexes many client sockets over a small fixed pool of reader
//! workers, a command layer that dispatches protocol lines to stateless or
//! stateful handlers, and a feed pipeline that pushes accepted articles out
//! to subscribed peers.

pub mod codec;
pub mod command;
pub mod config;
pub mod connection;
pub mod daemon;
pub mod feed;
pub mod logging;
pub mod protocol;
pub mod registry;
pub mod storage;

pub use config::{create_default_config, load_config, Config};
pub use daemon::{NntpServer, ServerContext};
pub use storage::{Article, Group, GroupRegistry, MemoryStorage, Storage, StorageError};
