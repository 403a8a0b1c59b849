//! Server configuration
//!
//! Read once at startup from a TOML file and never reloaded; components
//! receive the pieces they need at construction.

mod defaults;
mod loading;
mod types;
mod validation;

pub use loading::{create_default_config, load_config};
pub use types::{Config, GroupEntry, ServerSettings, StorageProvider, SubscriptionConfig};
