//! A local-first budget tracker.
//!
//! Income and expenses are kept in a JSON document in the budget home (`$BUDGET_HOME`). The
//! `store` module owns that document, `filter` and `summary` compute the views shown by the CLI
//! and `chat` relays a conversation to a chat-completion service.

pub mod args;
mod backup;
pub mod chat;
pub mod commands;
mod config;
mod error;
pub mod filter;
pub mod model;
pub mod store;
pub mod summary;
#[cfg(test)]
mod test;
mod utils;

pub use backup::Backup;
pub use chat::ChatMode;
pub use config::{ChatConfig, Config};
pub use error::{Error, Result, ValidationError};
