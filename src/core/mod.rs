//! # Core Module
//!
//! Configuration, error taxonomy and outbound response types.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Initial creation with config, error and response modules

pub mod config;
pub mod error;
pub mod response;

// Re-export commonly used items
pub use config::Config;
pub use error::{CommandError, DefinitionError};
pub use response::{truncate_for_message, MessageOrigin, Reply, SentMessage, MESSAGE_LIMIT};
