//! Core data models and types for clustermgr

pub mod error;
pub mod types;

pub use error::*;
pub use types::*;

/// Result type alias for clustermgr value operations
pub type Result<T> = std::result::Result<T, CoreError>;
