//! Error types for clustermgr values and the server-side registry

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid bucket name: {0}")]
    InvalidBucketName(String),

    #[error("Invalid bucket settings: {0}")]
    InvalidSettings(String),

    #[error("Invalid server version: {0}")]
    InvalidVersion(String),

    #[error("Bucket already exists: {name}")]
    BucketExists { name: String },

    #[error("Bucket not found: {name}")]
    BucketNotFound { name: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
