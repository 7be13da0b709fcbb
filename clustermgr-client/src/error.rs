//! Caller-facing error taxonomy

use std::time::Duration;
use thiserror::Error;
use clustermgr_core::BucketName;
use clustermgr_net::OperationKind;

/// Which call failed and what it targeted, e.g. `insertBucket(temp)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationContext {
    pub operation: OperationKind,
    pub target: Option<String>,
}

impl OperationContext {
    pub fn new(operation: OperationKind, target: Option<&BucketName>) -> Self {
        OperationContext {
            operation,
            target: target.map(|name| name.to_string()),
        }
    }
}

impl std::fmt::Display for OperationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.target {
            Some(target) => write!(f, "{}({})", self.operation, target),
            None => write!(f, "{}", self.operation),
        }
    }
}

/// Fieldless discriminant of [`ManagerError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Timeout,
    TransportFailure,
    DecodeFailure,
    AlreadyExists,
    NotFound,
}

/// Every failure a management call can end in.
///
/// Each non-success outcome is classified into exactly one variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManagerError {
    /// The deadline elapsed first. The request may still be in flight and
    /// may still take effect on the server.
    #[error("{context}: timed out after {timeout:?}")]
    Timeout {
        context: OperationContext,
        timeout: Duration,
    },

    #[error("{context}: transport failure: {message}")]
    TransportFailure {
        context: OperationContext,
        message: String,
    },

    #[error("{context}: could not decode response: {message}")]
    DecodeFailure {
        context: OperationContext,
        message: String,
    },

    #[error("{context}: bucket already exists")]
    AlreadyExists { context: OperationContext },

    #[error("{context}: bucket not found")]
    NotFound { context: OperationContext },
}

impl ManagerError {
    pub fn transport(context: OperationContext, message: impl Into<String>) -> Self {
        ManagerError::TransportFailure {
            context,
            message: message.into(),
        }
    }

    pub fn decode(context: OperationContext, message: impl Into<String>) -> Self {
        ManagerError::DecodeFailure {
            context,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ManagerError::Timeout { .. } => ErrorKind::Timeout,
            ManagerError::TransportFailure { .. } => ErrorKind::TransportFailure,
            ManagerError::DecodeFailure { .. } => ErrorKind::DecodeFailure,
            ManagerError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            ManagerError::NotFound { .. } => ErrorKind::NotFound,
        }
    }

    pub fn context(&self) -> &OperationContext {
        match self {
            ManagerError::Timeout { context, .. }
            | ManagerError::TransportFailure { context, .. }
            | ManagerError::DecodeFailure { context, .. }
            | ManagerError::AlreadyExists { context }
            | ManagerError::NotFound { context } => context,
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.kind() == ErrorKind::Timeout
    }
}
