//! clustermgr Rust client SDK
//!
//! [`AsyncClusterManager`] issues management calls without blocking and
//! returns a [`PendingResult`] per call. [`ClusterManager`] wraps it with
//! blocking methods bounded by a deadline.

pub mod async_manager;
pub mod config;
pub mod error;
pub mod http;
pub mod manager;
pub mod pending;
pub mod transport;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use async_manager::{AsyncClusterManager, BucketLookup};
pub use config::{ConfigError, ManagerConfig};
pub use error::{ErrorKind, ManagerError, OperationContext};
pub use http::HttpTransport;
pub use manager::ClusterManager;
pub use pending::{Completer, PendingResult};
pub use transport::Transport;

pub type Result<T> = std::result::Result<T, ManagerError>;
