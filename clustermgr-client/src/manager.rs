//! Blocking management API with per-call deadlines

use std::sync::Arc;
use std::time::{Duration, Instant};

use clustermgr_core::{BucketName, BucketSettings, ClusterInfo};
use tracing::{debug, warn};

use crate::async_manager::AsyncClusterManager;
use crate::config::{ensure_multi_thread, ConfigError, ManagerConfig};
use crate::http::HttpTransport;
use crate::pending::PendingResult;
use crate::{ManagerError, Result};

/// Synchronous facade over [`AsyncClusterManager`].
///
/// Each call issues the asynchronous operation and then waits for whichever
/// comes first: its completion or the deadline. A deadline that fires first
/// yields [`ManagerError::Timeout`] but does not cancel the request; it keeps
/// running on the transport runtime and may still take effect server-side.
///
/// The blocking methods park the calling thread on the transport runtime
/// and panic when called from within an async execution context, like
/// [`tokio::runtime::Handle::block_on`]. Use [`ClusterManager::async_manager`]
/// from async code. Construction rejects current-thread runtimes, whose
/// timers stop while the caller is parked.
#[derive(Clone, Debug)]
pub struct ClusterManager {
    inner: AsyncClusterManager,
    default_timeout: Duration,
}

impl ClusterManager {
    /// Fails with [`ConfigError::UnsupportedRuntime`] unless the manager's
    /// runtime is multi-threaded
    pub fn new(inner: AsyncClusterManager, default_timeout: Duration) -> std::result::Result<Self, ConfigError> {
        ensure_multi_thread(inner.runtime())?;
        Ok(ClusterManager {
            inner,
            default_timeout,
        })
    }

    /// Connect over HTTP/2 with a transport that owns its runtime
    pub fn connect(config: ManagerConfig) -> std::result::Result<Self, ConfigError> {
        let transport = HttpTransport::connect(&config)?;
        debug!("Connected manager to {}", transport.base_url());

        Self::new(
            AsyncClusterManager::new(Arc::new(transport)),
            config.management_timeout,
        )
    }

    /// Deadline used by the methods without a `_with_timeout` suffix
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// The underlying asynchronous manager, for composing non-blocking calls
    pub fn async_manager(&self) -> &AsyncClusterManager {
        &self.inner
    }

    pub fn info(&self) -> Result<ClusterInfo> {
        self.info_with_timeout(self.default_timeout)
    }

    pub fn info_with_timeout(&self, timeout: Duration) -> Result<ClusterInfo> {
        self.wait(self.inner.info(), timeout)
    }

    pub fn buckets(&self) -> Result<Vec<BucketSettings>> {
        self.buckets_with_timeout(self.default_timeout)
    }

    pub fn buckets_with_timeout(&self, timeout: Duration) -> Result<Vec<BucketSettings>> {
        self.wait(self.inner.list_buckets(), timeout)
    }

    /// `None` when no bucket has this name
    pub fn bucket(&self, name: &BucketName) -> Result<Option<BucketSettings>> {
        self.bucket_with_timeout(name, self.default_timeout)
    }

    pub fn bucket_with_timeout(&self, name: &BucketName, timeout: Duration) -> Result<Option<BucketSettings>> {
        self.wait(self.inner.get_bucket(name), timeout)
            .map(|lookup| lookup.into_option())
    }

    pub fn has_bucket(&self, name: &BucketName) -> Result<bool> {
        self.has_bucket_with_timeout(name, self.default_timeout)
    }

    pub fn has_bucket_with_timeout(&self, name: &BucketName, timeout: Duration) -> Result<bool> {
        self.wait(self.inner.has_bucket(name), timeout)
    }

    pub fn insert_bucket(&self, settings: &BucketSettings) -> Result<BucketSettings> {
        self.insert_bucket_with_timeout(settings, self.default_timeout)
    }

    pub fn insert_bucket_with_timeout(&self, settings: &BucketSettings, timeout: Duration) -> Result<BucketSettings> {
        self.wait(self.inner.insert_bucket(settings), timeout)
    }

    pub fn update_bucket(&self, settings: &BucketSettings) -> Result<BucketSettings> {
        self.update_bucket_with_timeout(settings, self.default_timeout)
    }

    pub fn update_bucket_with_timeout(&self, settings: &BucketSettings, timeout: Duration) -> Result<BucketSettings> {
        self.wait(self.inner.update_bucket(settings), timeout)
    }

    pub fn remove_bucket(&self, name: &BucketName) -> Result<bool> {
        self.remove_bucket_with_timeout(name, self.default_timeout)
    }

    pub fn remove_bucket_with_timeout(&self, name: &BucketName, timeout: Duration) -> Result<bool> {
        self.wait(self.inner.remove_bucket(name), timeout)
    }

    /// Race completion against the deadline. Completion wins ties.
    fn wait<T>(&self, pending: PendingResult<T>, timeout: Duration) -> Result<T> {
        let context = pending.context().clone();
        let started = Instant::now();

        let deadline_context = context.clone();
        let outcome = self.inner.runtime().block_on(async move {
            tokio::select! {
                biased;
                outcome = pending => outcome,
                _ = tokio::time::sleep(timeout) => Err(ManagerError::Timeout {
                    context: deadline_context,
                    timeout,
                }),
            }
        });

        if let Err(ManagerError::Timeout { .. }) = &outcome {
            warn!(
                "{}: no answer within {:?}, leaving request in flight",
                context, timeout
            );
        } else {
            debug!("{}: returned after {:?}", context, started.elapsed());
        }

        outcome
    }
}
