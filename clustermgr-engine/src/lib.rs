//! Server-side bucket registry persisted with fjall

use fjall::{Config, Keyspace, PersistMode};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use clustermgr_core::*;

pub mod profile;
pub mod registry;

pub use profile::*;
pub use registry::*;

/// Registry engine wrapping a fjall keyspace
#[derive(Clone)]
pub struct RegistryEngine {
    keyspace: Arc<Keyspace>,
    // Serializes check-then-write sequences on the registry
    write_lock: Arc<Mutex<()>>,
}

impl RegistryEngine {
    /// Open the registry engine at the given path
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let keyspace = Arc::new(
            Config::new(path)
                .open()
                .map_err(|e| CoreError::Storage(e.to_string()))?
        );

        Ok(RegistryEngine {
            keyspace,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Create temporary registry engine for testing
    #[cfg(any(test, feature = "test-utils"))]
    pub fn temp() -> Result<(Self, tempfile::TempDir)> {
        let temp_dir = tempfile::tempdir()
            .map_err(|e| CoreError::Storage(e.to_string()))?;
        let engine = Self::new(temp_dir.path())?;
        Ok((engine, temp_dir))
    }

    /// Open the bucket registry
    pub fn registry(&self) -> Result<BucketRegistry> {
        BucketRegistry::open(self.clone())
    }

    /// Get the underlying keyspace
    pub(crate) fn keyspace(&self) -> &Keyspace {
        &self.keyspace
    }

    pub(crate) fn write_guard(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| CoreError::Storage("registry lock poisoned".to_string()))
    }

    /// Bytes the keyspace occupies on disk
    pub fn disk_space(&self) -> u64 {
        self.keyspace.disk_space()
    }

    /// Persist all changes to disk
    pub fn persist(&self) -> Result<()> {
        self.keyspace
            .persist(PersistMode::SyncAll)
            .map_err(|e| CoreError::Storage(e.to_string()))
    }
}
