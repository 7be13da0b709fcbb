//! Bucket registry over a fjall partition

use fjall::{PartitionCreateOptions, PartitionHandle};
use serde_json;
use std::sync::Arc;
use tracing::debug;
use clustermgr_core::*;
use crate::RegistryEngine;

const PARTITION_NAME: &str = "buckets";
const KEY_PREFIX: &str = "bucket:";

/// Registry of the buckets the cluster hosts
#[derive(Clone)]
pub struct BucketRegistry {
    partition: Arc<PartitionHandle>,
    engine: RegistryEngine,
    capacity_mb: Option<u64>,
}

impl BucketRegistry {
    /// Open the registry partition
    pub(crate) fn open(engine: RegistryEngine) -> Result<Self> {
        let partition = Arc::new(
            engine
                .keyspace()
                .open_partition(PARTITION_NAME, PartitionCreateOptions::default())
                .map_err(|e| CoreError::Storage(e.to_string()))?
        );

        Ok(BucketRegistry {
            partition,
            engine,
            capacity_mb: None,
        })
    }

    /// Cap the sum of all bucket quotas at `capacity_mb`
    pub fn with_capacity(mut self, capacity_mb: u64) -> Self {
        self.capacity_mb = Some(capacity_mb);
        self
    }

    /// Register a new bucket.
    ///
    /// Returns the stored settings, which may differ from the input where the
    /// server applies its own defaults.
    pub fn insert(&self, settings: &BucketSettings) -> Result<BucketSettings> {
        let _guard = self.engine.write_guard()?;

        if self.read(settings.name())?.is_some() {
            return Err(CoreError::BucketExists {
                name: settings.name().to_string(),
            });
        }

        let stored = normalize(settings)?;
        self.check_capacity(&stored, 0)?;
        self.write(&stored)?;

        debug!("Registered bucket {} ({} MB)", stored.name(), stored.quota_mb());
        Ok(stored)
    }

    /// Replace the settings of an existing bucket
    pub fn update(&self, settings: &BucketSettings) -> Result<BucketSettings> {
        let _guard = self.engine.write_guard()?;

        let previous = self.read(settings.name())?.ok_or_else(|| CoreError::BucketNotFound {
            name: settings.name().to_string(),
        })?;

        if previous.bucket_type() != settings.bucket_type() {
            return Err(CoreError::InvalidSettings(format!(
                "bucket type of {} cannot change from {} to {}",
                settings.name(),
                previous.bucket_type(),
                settings.bucket_type()
            )));
        }

        let stored = normalize(settings)?;
        self.check_capacity(&stored, previous.quota_mb())?;
        self.write(&stored)?;

        debug!("Updated bucket {}", stored.name());
        Ok(stored)
    }

    /// Get bucket settings
    pub fn get(&self, name: &BucketName) -> Result<Option<BucketSettings>> {
        self.read(name)
    }

    /// All registered buckets, ordered by name
    pub fn list(&self) -> Result<Vec<BucketSettings>> {
        let mut buckets = Vec::new();

        for item in self.partition.prefix(KEY_PREFIX) {
            let (_key, value) = item.map_err(|e| CoreError::Storage(format!("Scan error: {}", e)))?;
            buckets.push(serde_json::from_slice(&value)?);
        }

        Ok(buckets)
    }

    /// Remove a bucket. Returns `false` if it was not registered.
    pub fn remove(&self, name: &BucketName) -> Result<bool> {
        let _guard = self.engine.write_guard()?;

        if self.read(name)?.is_none() {
            return Ok(false);
        }

        self.partition
            .remove(bucket_key(name))
            .map_err(|e| CoreError::Storage(e.to_string()))?;
        self.engine.persist()?;

        debug!("Removed bucket {}", name);
        Ok(true)
    }

    /// Sum of all bucket quotas, in megabytes
    pub fn quota_used_mb(&self) -> Result<u64> {
        self.list()?
            .iter()
            .try_fold(0u64, |total, bucket| total.checked_add(bucket.quota_mb()))
            .ok_or_else(|| CoreError::InvalidSettings("total bucket quota overflows".to_string()))
    }

    fn read(&self, name: &BucketName) -> Result<Option<BucketSettings>> {
        match self.partition.get(bucket_key(name)) {
            Ok(Some(data)) => Ok(Some(serde_json::from_slice(&data)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(CoreError::Storage(e.to_string())),
        }
    }

    fn write(&self, settings: &BucketSettings) -> Result<()> {
        let json = serde_json::to_vec(settings)?;

        self.partition
            .insert(bucket_key(settings.name()), json)
            .map_err(|e| CoreError::Storage(e.to_string()))?;

        self.engine.persist()
    }

    fn check_capacity(&self, settings: &BucketSettings, released_mb: u64) -> Result<()> {
        let Some(capacity) = self.capacity_mb else {
            return Ok(());
        };

        let used = self.quota_used_mb()?.saturating_sub(released_mb);
        let requested = used.checked_add(settings.quota_mb());
        if requested.map_or(true, |total| total > capacity) {
            return Err(CoreError::InvalidSettings(format!(
                "quota of {} MB exceeds the {} MB left in the cluster",
                settings.quota_mb(),
                capacity.saturating_sub(used)
            )));
        }

        Ok(())
    }
}

/// Apply the defaults the server enforces regardless of what was requested
fn normalize(settings: &BucketSettings) -> Result<BucketSettings> {
    match settings.bucket_type() {
        BucketType::Memcached => settings.to_builder().replicas(0).index_replicas(false).build(),
        _ => Ok(settings.clone()),
    }
}

fn bucket_key(name: &BucketName) -> Vec<u8> {
    format!("{}{}", KEY_PREFIX, name.as_str()).into_bytes()
}
