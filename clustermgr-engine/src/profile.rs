//! Node description and cluster metadata snapshots

use clustermgr_core::*;
use crate::{BucketRegistry, RegistryEngine};

const MIB: u64 = 1024 * 1024;

/// Static description of the node serving the management API
#[derive(Debug, Clone)]
pub struct NodeProfile {
    pub hostname: String,
    pub version: String,
    pub ram_total_mb: u64,
    pub disk_total_mb: u64,
    pub services: Vec<String>,
}

impl Default for NodeProfile {
    fn default() -> Self {
        NodeProfile {
            hostname: "127.0.0.1:8091".to_string(),
            version: "7.2.0-0000-community".to_string(),
            ram_total_mb: 4096,
            disk_total_mb: 64 * 1024,
            services: vec!["kv".to_string()],
        }
    }
}

impl NodeProfile {
    /// Snapshot cluster metadata from the registry's current contents
    pub fn cluster_info(&self, engine: &RegistryEngine, registry: &BucketRegistry) -> Result<ClusterInfo> {
        let quota_used = mib_to_bytes(registry.quota_used_mb()?)?;

        let node = NodeInfo {
            hostname: self.hostname.clone(),
            version: self.version.clone(),
            status: NodeStatus::Healthy,
            services: self.services.clone(),
        };

        let storage = StorageTotals {
            ram_total: mib_to_bytes(self.ram_total_mb)?,
            ram_used: quota_used,
            ram_quota_total: mib_to_bytes(self.ram_total_mb)?,
            ram_quota_used: quota_used,
            disk_total: mib_to_bytes(self.disk_total_mb)?,
            disk_used: engine.disk_space(),
        };

        Ok(ClusterInfo::new(vec![node], storage))
    }
}

fn mib_to_bytes(mb: u64) -> Result<u64> {
    mb.checked_mul(MIB)
        .ok_or_else(|| CoreError::InvalidSettings(format!("{} MB does not fit in a byte count", mb)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_info_reflects_quotas() {
        let (engine, _temp) = RegistryEngine::temp().unwrap();
        let registry = engine.registry().unwrap();
        let profile = NodeProfile::default();

        let empty = profile.cluster_info(&engine, &registry).unwrap();
        assert_eq!(empty.node_count(), 1);
        assert_eq!(empty.storage().ram_quota_used, 0);
        assert_eq!(empty.min_version(), Some(ServerVersion::new(7, 2, 0)));

        let settings = BucketSettings::builder(BucketName::new("temp").unwrap())
            .quota_mb(256)
            .build()
            .unwrap();
        registry.insert(&settings).unwrap();

        let info = profile.cluster_info(&engine, &registry).unwrap();
        assert_eq!(info.storage().ram_quota_used, 256 * MIB);
        assert_eq!(info.storage().ram_total, 4096 * MIB);
    }

    #[test]
    fn test_oversized_totals_are_rejected() {
        let (engine, _temp) = RegistryEngine::temp().unwrap();
        let registry = engine.registry().unwrap();

        let huge = BucketSettings::builder(BucketName::new("huge").unwrap())
            .quota_mb(u64::MAX / 2)
            .build()
            .unwrap();
        registry.insert(&huge).unwrap();

        assert!(matches!(
            NodeProfile::default().cluster_info(&engine, &registry),
            Err(CoreError::InvalidSettings(_))
        ));
    }
}
