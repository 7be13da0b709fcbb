//! Core data types for clustermgr

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Longest bucket name the cluster accepts
pub const MAX_BUCKET_NAME_LEN: usize = 100;

/// Smallest RAM quota a bucket may be created with, in megabytes
pub const MIN_QUOTA_MB: u64 = 100;

/// Upper bound on data replicas per bucket
pub const MAX_REPLICAS: u8 = 3;

/// Validated bucket identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BucketName(String);

impl BucketName {
    /// Create a new bucket name with validation
    pub fn new(name: &str) -> crate::Result<Self> {
        if name.is_empty() {
            return Err(crate::CoreError::InvalidBucketName("empty name".to_string()));
        }

        if name.len() > MAX_BUCKET_NAME_LEN {
            return Err(crate::CoreError::InvalidBucketName(format!(
                "'{}' is longer than {} characters",
                name, MAX_BUCKET_NAME_LEN
            )));
        }

        // ASCII alphanumerics plus the separators the server allows
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '%'))
        {
            return Err(crate::CoreError::InvalidBucketName(format!(
                "invalid characters in '{}'",
                name
            )));
        }

        Ok(BucketName(name.to_string()))
    }

    /// Get the bucket name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BucketName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for BucketName {
    type Error = crate::CoreError;

    fn try_from(value: String) -> crate::Result<Self> {
        BucketName::new(&value)
    }
}

impl From<BucketName> for String {
    fn from(name: BucketName) -> Self {
        name.0
    }
}

/// Storage model of a bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketType {
    /// Persistent, replicated bucket
    #[default]
    Couchbase,
    /// Memory-only bucket with replication
    Ephemeral,
    /// Memory-only cache bucket, never replicated
    Memcached,
}

impl BucketType {
    /// Whether items survive a node restart
    pub fn is_persistent(&self) -> bool {
        matches!(self, BucketType::Couchbase)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BucketType::Couchbase => "couchbase",
            BucketType::Ephemeral => "ephemeral",
            BucketType::Memcached => "memcached",
        }
    }
}

impl std::fmt::Display for BucketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How clients authenticate against a bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    #[default]
    None,
    Sasl,
}

/// Configuration of one bucket.
///
/// Values are never mutated after construction. An update is expressed by
/// building a new `BucketSettings` with the same name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketSettings {
    name: BucketName,
    bucket_type: BucketType,
    quota_mb: u64,
    port: u16,
    password: String,
    replicas: u8,
    index_replicas: bool,
    flush_enabled: bool,
}

impl BucketSettings {
    /// Start building settings for the named bucket
    pub fn builder(name: BucketName) -> BucketSettingsBuilder {
        BucketSettingsBuilder::new(name)
    }

    pub fn name(&self) -> &BucketName {
        &self.name
    }

    pub fn bucket_type(&self) -> BucketType {
        self.bucket_type
    }

    /// RAM quota in megabytes
    pub fn quota_mb(&self) -> u64 {
        self.quota_mb
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Derived from the password: SASL iff one is set
    pub fn auth_type(&self) -> AuthType {
        if self.password.is_empty() {
            AuthType::None
        } else {
            AuthType::Sasl
        }
    }

    pub fn replicas(&self) -> u8 {
        self.replicas
    }

    pub fn index_replicas(&self) -> bool {
        self.index_replicas
    }

    pub fn flush_enabled(&self) -> bool {
        self.flush_enabled
    }

    /// Copy these settings into a builder, e.g. to derive an updated value
    pub fn to_builder(&self) -> BucketSettingsBuilder {
        BucketSettingsBuilder {
            settings: self.clone(),
        }
    }
}

/// Builder for [`BucketSettings`]
#[derive(Debug, Clone)]
pub struct BucketSettingsBuilder {
    settings: BucketSettings,
}

impl BucketSettingsBuilder {
    fn new(name: BucketName) -> Self {
        BucketSettingsBuilder {
            settings: BucketSettings {
                name,
                bucket_type: BucketType::default(),
                quota_mb: MIN_QUOTA_MB,
                port: 0,
                password: String::new(),
                replicas: 0,
                index_replicas: false,
                flush_enabled: false,
            },
        }
    }

    pub fn bucket_type(mut self, bucket_type: BucketType) -> Self {
        self.settings.bucket_type = bucket_type;
        self
    }

    pub fn quota_mb(mut self, quota_mb: u64) -> Self {
        self.settings.quota_mb = quota_mb;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.settings.port = port;
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.settings.password = password.into();
        self
    }

    pub fn replicas(mut self, replicas: u8) -> Self {
        self.settings.replicas = replicas;
        self
    }

    pub fn index_replicas(mut self, enabled: bool) -> Self {
        self.settings.index_replicas = enabled;
        self
    }

    pub fn flush_enabled(mut self, enabled: bool) -> Self {
        self.settings.flush_enabled = enabled;
        self
    }

    /// Validate and produce the settings value
    pub fn build(self) -> crate::Result<BucketSettings> {
        let settings = self.settings;

        if settings.quota_mb < MIN_QUOTA_MB {
            return Err(crate::CoreError::InvalidSettings(format!(
                "quota of {} MB is below the minimum of {} MB",
                settings.quota_mb, MIN_QUOTA_MB
            )));
        }

        if settings.replicas > MAX_REPLICAS {
            return Err(crate::CoreError::InvalidSettings(format!(
                "{} replicas requested, at most {} supported",
                settings.replicas, MAX_REPLICAS
            )));
        }

        Ok(settings)
    }
}

/// Health of a cluster node as reported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Healthy,
    Warmup,
    Unhealthy,
}

/// One server node in the cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub hostname: String,
    pub version: String,
    pub status: NodeStatus,
    pub services: Vec<String>,
}

/// Cluster-wide storage totals, in bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageTotals {
    pub ram_total: u64,
    pub ram_used: u64,
    pub ram_quota_total: u64,
    pub ram_quota_used: u64,
    pub disk_total: u64,
    pub disk_used: u64,
}

/// Snapshot of cluster metadata as of the moment it was fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterInfo {
    nodes: Vec<NodeInfo>,
    storage: StorageTotals,
}

impl ClusterInfo {
    pub fn new(nodes: Vec<NodeInfo>, storage: StorageTotals) -> Self {
        ClusterInfo { nodes, storage }
    }

    pub fn nodes(&self) -> &[NodeInfo] {
        &self.nodes
    }

    pub fn storage(&self) -> &StorageTotals {
        &self.storage
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn healthy_nodes(&self) -> impl Iterator<Item = &NodeInfo> {
        self.nodes
            .iter()
            .filter(|node| node.status == NodeStatus::Healthy)
    }

    /// Lowest server version across all nodes.
    ///
    /// Nodes reporting an unparseable version are skipped. Returns `None`
    /// when no node has a usable version.
    pub fn min_version(&self) -> Option<ServerVersion> {
        self.nodes
            .iter()
            .filter_map(|node| ServerVersion::parse(&node.version).ok())
            .min()
    }
}

/// Server release version, e.g. `4.5.0` out of `4.5.0-2601-enterprise`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ServerVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        ServerVersion { major, minor, patch }
    }

    /// Parse the leading `major.minor.patch` triple, ignoring build suffixes
    pub fn parse(raw: &str) -> crate::Result<Self> {
        let release = raw.split('-').next().unwrap_or_default();
        let mut parts = release.split('.');

        let mut next = |label: &str| -> crate::Result<u32> {
            match parts.next() {
                Some(part) => part.parse::<u32>().map_err(|_| {
                    crate::CoreError::InvalidVersion(format!("bad {} component in '{}'", label, raw))
                }),
                None if label == "major" => Err(crate::CoreError::InvalidVersion(format!(
                    "no version in '{}'",
                    raw
                ))),
                None => Ok(0),
            }
        };

        let major = next("major")?;
        let minor = next("minor")?;
        let patch = next("patch")?;

        Ok(ServerVersion { major, minor, patch })
    }
}

impl PartialOrd for ServerVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ServerVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch))
    }
}

impl std::fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
