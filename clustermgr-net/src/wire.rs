//! JSON transcoding of management payloads

use clustermgr_core::*;
use serde::{Deserialize, Serialize};

use crate::protocol::{ProtocolError, MAX_BODY_SIZE};

/// Bucket configuration as it travels over the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BucketDocument {
    name: String,
    #[serde(default)]
    bucket_type: BucketType,
    #[serde(rename = "ramQuotaMB")]
    ram_quota_mb: u64,
    #[serde(default)]
    replica_number: u8,
    #[serde(default)]
    replica_index: bool,
    #[serde(default)]
    auth_type: AuthType,
    #[serde(default)]
    sasl_password: String,
    #[serde(default)]
    proxy_port: u16,
    #[serde(default)]
    flush_enabled: bool,
}

impl From<&BucketSettings> for BucketDocument {
    fn from(settings: &BucketSettings) -> Self {
        BucketDocument {
            name: settings.name().to_string(),
            bucket_type: settings.bucket_type(),
            ram_quota_mb: settings.quota_mb(),
            replica_number: settings.replicas(),
            replica_index: settings.index_replicas(),
            auth_type: settings.auth_type(),
            sasl_password: settings.password().to_string(),
            proxy_port: settings.port(),
            flush_enabled: settings.flush_enabled(),
        }
    }
}

impl TryFrom<BucketDocument> for BucketSettings {
    type Error = ProtocolError;

    fn try_from(doc: BucketDocument) -> std::result::Result<Self, ProtocolError> {
        let name = BucketName::new(&doc.name).map_err(|e| ProtocolError::MalformedBody(e.to_string()))?;

        BucketSettings::builder(name)
            .bucket_type(doc.bucket_type)
            .quota_mb(doc.ram_quota_mb)
            .replicas(doc.replica_number)
            .index_replicas(doc.replica_index)
            .password(doc.sasl_password)
            .port(doc.proxy_port)
            .flush_enabled(doc.flush_enabled)
            .build()
            .map_err(|e| ProtocolError::MalformedBody(e.to_string()))
    }
}

/// Error payload returned by the server on failed requests
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorBody {
    error: String,
}

fn check_size(bytes: &[u8]) -> std::result::Result<(), ProtocolError> {
    if bytes.len() > MAX_BODY_SIZE {
        return Err(ProtocolError::BodyTooLarge(bytes.len(), MAX_BODY_SIZE));
    }
    Ok(())
}

fn parse<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> std::result::Result<T, ProtocolError> {
    check_size(bytes)?;
    serde_json::from_slice(bytes).map_err(|e| ProtocolError::MalformedBody(e.to_string()))
}

fn to_json<T: Serialize>(value: &T) -> Vec<u8> {
    // Plain structs of strings and integers always serialize
    serde_json::to_vec(value).unwrap_or_default()
}

pub fn encode_settings(settings: &BucketSettings) -> Vec<u8> {
    to_json(&BucketDocument::from(settings))
}

pub fn decode_settings(bytes: &[u8]) -> std::result::Result<BucketSettings, ProtocolError> {
    parse::<BucketDocument>(bytes)?.try_into()
}

pub fn encode_bucket_list(buckets: &[BucketSettings]) -> Vec<u8> {
    let docs: Vec<BucketDocument> = buckets.iter().map(BucketDocument::from).collect();
    to_json(&docs)
}

pub fn decode_bucket_list(bytes: &[u8]) -> std::result::Result<Vec<BucketSettings>, ProtocolError> {
    parse::<Vec<BucketDocument>>(bytes)?
        .into_iter()
        .map(BucketSettings::try_from)
        .collect()
}

pub fn encode_cluster_info(info: &ClusterInfo) -> Vec<u8> {
    to_json(info)
}

pub fn decode_cluster_info(bytes: &[u8]) -> std::result::Result<ClusterInfo, ProtocolError> {
    parse(bytes)
}

pub fn encode_error(message: impl Into<String>) -> Vec<u8> {
    to_json(&ErrorBody {
        error: message.into(),
    })
}

/// Extract the message from an error body, if it is one
pub fn decode_error(bytes: &[u8]) -> Option<String> {
    parse::<ErrorBody>(bytes).ok().map(|body| body.error)
}
