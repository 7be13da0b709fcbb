//! REST route definitions for the management API

use clustermgr_core::*;

/// Cluster metadata resource
pub const POOLS_PATH: &str = "/pools/default";

/// Bucket collection resource
pub const BUCKETS_PATH: &str = "/pools/default/buckets";

/// Maximum request or response body accepted (prevents DoS)
pub const MAX_BODY_SIZE: usize = 4 * 1024 * 1024; // 4MB

/// Protocol error types
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("No route for {method} {path}")]
    InvalidRoute { method: &'static str, path: String },

    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),

    #[error("Malformed body: {0}")]
    MalformedBody(String),

    #[error("Body too large: {0} bytes (max: {1})")]
    BodyTooLarge(usize, usize),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Protocol constants for field names
pub mod fields {
    pub const NAME: &str = "name";
    pub const ERROR: &str = "error";
}

/// HTTP verbs used by the management API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    pub fn parse(method: &str) -> std::result::Result<Self, ProtocolError> {
        match method {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(ProtocolError::UnsupportedMethod(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// A resolved management route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    ClusterInfo,
    ListBuckets,
    GetBucket(BucketName),
    CreateBucket,
    UpdateBucket(BucketName),
    DeleteBucket(BucketName),
}

impl Endpoint {
    pub fn method(&self) -> HttpMethod {
        match self {
            Endpoint::ClusterInfo | Endpoint::ListBuckets | Endpoint::GetBucket(_) => HttpMethod::Get,
            Endpoint::CreateBucket | Endpoint::UpdateBucket(_) => HttpMethod::Post,
            Endpoint::DeleteBucket(_) => HttpMethod::Delete,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Endpoint::ClusterInfo => POOLS_PATH.to_string(),
            Endpoint::ListBuckets | Endpoint::CreateBucket => BUCKETS_PATH.to_string(),
            Endpoint::GetBucket(name) | Endpoint::UpdateBucket(name) | Endpoint::DeleteBucket(name) => {
                format!("{}/{}", BUCKETS_PATH, name)
            }
        }
    }

    /// Resolve an incoming method and path, e.g. `DELETE /pools/default/buckets/temp`
    pub fn parse(method: HttpMethod, path: &str) -> std::result::Result<Self, ProtocolError> {
        let path = path.trim_end_matches('/');
        let no_route = || ProtocolError::InvalidRoute {
            method: method.as_str(),
            path: path.to_string(),
        };

        if path == POOLS_PATH {
            return match method {
                HttpMethod::Get => Ok(Endpoint::ClusterInfo),
                _ => Err(no_route()),
            };
        }

        if path == BUCKETS_PATH {
            return match method {
                HttpMethod::Get => Ok(Endpoint::ListBuckets),
                HttpMethod::Post => Ok(Endpoint::CreateBucket),
                HttpMethod::Delete => Err(no_route()),
            };
        }

        let name = path
            .strip_prefix(BUCKETS_PATH)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|rest| !rest.is_empty() && !rest.contains('/'))
            .ok_or_else(no_route)?;

        let name = BucketName::new(name).map_err(|_| no_route())?;

        Ok(match method {
            HttpMethod::Get => Endpoint::GetBucket(name),
            HttpMethod::Post => Endpoint::UpdateBucket(name),
            HttpMethod::Delete => Endpoint::DeleteBucket(name),
        })
    }
}
