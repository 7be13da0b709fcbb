//! Management protocol for clustermgr: operation descriptors, REST routes
//! and JSON transcoding shared by the client transport and the server

use clustermgr_core::*;

pub mod protocol;
pub mod wire;

pub use protocol::*;
pub use wire::*;

/// Kind of management call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Info,
    ListBuckets,
    GetBucket,
    HasBucket,
    InsertBucket,
    UpdateBucket,
    RemoveBucket,
}

impl OperationKind {
    /// Caller-facing operation name used in errors and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Info => "info",
            OperationKind::ListBuckets => "getBuckets",
            OperationKind::GetBucket => "getBucket",
            OperationKind::HasBucket => "hasBucket",
            OperationKind::InsertBucket => "insertBucket",
            OperationKind::UpdateBucket => "updateBucket",
            OperationKind::RemoveBucket => "removeBucket",
        }
    }

    /// Whether the call changes server-side state
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            OperationKind::InsertBucket | OperationKind::UpdateBucket | OperationKind::RemoveBucket
        )
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptor of one management call.
///
/// Owned by the call that creates it and handed to the transport by value.
/// Carries no deadline; the blocking facade applies one while waiting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRequest {
    pub kind: OperationKind,
    pub target: Option<BucketName>,
    pub payload: Option<BucketSettings>,
}

impl OperationRequest {
    pub fn info() -> Self {
        OperationRequest {
            kind: OperationKind::Info,
            target: None,
            payload: None,
        }
    }

    pub fn list_buckets() -> Self {
        OperationRequest {
            kind: OperationKind::ListBuckets,
            target: None,
            payload: None,
        }
    }

    pub fn get_bucket(name: BucketName) -> Self {
        OperationRequest {
            kind: OperationKind::GetBucket,
            target: Some(name),
            payload: None,
        }
    }

    pub fn has_bucket(name: BucketName) -> Self {
        OperationRequest {
            kind: OperationKind::HasBucket,
            target: Some(name),
            payload: None,
        }
    }

    pub fn insert_bucket(settings: BucketSettings) -> Self {
        OperationRequest {
            kind: OperationKind::InsertBucket,
            target: Some(settings.name().clone()),
            payload: Some(settings),
        }
    }

    pub fn update_bucket(settings: BucketSettings) -> Self {
        OperationRequest {
            kind: OperationKind::UpdateBucket,
            target: Some(settings.name().clone()),
            payload: Some(settings),
        }
    }

    pub fn remove_bucket(name: BucketName) -> Self {
        OperationRequest {
            kind: OperationKind::RemoveBucket,
            target: Some(name),
            payload: None,
        }
    }

    /// REST endpoint this request is sent to
    pub fn endpoint(&self) -> std::result::Result<Endpoint, ProtocolError> {
        let endpoint = match (self.kind, &self.target) {
            (OperationKind::Info, _) => Endpoint::ClusterInfo,
            (OperationKind::ListBuckets, _) => Endpoint::ListBuckets,
            (OperationKind::InsertBucket, _) => Endpoint::CreateBucket,
            (OperationKind::GetBucket | OperationKind::HasBucket, Some(name)) => {
                Endpoint::GetBucket(name.clone())
            }
            (OperationKind::UpdateBucket, Some(name)) => Endpoint::UpdateBucket(name.clone()),
            (OperationKind::RemoveBucket, Some(name)) => Endpoint::DeleteBucket(name.clone()),
            (_, None) => return Err(ProtocolError::MissingField(fields::NAME.to_string())),
        };
        Ok(endpoint)
    }

    /// Encoded request body, if the call carries one
    pub fn body(&self) -> Option<Vec<u8>> {
        self.payload.as_ref().map(encode_settings)
    }
}

/// Response status classes the management API answers with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    Ok,
    Accepted,
    BadRequest,
    Unauthorized,
    NotFound,
    Conflict,
    Other(u16),
}

impl ResponseStatus {
    pub fn from_code(code: u16) -> Self {
        match code {
            200 => ResponseStatus::Ok,
            202 => ResponseStatus::Accepted,
            400 => ResponseStatus::BadRequest,
            401 => ResponseStatus::Unauthorized,
            404 => ResponseStatus::NotFound,
            409 => ResponseStatus::Conflict,
            other => ResponseStatus::Other(other),
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            ResponseStatus::Ok => 200,
            ResponseStatus::Accepted => 202,
            ResponseStatus::BadRequest => 400,
            ResponseStatus::Unauthorized => 401,
            ResponseStatus::NotFound => 404,
            ResponseStatus::Conflict => 409,
            ResponseStatus::Other(code) => *code,
        }
    }

    pub fn is_success(&self) -> bool {
        match self {
            ResponseStatus::Ok | ResponseStatus::Accepted => true,
            ResponseStatus::Other(code) => (200..300).contains(code),
            _ => false,
        }
    }
}

/// Undecoded server answer the transport completes with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: ResponseStatus,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: ResponseStatus, body: Vec<u8>) -> Self {
        RawResponse { status, body }
    }

    /// Build an error response carrying a JSON error body
    pub fn error(status: ResponseStatus, message: impl Into<String>) -> Self {
        RawResponse {
            status,
            body: encode_error(message),
        }
    }

    /// Human readable reason for a non-success response
    pub fn error_message(&self) -> String {
        match decode_error(&self.body) {
            Some(message) => message,
            None if self.body.is_empty() => format!("status {}", self.status.code()),
            None => String::from_utf8_lossy(&self.body).into_owned(),
        }
    }
}
