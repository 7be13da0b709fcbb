//! Non-blocking management API

use std::sync::Arc;
use clustermgr_core::{BucketName, BucketSettings, ClusterInfo};
use clustermgr_net::{
    decode_bucket_list, decode_cluster_info, decode_settings, OperationRequest, RawResponse,
    ResponseStatus,
};
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::pending::{self, PendingResult};
use crate::transport::Transport;
use crate::{ManagerError, OperationContext, Result};

/// Outcome of a bucket lookup. Absence is data, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BucketLookup {
    Found(BucketSettings),
    Absent,
}

impl BucketLookup {
    pub fn into_option(self) -> Option<BucketSettings> {
        match self {
            BucketLookup::Found(settings) => Some(settings),
            BucketLookup::Absent => None,
        }
    }
}

impl From<BucketLookup> for Option<BucketSettings> {
    fn from(lookup: BucketLookup) -> Self {
        lookup.into_option()
    }
}

/// Issues management calls and hands back [`PendingResult`]s immediately.
///
/// Every method performs exactly one [`Transport::submit`]. Status
/// classification and decoding run as a task on the transport's runtime, so
/// the caller is never blocked. Cloning is cheap and clones share the
/// transport.
#[derive(Clone)]
pub struct AsyncClusterManager {
    transport: Arc<dyn Transport>,
}

impl AsyncClusterManager {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        AsyncClusterManager { transport }
    }

    /// Runtime that drives this manager's operations
    pub fn runtime(&self) -> &Handle {
        self.transport.runtime()
    }

    pub fn info(&self) -> PendingResult<ClusterInfo> {
        self.issue(OperationRequest::info(), |response, context| {
            match response.status {
                status if status.is_success() => {
                    decode_cluster_info(&response.body).map_err(|e| ManagerError::decode(context.clone(), e.to_string()))
                }
                _ => Err(unexpected(&response, context)),
            }
        })
    }

    /// All buckets in server-defined order
    pub fn list_buckets(&self) -> PendingResult<Vec<BucketSettings>> {
        self.issue(OperationRequest::list_buckets(), |response, context| {
            match response.status {
                status if status.is_success() => {
                    decode_bucket_list(&response.body).map_err(|e| ManagerError::decode(context.clone(), e.to_string()))
                }
                _ => Err(unexpected(&response, context)),
            }
        })
    }

    pub fn get_bucket(&self, name: &BucketName) -> PendingResult<BucketLookup> {
        self.issue(OperationRequest::get_bucket(name.clone()), |response, context| {
            match response.status {
                status if status.is_success() => decode_settings(&response.body)
                    .map(BucketLookup::Found)
                    .map_err(|e| ManagerError::decode(context.clone(), e.to_string())),
                ResponseStatus::NotFound => Ok(BucketLookup::Absent),
                _ => Err(unexpected(&response, context)),
            }
        })
    }

    /// Existence probe; a missing bucket resolves to `false`
    pub fn has_bucket(&self, name: &BucketName) -> PendingResult<bool> {
        self.issue(OperationRequest::has_bucket(name.clone()), |response, context| {
            match response.status {
                status if status.is_success() => Ok(true),
                ResponseStatus::NotFound => Ok(false),
                _ => Err(unexpected(&response, context)),
            }
        })
    }

    /// Register a new bucket. Resolves to the settings the server accepted;
    /// the bucket may not be usable yet.
    pub fn insert_bucket(&self, settings: &BucketSettings) -> PendingResult<BucketSettings> {
        self.issue(OperationRequest::insert_bucket(settings.clone()), |response, context| {
            match response.status {
                status if status.is_success() => accepted_settings(&response, context),
                ResponseStatus::Conflict => Err(ManagerError::AlreadyExists {
                    context: context.clone(),
                }),
                _ => Err(unexpected(&response, context)),
            }
        })
    }

    pub fn update_bucket(&self, settings: &BucketSettings) -> PendingResult<BucketSettings> {
        self.issue(OperationRequest::update_bucket(settings.clone()), |response, context| {
            match response.status {
                status if status.is_success() => accepted_settings(&response, context),
                ResponseStatus::NotFound => Err(ManagerError::NotFound {
                    context: context.clone(),
                }),
                _ => Err(unexpected(&response, context)),
            }
        })
    }

    /// Resolves to `true` iff the server acknowledged the removal
    pub fn remove_bucket(&self, name: &BucketName) -> PendingResult<bool> {
        self.issue(OperationRequest::remove_bucket(name.clone()), |response, context| {
            match response.status {
                status if status.is_success() => Ok(true),
                ResponseStatus::NotFound => Ok(false),
                _ => Err(unexpected(&response, context)),
            }
        })
    }

    fn issue<T, F>(&self, request: OperationRequest, classify: F) -> PendingResult<T>
    where
        T: Send + 'static,
        F: FnOnce(RawResponse, &OperationContext) -> Result<T> + Send + 'static,
    {
        let context = OperationContext::new(request.kind, request.target.as_ref());
        debug!("{}: issued", context);

        let submitted = self.transport.submit(request);
        let (completer, pending) = pending::channel(context);

        self.transport.runtime().spawn(async move {
            let outcome = match submitted.await {
                Ok(response) => classify(response, completer.context()),
                Err(err) => Err(err),
            };

            let context = completer.context();
            match &outcome {
                Ok(_) if completer.is_abandoned() && context.operation.is_mutation() => {
                    warn!("{}: applied after the caller stopped waiting", context)
                }
                Ok(_) => debug!("{}: completed", context),
                Err(err) => debug!("{}", err),
            }
            completer.complete(outcome);
        });

        pending
    }
}

impl std::fmt::Debug for AsyncClusterManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncClusterManager").finish_non_exhaustive()
    }
}

/// Mutations echo the stored settings; an empty body is not acceptable
fn accepted_settings(response: &RawResponse, context: &OperationContext) -> Result<BucketSettings> {
    decode_settings(&response.body).map_err(|e| ManagerError::decode(context.clone(), e.to_string()))
}

fn unexpected(response: &RawResponse, context: &OperationContext) -> ManagerError {
    ManagerError::transport(
        context.clone(),
        format!("{} ({})", response.error_message(), response.status.code()),
    )
}
