//! Boundary to the execution engine that talks to the cluster

use tokio::runtime::Handle;
use clustermgr_net::{OperationRequest, RawResponse};
use crate::PendingResult;

/// Non-blocking executor of management requests.
///
/// Implementations own their concurrency substrate (the runtime behind
/// [`Transport::runtime`]) and any connection state. Failures to reach the
/// cluster complete the result with `ManagerError::TransportFailure`; status
/// classification and body decoding are left to the caller.
pub trait Transport: Send + Sync {
    /// Issue `request` and return immediately. The returned result must be
    /// completed exactly once.
    fn submit(&self, request: OperationRequest) -> PendingResult<RawResponse>;

    /// Runtime the transport executes on
    fn runtime(&self) -> &Handle;
}
