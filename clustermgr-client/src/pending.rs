//! Single-completion result handles

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tracing::debug;
use crate::{ManagerError, OperationContext, Result};

/// Create a linked producer/consumer pair for one operation
pub fn channel<T>(context: OperationContext) -> (Completer<T>, PendingResult<T>) {
    let (tx, rx) = oneshot::channel();
    (
        Completer {
            tx,
            context: context.clone(),
        },
        PendingResult { rx, context },
    )
}

/// Producer side of a [`PendingResult`].
///
/// `complete` consumes the completer, so an outcome is delivered at most
/// once. Dropping it without completing resolves the consumer to a
/// `TransportFailure`.
#[derive(Debug)]
pub struct Completer<T> {
    tx: oneshot::Sender<Result<T>>,
    context: OperationContext,
}

impl<T> Completer<T> {
    pub fn complete(self, outcome: Result<T>) {
        if self.tx.send(outcome).is_err() {
            debug!("{}: completed after the caller stopped waiting", self.context);
        }
    }

    pub fn context(&self) -> &OperationContext {
        &self.context
    }

    /// Whether the consumer has gone away, e.g. after a timeout
    pub fn is_abandoned(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Handle to the eventual outcome of one in-flight operation
#[derive(Debug)]
#[must_use = "a pending result does nothing unless awaited or waited on"]
pub struct PendingResult<T> {
    rx: oneshot::Receiver<Result<T>>,
    context: OperationContext,
}

impl<T> PendingResult<T> {
    /// A result that is already complete, e.g. when a request is rejected
    /// before reaching the transport
    pub fn ready(context: OperationContext, outcome: Result<T>) -> Self {
        let (completer, pending) = channel(context);
        completer.complete(outcome);
        pending
    }

    pub fn context(&self) -> &OperationContext {
        &self.context
    }
}

impl<T> Future for PendingResult<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(_)) => Poll::Ready(Err(ManagerError::transport(
                this.context.clone(),
                "operation dropped before completing",
            ))),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use clustermgr_net::OperationKind;

    fn context() -> OperationContext {
        OperationContext::new(OperationKind::Info, None)
    }

    #[tokio::test]
    async fn test_completion_is_delivered() {
        let (completer, pending) = channel::<u32>(context());
        completer.complete(Ok(7));
        assert_eq!(pending.await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_failure_is_delivered_unchanged() {
        let (completer, pending) = channel::<u32>(context());
        completer.complete(Err(ManagerError::decode(context(), "bad json")));

        let err = pending.await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodeFailure);
    }

    #[tokio::test]
    async fn test_dropped_completer_is_a_transport_failure() {
        let (completer, pending) = channel::<u32>(context());
        drop(completer);

        let err = pending.await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransportFailure);
        assert_eq!(err.context(), &context());
    }

    #[tokio::test]
    async fn test_completer_sees_abandoned_consumer() {
        let (completer, pending) = channel::<u32>(context());
        assert!(!completer.is_abandoned());

        drop(pending);
        assert!(completer.is_abandoned());
        // Completing after the consumer left is harmless
        completer.complete(Ok(1));
    }

    #[tokio::test]
    async fn test_ready_result() {
        let pending = PendingResult::ready(context(), Ok("done"));
        assert_eq!(pending.await.unwrap(), "done");
    }
}
