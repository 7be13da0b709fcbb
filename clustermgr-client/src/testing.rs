//! Scripted transport for exercising managers without a server

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clustermgr_net::{OperationKind, OperationRequest, RawResponse, ResponseStatus};
use tokio::runtime::Handle;

use crate::pending::{self, PendingResult};
use crate::transport::Transport;
use crate::OperationContext;

/// Answers each operation kind with a canned response, optionally after a
/// delay. Operations without a script answer `404`.
pub struct ScriptedTransport {
    handle: Handle,
    responses: Mutex<HashMap<OperationKind, RawResponse>>,
    delay: Option<Duration>,
    requests: Mutex<Vec<OperationRequest>>,
    submitted: AtomicUsize,
    completed: Arc<AtomicUsize>,
}

impl ScriptedTransport {
    pub fn new(handle: Handle) -> Self {
        ScriptedTransport {
            handle,
            responses: Mutex::new(HashMap::new()),
            delay: None,
            requests: Mutex::new(Vec::new()),
            submitted: AtomicUsize::new(0),
            completed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn respond(self, kind: OperationKind, response: RawResponse) -> Self {
        self.set_response(kind, response);
        self
    }

    /// Hold every response back for `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_response(&self, kind: OperationKind, response: RawResponse) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.insert(kind, response);
        }
    }

    pub fn submitted(&self) -> usize {
        self.submitted.load(Ordering::SeqCst)
    }

    /// Responses delivered so far, including ones nobody waited for
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<OperationRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Transport for ScriptedTransport {
    fn submit(&self, request: OperationRequest) -> PendingResult<RawResponse> {
        self.submitted.fetch_add(1, Ordering::SeqCst);

        let context = OperationContext::new(request.kind, request.target.as_ref());
        let response = self
            .responses
            .lock()
            .ok()
            .and_then(|responses| responses.get(&request.kind).cloned())
            .unwrap_or_else(|| RawResponse::error(ResponseStatus::NotFound, "not scripted"));

        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        let (completer, pending) = pending::channel(context);
        let delay = self.delay;
        let completed = self.completed.clone();

        self.handle.spawn(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            completed.fetch_add(1, Ordering::SeqCst);
            completer.complete(Ok(response));
        });

        pending
    }

    fn runtime(&self) -> &Handle {
        &self.handle
    }
}
