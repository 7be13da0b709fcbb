//! HTTP/2 transport over hyper

use bytes::Bytes;
use clustermgr_net::{HttpMethod, OperationRequest, RawResponse, ResponseStatus, MAX_BODY_SIZE};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::header::{HeaderValue, CONTENT_TYPE, USER_AGENT};
use hyper::{Method, Request};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::debug;

use crate::config::{ensure_multi_thread, ConfigError, ManagerConfig};
use crate::pending::{self, PendingResult};
use crate::transport::Transport;
use crate::{ManagerError, OperationContext};

type HttpClient = Client<HttpConnector, Full<Bytes>>;

/// Talks to the management REST API with HTTP/2 prior knowledge.
///
/// Requests run as tasks on a tokio runtime that is either owned by the
/// transport ([`HttpTransport::connect`]) or borrowed from the caller
/// ([`HttpTransport::with_handle`]).
pub struct HttpTransport {
    client: HttpClient,
    base_url: String,
    handle: Handle,
    runtime: Option<Runtime>,
}

impl HttpTransport {
    /// Start a dedicated runtime and connect through it
    pub fn connect(config: &ManagerConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let runtime = Builder::new_multi_thread()
            .worker_threads(config.worker_threads)
            .thread_name("clustermgr-transport")
            .enable_all()
            .build()?;

        let mut transport = Self::build(config, runtime.handle().clone());
        transport.runtime = Some(runtime);
        Ok(transport)
    }

    /// Run requests on an existing multi-threaded runtime
    pub fn with_handle(config: &ManagerConfig, handle: Handle) -> Result<Self, ConfigError> {
        config.validate()?;
        ensure_multi_thread(&handle)?;
        Ok(Self::build(config, handle))
    }

    fn build(config: &ManagerConfig, handle: Handle) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(config.connect_timeout));
        connector.set_nodelay(true);

        let client = {
            let _guard = handle.enter();
            Client::builder(TokioExecutor::new())
                .http2_only(true)
                .build(connector)
        };

        HttpTransport {
            client,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            handle,
            runtime: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_request(&self, request: &OperationRequest) -> Result<Request<Full<Bytes>>, String> {
        let endpoint = request.endpoint().map_err(|e| e.to_string())?;
        let method = match endpoint.method() {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Delete => Method::DELETE,
        };

        let mut builder = Request::builder()
            .method(method)
            .uri(format!("{}{}", self.base_url, endpoint.path()))
            .header(USER_AGENT, HeaderValue::from_static(concat!("clustermgr-client/", env!("CARGO_PKG_VERSION"))));

        let body = match request.body() {
            Some(body) => {
                builder = builder.header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                Bytes::from(body)
            }
            None => Bytes::new(),
        };

        builder.body(Full::new(body)).map_err(|e| e.to_string())
    }
}

/// Oversized bodies are a decode failure; other read errors are transport failures
async fn send(
    client: HttpClient,
    request: Request<Full<Bytes>>,
    context: &OperationContext,
) -> Result<RawResponse, ManagerError> {
    let response = client
        .request(request)
        .await
        .map_err(|e| ManagerError::transport(context.clone(), e.to_string()))?;
    let status = ResponseStatus::from_code(response.status().as_u16());

    let body = Limited::new(response.into_body(), MAX_BODY_SIZE)
        .collect()
        .await
        .map_err(|e| {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                ManagerError::decode(
                    context.clone(),
                    format!("response body exceeds {} bytes", MAX_BODY_SIZE),
                )
            } else {
                ManagerError::transport(context.clone(), format!("failed to read response body: {}", e))
            }
        })?
        .to_bytes();

    Ok(RawResponse::new(status, body.to_vec()))
}

impl Transport for HttpTransport {
    fn submit(&self, request: OperationRequest) -> PendingResult<RawResponse> {
        let context = OperationContext::new(request.kind, request.target.as_ref());

        let http_request = match self.build_request(&request) {
            Ok(http_request) => http_request,
            Err(message) => {
                let err = ManagerError::transport(context.clone(), message);
                return PendingResult::ready(context, Err(err));
            }
        };

        let (completer, pending) = pending::channel(context);
        let client = self.client.clone();

        self.handle.spawn(async move {
            let outcome = send(client, http_request, completer.context()).await;
            if let Ok(response) = &outcome {
                debug!("{}: server answered {}", completer.context(), response.status.code());
            }
            completer.complete(outcome);
        });

        pending
    }

    fn runtime(&self) -> &Handle {
        &self.handle
    }
}

impl Drop for HttpTransport {
    fn drop(&mut self) {
        // An owned runtime may be dropped from async code; never block there
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("owns_runtime", &self.runtime.is_some())
            .finish()
    }
}
