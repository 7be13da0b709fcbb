//! HTTP/2 server implementation

use bytes::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE, SERVER};
use hyper::server::conn::http2;
use hyper::service::service_fn;
use hyper::{Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use http_body_util::Full;
use tokio::net::{TcpListener, TcpStream};
use std::net::SocketAddr;
use tracing::{error, info, debug};
use clustermgr_core::*;
use clustermgr_engine::{BucketRegistry, NodeProfile, RegistryEngine};
use crate::handlers::handle_request;

/// Everything a request handler needs, cheap to clone per connection
#[derive(Clone)]
pub struct ServerState {
    engine: RegistryEngine,
    registry: BucketRegistry,
    profile: NodeProfile,
}

impl ServerState {
    pub fn new(engine: RegistryEngine, profile: NodeProfile) -> Result<Self> {
        let registry = engine.registry()?.with_capacity(profile.ram_total_mb);
        Ok(Self {
            engine,
            registry,
            profile,
        })
    }

    pub fn registry(&self) -> &BucketRegistry {
        &self.registry
    }

    pub fn cluster_info(&self) -> Result<ClusterInfo> {
        self.profile.cluster_info(&self.engine, &self.registry)
    }
}

pub struct ManagementServer {
    state: ServerState,
}

impl ManagementServer {
    pub fn new(state: ServerState) -> Self {
        Self { state }
    }

    /// Bind `addr` and serve until the listener fails
    pub async fn serve_addr(self, addr: SocketAddr) -> std::io::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener).await
    }

    /// Serve connections accepted from an already bound listener
    pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        info!("clustermgr server listening on {}", listener.local_addr()?);

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            debug!("New connection from {}", remote_addr);

            let state = self.state.clone();
            tokio::spawn(async move {
                Self::handle_connection(stream, remote_addr, state).await;
            });
        }
    }

    async fn handle_connection(stream: TcpStream, remote_addr: SocketAddr, state: ServerState) {
        let io = TokioIo::new(stream);

        let service = service_fn(move |req| {
            let state = state.clone();
            async move { handle_request(req, state).await }
        });

        if let Err(err) = http2::Builder::new(TokioExecutor::new())
            .serve_connection(io, service)
            .await
        {
            error!("HTTP/2 connection error from {}: {}", remote_addr, err);
        }
    }
}

/// Simple JSON response builder
pub fn simple_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(SERVER, HeaderValue::from_static(concat!("clustermgr/", env!("CARGO_PKG_VERSION"))));

    response
}
