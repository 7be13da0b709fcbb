//! HTTP request handlers for the management API

use bytes::Bytes;
use http_body_util::{BodyExt, Full, Limited};
use hyper::{Method, Request, Response, StatusCode};
use serde_json::json;
use std::convert::Infallible;
use tracing::{debug, error, info};
use clustermgr_core::*;
use clustermgr_net::*;
use crate::server::{simple_response, ServerState};

type BoxBody = Full<Bytes>;

/// Main request handler
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: ServerState,
) -> std::result::Result<Response<BoxBody>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("Handling {} {}", method, path);

    if method == Method::GET && path == "/health" {
        return Ok(handle_health());
    }

    let endpoint = match HttpMethod::parse(method.as_str())
        .and_then(|verb| Endpoint::parse(verb, &path))
    {
        Ok(endpoint) => endpoint,
        Err(e @ ProtocolError::UnsupportedMethod(_)) => {
            return Ok(error_json(StatusCode::METHOD_NOT_ALLOWED, &e.to_string()));
        }
        Err(e) => return Ok(error_json(StatusCode::NOT_FOUND, &e.to_string())),
    };

    let body = match Limited::new(req.into_body(), MAX_BODY_SIZE).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            return Ok(error_json(
                StatusCode::BAD_REQUEST,
                &format!("Failed to read request body: {}", e),
            ));
        }
    };

    let raw = dispatch(&state, endpoint, &body);
    let status = StatusCode::from_u16(raw.status.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if status.is_server_error() {
        error!("{} {} -> {}: {}", method, path, status, raw.error_message());
    } else {
        info!("{} {} -> {}", method, path, status);
    }

    Ok(simple_response(status, raw.body))
}

/// Execute one management call against the registry.
///
/// Transport-agnostic: the HTTP handler and in-process transports share it.
pub fn dispatch(state: &ServerState, endpoint: Endpoint, body: &[u8]) -> RawResponse {
    let registry = state.registry();

    let result = match endpoint {
        Endpoint::ClusterInfo => state
            .cluster_info()
            .map(|info| RawResponse::new(ResponseStatus::Ok, encode_cluster_info(&info))),

        Endpoint::ListBuckets => registry
            .list()
            .map(|buckets| RawResponse::new(ResponseStatus::Ok, encode_bucket_list(&buckets))),

        Endpoint::GetBucket(name) => registry.get(&name).map(|found| match found {
            Some(settings) => RawResponse::new(ResponseStatus::Ok, encode_settings(&settings)),
            None => RawResponse::error(ResponseStatus::NotFound, format!("Bucket not found: {}", name)),
        }),

        Endpoint::CreateBucket => match decode_settings(body) {
            Ok(settings) => {
                debug!("Creating bucket {}", settings.name());
                registry
                    .insert(&settings)
                    .map(|stored| RawResponse::new(ResponseStatus::Accepted, encode_settings(&stored)))
            }
            Err(e) => return RawResponse::error(ResponseStatus::BadRequest, e.to_string()),
        },

        Endpoint::UpdateBucket(name) => match decode_settings(body) {
            Ok(settings) if settings.name() != &name => {
                return RawResponse::error(
                    ResponseStatus::BadRequest,
                    format!("Body names bucket {} but path names {}", settings.name(), name),
                );
            }
            Ok(settings) => registry
                .update(&settings)
                .map(|stored| RawResponse::new(ResponseStatus::Accepted, encode_settings(&stored))),
            Err(e) => return RawResponse::error(ResponseStatus::BadRequest, e.to_string()),
        },

        Endpoint::DeleteBucket(name) => registry.remove(&name).map(|removed| {
            if removed {
                RawResponse::new(ResponseStatus::Ok, Vec::new())
            } else {
                RawResponse::error(ResponseStatus::NotFound, format!("Bucket not found: {}", name))
            }
        }),
    };

    result.unwrap_or_else(error_response)
}

/// Map registry failures onto response statuses
fn error_response(err: CoreError) -> RawResponse {
    let status = match &err {
        CoreError::BucketExists { .. } => ResponseStatus::Conflict,
        CoreError::BucketNotFound { .. } => ResponseStatus::NotFound,
        CoreError::InvalidBucketName(_)
        | CoreError::InvalidSettings(_)
        | CoreError::InvalidVersion(_) => ResponseStatus::BadRequest,
        CoreError::Storage(_) | CoreError::Serialization(_) => ResponseStatus::Other(500),
    };

    RawResponse::error(status, err.to_string())
}

/// Health check handler
fn handle_health() -> Response<BoxBody> {
    let body = json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "clustermgr",
        "timestamp": chrono::Utc::now().to_rfc3339()
    });

    simple_response(StatusCode::OK, body.to_string())
}

fn error_json(status: StatusCode, message: &str) -> Response<BoxBody> {
    simple_response(status, encode_error(message))
}
