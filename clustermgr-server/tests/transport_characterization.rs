//! Characterization tests for the HTTP/2 management endpoint via hyper
//! These tests validate routing, status mapping and concurrent access over a real socket

use bytes::Bytes;
use clustermgr_core::*;
use clustermgr_engine::{NodeProfile, RegistryEngine};
use clustermgr_net::*;
use clustermgr_server::{ManagementServer, ServerState};
use http_body_util::{BodyExt, Full};
use hyper::{Method, Request, StatusCode};
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::net::SocketAddr;
use tokio::net::TcpListener;

type HttpClient = Client<hyper_util::client::legacy::connect::HttpConnector, Full<Bytes>>;

async fn start_server() -> (SocketAddr, tempfile::TempDir, tokio::task::JoinHandle<()>) {
    let (engine, temp) = RegistryEngine::temp().unwrap();
    let state = ServerState::new(engine, NodeProfile::default()).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let _ = ManagementServer::new(state).serve(listener).await;
    });

    (addr, temp, handle)
}

fn client() -> HttpClient {
    Client::builder(TokioExecutor::new())
        .http2_only(true)
        .build_http()
}

async fn call(
    client: &HttpClient,
    addr: SocketAddr,
    method: Method,
    path: &str,
    body: Vec<u8>,
) -> (StatusCode, Bytes) {
    let req = Request::builder()
        .method(method)
        .uri(format!("http://{}{}", addr, path))
        .body(Full::new(Bytes::from(body)))
        .unwrap();

    let resp = client.request(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, body)
}

fn settings(name: &str) -> BucketSettings {
    BucketSettings::builder(BucketName::new(name).unwrap())
        .quota_mb(100)
        .build()
        .unwrap()
}

#[tokio::test]
async fn net_health_endpoint_answers() {
    let (addr, _temp, server) = start_server().await;
    let client = client();

    let (status, body) = call(&client, addr, Method::GET, "/health", Vec::new()).await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");

    server.abort();
}

#[tokio::test]
async fn net_status_codes_follow_registry_outcomes() {
    let (addr, _temp, server) = start_server().await;
    let client = client();
    let body = encode_settings(&settings("temp"));

    let (status, _) = call(&client, addr, Method::POST, BUCKETS_PATH, body.clone()).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (status, body) = call(&client, addr, Method::POST, BUCKETS_PATH, body).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(decode_error(&body).unwrap().contains("temp"));

    let path = format!("{}/temp", BUCKETS_PATH);
    let (status, _) = call(&client, addr, Method::DELETE, &path, Vec::new()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(&client, addr, Method::GET, &path, Vec::new()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    server.abort();
}

#[tokio::test]
async fn net_unknown_routes_and_methods() {
    let (addr, _temp, server) = start_server().await;
    let client = client();

    let (status, _) = call(&client, addr, Method::GET, "/v1/objects/key", Vec::new()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&client, addr, Method::PUT, BUCKETS_PATH, Vec::new()).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    server.abort();
}

#[tokio::test]
async fn net_concurrent_inserts_over_one_connection() {
    let (addr, _temp, server) = start_server().await;
    let client = client();

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move {
                let body = encode_settings(&settings(&format!("bucket-{}", i)));
                call(&client, addr, Method::POST, BUCKETS_PATH, body).await.0
            })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap(), StatusCode::ACCEPTED);
    }

    let (status, body) = call(&client, addr, Method::GET, BUCKETS_PATH, Vec::new()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decode_bucket_list(&body).unwrap().len(), 16);

    server.abort();
}
