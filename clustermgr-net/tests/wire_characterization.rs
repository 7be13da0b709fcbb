//! Characterization tests for the management wire format
//! These tests pin the payload shapes exchanged with the server

use clustermgr_core::*;
use clustermgr_net::*;
use proptest::prelude::*;

/// A bucket listing in the shape the server emits, with fields the client
/// does not model
const LISTING: &str = r#"[
    {"name":"travel-sample","bucketType":"couchbase","ramQuotaMB":256,"replicaNumber":1,
     "replicaIndex":true,"authType":"none","saslPassword":"","proxyPort":0,"flushEnabled":false,
     "basicStats":{"itemCount":31591}},
    {"name":"sessions","bucketType":"memcached","ramQuotaMB":100,"authType":"sasl",
     "saslPassword":"s3cret","proxyPort":11212,"flushEnabled":true}
]"#;

#[test]
fn wire_listing_decodes_known_fields() {
    let buckets = decode_bucket_list(LISTING.as_bytes()).unwrap();
    assert_eq!(buckets.len(), 2);

    let travel = &buckets[0];
    assert_eq!(travel.name().as_str(), "travel-sample");
    assert_eq!(travel.quota_mb(), 256);
    assert!(travel.index_replicas());
    assert!(travel.bucket_type().is_persistent());

    let sessions = &buckets[1];
    assert_eq!(sessions.bucket_type(), BucketType::Memcached);
    assert_eq!(sessions.auth_type(), AuthType::Sasl);
    assert_eq!(sessions.port(), 11212);
    assert!(sessions.flush_enabled());
}

#[test]
fn wire_one_bad_entry_fails_the_listing() {
    let listing = r#"[{"name":"ok","ramQuotaMB":100},{"name":"not ok","ramQuotaMB":100}]"#;
    assert!(matches!(
        decode_bucket_list(listing.as_bytes()),
        Err(ProtocolError::MalformedBody(_))
    ));
}

#[test]
fn wire_cluster_info_shape() {
    let info = ClusterInfo::new(
        vec![NodeInfo {
            hostname: "10.0.0.1:8091".to_string(),
            version: "7.2.0-5325-enterprise".to_string(),
            status: NodeStatus::Healthy,
            services: vec!["kv".to_string(), "n1ql".to_string()],
        }],
        StorageTotals {
            ram_total: 8 << 30,
            ram_quota_total: 1 << 30,
            ..StorageTotals::default()
        },
    );

    let json: serde_json::Value = serde_json::from_slice(&encode_cluster_info(&info)).unwrap();
    assert_eq!(json["nodes"][0]["status"], "healthy");
    assert_eq!(json["storage"]["ram_total"], 8u64 << 30);

    let decoded = decode_cluster_info(&encode_cluster_info(&info)).unwrap();
    assert_eq!(decoded.min_version(), Some(ServerVersion::new(7, 2, 0)));
}

#[test]
fn wire_cluster_info_rejects_listing_body() {
    assert!(decode_cluster_info(LISTING.as_bytes()).is_err());
}

proptest! {
    #[test]
    fn wire_decode_never_panics(body in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = decode_settings(&body);
        let _ = decode_bucket_list(&body);
        let _ = decode_cluster_info(&body);
        let _ = decode_error(&body);
    }

    #[test]
    fn wire_request_routes_resolve_back(name in "[a-z0-9_-]{1,40}") {
        let name = BucketName::new(&name).unwrap();
        let requests = [
            OperationRequest::get_bucket(name.clone()),
            OperationRequest::has_bucket(name.clone()),
            OperationRequest::remove_bucket(name),
        ];

        for request in requests {
            let endpoint = request.endpoint().unwrap();
            let parsed = Endpoint::parse(endpoint.method(), &endpoint.path()).unwrap();
            prop_assert_eq!(parsed, endpoint);
        }
    }
}
