//! Manager behaviour over an in-process transport that dispatches straight
//! into the server's registry, without sockets

use std::sync::Arc;
use std::time::Duration;

use clustermgr_client::pending;
use clustermgr_client::*;
use clustermgr_core::*;
use clustermgr_engine::{NodeProfile, RegistryEngine};
use clustermgr_net::{OperationRequest, RawResponse, ResponseStatus};
use clustermgr_server::{dispatch, ServerState};
use proptest::prelude::*;
use tokio::runtime::{Handle, Runtime};

/// Hands requests to the server's dispatcher on the given runtime
struct LocalTransport {
    state: ServerState,
    handle: Handle,
}

impl Transport for LocalTransport {
    fn submit(&self, request: OperationRequest) -> PendingResult<RawResponse> {
        let context = OperationContext::new(request.kind, request.target.as_ref());
        let endpoint = match request.endpoint() {
            Ok(endpoint) => endpoint,
            Err(e) => {
                let response = RawResponse::error(ResponseStatus::BadRequest, e.to_string());
                return PendingResult::ready(context, Ok(response));
            }
        };
        let body = request.body().unwrap_or_default();

        let (completer, pending) = pending::channel(context);
        let state = self.state.clone();
        self.handle.spawn(async move {
            completer.complete(Ok(dispatch(&state, endpoint, &body)));
        });

        pending
    }

    fn runtime(&self) -> &Handle {
        &self.handle
    }
}

fn local_state() -> (ServerState, tempfile::TempDir) {
    let (engine, temp) = RegistryEngine::temp().unwrap();
    let state = ServerState::new(engine, NodeProfile::default()).unwrap();
    (state, temp)
}

fn blocking_manager(runtime: &Runtime) -> (ClusterManager, tempfile::TempDir) {
    let (state, temp) = local_state();
    let transport = LocalTransport {
        state,
        handle: runtime.handle().clone(),
    };
    let manager = ClusterManager::new(
        AsyncClusterManager::new(Arc::new(transport)),
        Duration::from_secs(5),
    )
    .unwrap();
    (manager, temp)
}

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap()
}

fn name(s: &str) -> BucketName {
    BucketName::new(s).unwrap()
}

#[test]
fn memcached_buckets_come_back_normalized() {
    let rt = runtime();
    let (manager, _temp) = blocking_manager(&rt);

    let cache = BucketSettings::builder(name("cache"))
        .bucket_type(BucketType::Memcached)
        .quota_mb(128)
        .replicas(2)
        .index_replicas(true)
        .build()
        .unwrap();

    let accepted = manager.insert_bucket(&cache).unwrap();
    assert_eq!(accepted.replicas(), 0);
    assert!(!accepted.index_replicas());

    let stored = manager.bucket(&name("cache")).unwrap().unwrap();
    assert_eq!(stored, accepted);
}

#[test]
fn async_manager_composes_concurrent_calls() {
    let rt = runtime();
    let (manager, _temp) = blocking_manager(&rt);
    let async_manager = manager.async_manager().clone();

    let names: Vec<BucketName> = (0..8).map(|i| name(&format!("bucket-{}", i))).collect();

    let results = rt.block_on(async {
        let inserts = names.iter().map(|n| {
            let settings = BucketSettings::builder(n.clone()).quota_mb(100).build().unwrap();
            async_manager.insert_bucket(&settings)
        });
        futures::future::join_all(inserts).await
    });
    assert!(results.iter().all(|r| r.is_ok()));

    // Both surfaces observe the same registry
    let listed = manager.buckets().unwrap();
    assert_eq!(listed.len(), names.len());
    for n in &names {
        assert!(manager.has_bucket(n).unwrap());
    }
}

#[test]
fn racing_inserts_have_one_winner() {
    let rt = runtime();
    let (manager, _temp) = blocking_manager(&rt);
    let async_manager = manager.async_manager().clone();
    let settings = BucketSettings::builder(name("contended")).build().unwrap();

    let outcomes = rt.block_on(async {
        let attempts = (0..6).map(|_| async_manager.insert_bucket(&settings));
        futures::future::join_all(attempts).await
    });

    let winners = outcomes.iter().filter(|r| r.is_ok()).count();
    let conflicts = outcomes
        .iter()
        .filter(|r| matches!(r, Err(e) if e.kind() == ErrorKind::AlreadyExists))
        .count();
    assert_eq!(winners, 1);
    assert_eq!(conflicts, outcomes.len() - 1);
}

#[test]
fn type_change_on_update_is_rejected() {
    let rt = runtime();
    let (manager, _temp) = blocking_manager(&rt);

    manager
        .insert_bucket(&BucketSettings::builder(name("typed")).build().unwrap())
        .unwrap();

    let retyped = BucketSettings::builder(name("typed"))
        .bucket_type(BucketType::Ephemeral)
        .build()
        .unwrap();
    let err = manager.update_bucket(&retyped).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransportFailure);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn props_insert_then_get_agrees(
        bucket in "[a-z0-9][a-z0-9._-]{0,30}",
        quota in 100..2_000u64,
        replicas in 0..=3u8,
        flush in any::<bool>(),
    ) {
        let rt = runtime();
        let (manager, _temp) = blocking_manager(&rt);

        let settings = BucketSettings::builder(name(&bucket))
            .quota_mb(quota)
            .replicas(replicas)
            .flush_enabled(flush)
            .build()
            .unwrap();

        prop_assert!(!manager.has_bucket(settings.name()).unwrap());
        manager.insert_bucket(&settings).unwrap();
        prop_assert_eq!(manager.bucket(settings.name()).unwrap(), Some(settings.clone()));
        prop_assert!(manager.has_bucket(settings.name()).unwrap());

        prop_assert!(manager.remove_bucket(settings.name()).unwrap());
        prop_assert!(!manager.remove_bucket(settings.name()).unwrap());
        prop_assert_eq!(manager.bucket(settings.name()).unwrap(), None);
    }
}
