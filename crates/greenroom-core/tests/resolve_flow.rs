//! Integration tests for the resolve lifecycle over the public API.
//!
//! These exercise the store and coordinator together the way a render loop
//! would: resolve, await settlement, resolve again.

use greenroom::{Coordinator, FetchError, FetchStatus, Resolution, Store};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Character {
    id: u32,
    name: String,
}

fn spider_man() -> Character {
    Character {
        id: 1,
        name: "Spider-Man".to_string(),
    }
}

/// Scenario: cold cache. The first resolve suspends and starts the fetch;
/// once it settles, the next resolve returns the fetched value.
#[tokio::test]
async fn cold_cache_suspends_then_returns_value() {
    let coordinator = Coordinator::new(Store::new());
    let calls = Arc::new(AtomicU32::new(0));

    let resolution = {
        let calls = calls.clone();
        coordinator.resolve("char:1", move || {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok(spider_man()) }
        })
    };
    let Resolution::Suspended(suspension) = resolution else {
        panic!("expected suspension on cold cache");
    };
    assert_eq!(coordinator.status(&"char:1".into()), FetchStatus::Pending);

    suspension.settled().await;

    match coordinator.resolve("char:1", || async { Ok(spider_man()) }) {
        Resolution::Ready(character) => assert_eq!(character, spider_man()),
        other => panic!("expected ready, got {:?}", other),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

/// Scenario: warm cache. A valid value short-circuits resolve and the
/// operation is never invoked.
#[tokio::test]
async fn warm_cache_returns_immediately_without_fetch() {
    let store = Store::new();
    store.write("char:1", spider_man());
    let coordinator = Coordinator::new(store.clone());

    let calls = Arc::new(AtomicU32::new(0));
    let resolution = {
        let calls = calls.clone();
        coordinator.resolve("char:1", move || {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok(spider_man()) }
        })
    };

    match resolution {
        Resolution::Ready(character) => assert_eq!(character, spider_man()),
        other => panic!("expected ready, got {:?}", other),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.stats().hits, 1);
}

/// Scenario: failing fetch. The failure surfaces as a classified rejection
/// with a stable message, is never cached, and a fresh operation after reset
/// re-attempts the fetch.
#[tokio::test]
async fn failed_fetch_surfaces_rejection_then_reset_reattempts() {
    let coordinator: Coordinator<Character> = Coordinator::new(Store::new());

    let Resolution::Suspended(suspension) = coordinator.resolve("char:1", || async {
        Err(FetchError::api("Failed to fetch characters"))
    }) else {
        panic!("expected suspension on first attempt");
    };
    suspension.settled().await;

    match coordinator.resolve("char:1", || async { Ok(spider_man()) }) {
        Resolution::Rejected(rejection) => {
            assert_eq!(rejection.key.as_str(), "char:1");
            assert_eq!(rejection.error.to_string(), "Failed to fetch characters");
        }
        other => panic!("expected rejection, got {:?}", other),
    }
    assert!(coordinator.store().is_empty());

    // The caller's explicit retry: reset, then resolve with a fresh operation.
    assert!(coordinator.reset(&"char:1".into()));
    let calls = Arc::new(AtomicU32::new(0));
    let resolution = {
        let calls = calls.clone();
        coordinator.resolve("char:1", move || {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok(spider_man()) }
        })
    };
    let Resolution::Suspended(suspension) = resolution else {
        panic!("expected suspension on retry");
    };
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    suspension.settled().await;
    let resolution = coordinator.resolve("char:1", || async { Ok(spider_man()) });
    assert_eq!(resolution.ready(), Some(spider_man()));
}

/// While one fetch is outstanding, resolves from cloned handles join it
/// instead of starting duplicates.
#[tokio::test]
async fn single_flight_across_cloned_handles() {
    let coordinator: Coordinator<Character> = Coordinator::new(Store::new());
    let calls = Arc::new(AtomicU32::new(0));
    let (gate_tx, gate_rx) = tokio::sync::oneshot::channel::<()>();

    let first = {
        let calls = calls.clone();
        coordinator.resolve("char:1", move || {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                let _ = gate_rx.await;
                Ok(spider_man())
            }
        })
    };
    assert!(matches!(first, Resolution::Suspended(_)));

    let clone = coordinator.clone();
    let second = {
        let calls = calls.clone();
        clone.resolve("char:1", move || {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok(spider_man()) }
        })
    };
    let Resolution::Suspended(suspension) = second else {
        panic!("expected suspension while fetch is parked");
    };
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    gate_tx.send(()).unwrap();
    suspension.settled().await;

    let resolution = coordinator.resolve("char:1", || async { Ok(spider_man()) });
    assert_eq!(resolution.ready(), Some(spider_man()));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

/// After a successful fetch, every subsequent resolve observes exactly the
/// fetched value until invalidation.
#[tokio::test]
async fn settled_value_stays_visible_across_resolves() {
    let coordinator = Coordinator::new(Store::new());

    let Resolution::Suspended(suspension) =
        coordinator.resolve("char:1", || async { Ok(spider_man()) })
    else {
        panic!("expected suspension");
    };
    suspension.settled().await;

    for _ in 0..3 {
        let resolution = coordinator.resolve("char:1", || async { Ok(spider_man()) });
        assert_eq!(resolution.ready(), Some(spider_man()));
    }

    coordinator.invalidate(&"char:1".into());
    assert_eq!(coordinator.status(&"char:1".into()), FetchStatus::Initial);
}

/// Failures for one key never leak into resolutions for another.
#[tokio::test]
async fn keys_resolve_independently() {
    let coordinator: Coordinator<Character> = Coordinator::new(Store::new());

    let ok = coordinator.resolve("char:1", || async { Ok(spider_man()) });
    let failing = coordinator.resolve("char:2", || async {
        Err(FetchError::api("API error occurred"))
    });

    let Resolution::Suspended(ok_suspension) = ok else {
        panic!("expected suspension for char:1");
    };
    let Resolution::Suspended(failing_suspension) = failing else {
        panic!("expected suspension for char:2");
    };
    ok_suspension.settled().await;
    failing_suspension.settled().await;

    let resolution = coordinator.resolve("char:1", || async { Ok(spider_man()) });
    assert_eq!(resolution.ready(), Some(spider_man()));

    match coordinator.resolve("char:2", || async { Ok(spider_man()) }) {
        Resolution::Rejected(rejection) => {
            assert_eq!(rejection.key.as_str(), "char:2");
            assert!(rejection.error.is_classified());
        }
        other => panic!("expected rejection for char:2, got {:?}", other),
    }
}

/// Under a TTL policy an expired entry stops answering resolves and a new
/// fetch starts.
#[tokio::test(start_paused = true)]
async fn expired_entry_triggers_refetch() {
    let coordinator = Coordinator::new(Store::with_ttl(Duration::from_secs(60)));
    let calls = Arc::new(AtomicU32::new(0));

    let op = |calls: &Arc<AtomicU32>| {
        let calls = calls.clone();
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok(spider_man()) }
        }
    };

    let Resolution::Suspended(suspension) = coordinator.resolve("char:1", op(&calls)) else {
        panic!("expected suspension");
    };
    suspension.settled().await;
    assert!(coordinator.resolve("char:1", op(&calls)).is_ready());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    tokio::time::advance(Duration::from_secs(61)).await;
    assert_eq!(coordinator.status(&"char:1".into()), FetchStatus::Initial);

    let Resolution::Suspended(suspension) = coordinator.resolve("char:1", op(&calls)) else {
        panic!("expected refetch after expiry");
    };
    suspension.settled().await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(coordinator.resolve("char:1", op(&calls)).is_ready());
}

/// Statuses serialize to the wire strings observability consumers expect.
#[test]
fn status_serializes_to_wire_strings() {
    assert_eq!(
        serde_json::to_string(&FetchStatus::Initial).unwrap(),
        "\"initial\""
    );
    assert_eq!(
        serde_json::to_string(&FetchStatus::Pending).unwrap(),
        "\"pending\""
    );
    assert_eq!(
        serde_json::to_string(&FetchStatus::Fulfilled).unwrap(),
        "\"fulfilled\""
    );
    assert_eq!(
        serde_json::to_string(&FetchStatus::Rejected).unwrap(),
        "\"rejected\""
    );

    let status: FetchStatus = serde_json::from_str("\"fulfilled\"").unwrap();
    assert_eq!(status, FetchStatus::Fulfilled);
}
