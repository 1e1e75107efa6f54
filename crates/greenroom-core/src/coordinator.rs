//! Suspense fetch coordinator.
//!
//! [`Coordinator::resolve`] is the single entry point: it answers from the
//! store when a valid value exists, otherwise starts at most one fetch per
//! key and reports a suspension the caller can await before re-invoking.
//! Failures settle as rejections that stand until the key is explicitly
//! reset or invalidated.
//!
//! Per-key lifecycle:
//!
//! ```text
//! initial --(cache valid)--> fulfilled
//! initial --(cache invalid, no outstanding fetch)--> pending
//! pending --(fetch succeeds)--> fulfilled
//! pending --(fetch fails)--> rejected
//! rejected --(reset / invalidate)--> initial
//! ```

use crate::error::{FetchError, Rejection, Result};
use crate::key::CacheKey;
use crate::resolution::{Resolution, Suspension};
use crate::store::Store;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Per-key fetch status, as observed from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    /// No fetch has been attempted and nothing valid is cached.
    Initial,
    /// A fetch is outstanding.
    Pending,
    /// A valid value is cached.
    Fulfilled,
    /// The last fetch failed and the failure has not been reset.
    Rejected,
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self {
            FetchStatus::Initial => "initial",
            FetchStatus::Pending => "pending",
            FetchStatus::Fulfilled => "fulfilled",
            FetchStatus::Rejected => "rejected",
        };
        f.write_str(status)
    }
}

/// Per-key residue tracked between resolve calls.
///
/// Fulfilled keys leave no slot: the store is the source of truth for
/// resolved values.
enum Slot {
    /// Fetch outstanding; the receiver settles when it completes.
    Pending { settled: watch::Receiver<bool> },
    /// Terminal failure, held until reset or invalidation.
    Rejected { error: FetchError },
}

/// Coordinates store reads, single-flight fetches, and suspension signaling.
///
/// A `Coordinator` is a cheap-clone handle: clones share the store and the
/// per-key state, and the single-flight guarantee holds across all of them.
/// Construct one per store and clone it into every consumer.
///
/// # Example
///
/// ```
/// use greenroom::{Coordinator, Resolution, Store};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let coordinator: Coordinator<String> = Coordinator::new(Store::new());
///
///     match coordinator.resolve("greeting", || async { Ok("hello".to_string()) }) {
///         Resolution::Ready(value) => println!("{}", value),
///         Resolution::Suspended(suspension) => {
///             // Wait for the fetch, then resolve again.
///             suspension.settled().await;
///         }
///         Resolution::Rejected(rejection) => eprintln!("{}", rejection),
///     }
/// }
/// ```
pub struct Coordinator<T> {
    store: Store<T>,
    slots: Arc<Mutex<HashMap<CacheKey, Slot>>>,
}

impl<T> Clone for Coordinator<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            slots: Arc::clone(&self.slots),
        }
    }
}

impl<T> Coordinator<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a coordinator over `store`.
    pub fn new(store: Store<T>) -> Self {
        Self {
            store,
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The store this coordinator resolves against.
    pub fn store(&self) -> &Store<T> {
        &self.store
    }

    /// Resolve `key`, invoking `op` only if no valid value is cached, no
    /// fetch is outstanding, and no rejection is recorded.
    ///
    /// Never blocks and never awaits; the started fetch runs as a spawned
    /// task, so this must be called from within a tokio runtime. On success
    /// the fetched value is written to the store strictly before suspension
    /// waiters wake, so a re-invocation after settlement observes it. On
    /// failure nothing is written to the store; the classified error is
    /// returned from every subsequent resolve for the key until
    /// [`Coordinator::reset`] or [`Coordinator::invalidate`]. A panic in
    /// the operation, while producing the future or while the task runs
    /// it, settles the key as rejected with [`FetchError::Unknown`].
    pub fn resolve<F, Fut>(&self, key: impl Into<CacheKey>, op: F) -> Resolution<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let key = key.into();

        // Store first: a valid value answers immediately and retires any
        // stale rejection for the key.
        if self.store.is_valid(&key) {
            if let Some(value) = self.store.read(&key) {
                let mut slots = self.slots.lock().unwrap();
                if matches!(slots.get(&key), Some(Slot::Rejected { .. })) {
                    slots.remove(&key);
                }
                drop(slots);
                debug!("Cache hit for {}", key);
                return Resolution::Ready(value);
            }
        }

        let mut slots = self.slots.lock().unwrap();
        match slots.get(&key) {
            Some(Slot::Pending { settled }) => {
                debug!("Fetch already outstanding for {}", key);
                let suspension = Suspension::new(key.clone(), settled.clone());
                return Resolution::Suspended(suspension);
            }
            Some(Slot::Rejected { error }) => {
                return Resolution::Rejected(Rejection {
                    key: key.clone(),
                    error: error.clone(),
                });
            }
            None => {}
        }

        // Single-flight: the pending slot is inserted under the same lock
        // acquisition that observed its absence.
        let (settled_tx, settled_rx) = watch::channel(false);
        slots.insert(
            key.clone(),
            Slot::Pending {
                settled: settled_rx.clone(),
            },
        );
        drop(slots);

        debug!("Starting fetch for {}", key);
        let fut = match std::panic::catch_unwind(AssertUnwindSafe(op)) {
            Ok(fut) => fut,
            Err(_) => {
                // `op` panicked while producing the future; settle as
                // rejected at once so the key is never left pending.
                warn!("Fetch operation for {} panicked before starting", key);
                let error = FetchError::Unknown;
                self.slots.lock().unwrap().insert(
                    key.clone(),
                    Slot::Rejected {
                        error: error.clone(),
                    },
                );
                let _ = settled_tx.send(true);
                return Resolution::Rejected(Rejection { key, error });
            }
        };
        let store = self.store.clone();
        let slots = Arc::clone(&self.slots);
        let task_key = key.clone();
        tokio::spawn(async move {
            let result = match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(result) => result,
                Err(_) => {
                    warn!("Fetch task for {} panicked", task_key);
                    Err(FetchError::Unknown)
                }
            };

            // A pending slot has one writer: this task, or the start path
            // when `op` panicked before the task existed. Either way the
            // transition below cannot clobber a newer attempt, and the
            // store write precedes the settlement send: a waiter that
            // wakes observes the fulfilled value.
            match result {
                Ok(value) => {
                    store.write(task_key.clone(), value);
                    slots.lock().unwrap().remove(&task_key);
                    debug!("Fetch fulfilled for {}", task_key);
                }
                Err(error) => {
                    warn!("Fetch rejected for {}: {}", task_key, error);
                    slots
                        .lock()
                        .unwrap()
                        .insert(task_key.clone(), Slot::Rejected { error });
                }
            }
            let _ = settled_tx.send(true);
        });

        Resolution::Suspended(Suspension::new(key, settled_rx))
    }

    /// Observed status for `key`.
    pub fn status(&self, key: &CacheKey) -> FetchStatus {
        match self.slots.lock().unwrap().get(key) {
            Some(Slot::Pending { .. }) => FetchStatus::Pending,
            Some(Slot::Rejected { .. }) => FetchStatus::Rejected,
            None => {
                if self.store.is_valid(key) {
                    FetchStatus::Fulfilled
                } else {
                    FetchStatus::Initial
                }
            }
        }
    }

    /// Clear a recorded rejection for `key` so the next resolve starts a
    /// fresh attempt. Returns whether a rejection was cleared.
    ///
    /// Pending fetches are left alone: an outstanding fetch always runs to
    /// completion, and clearing its slot would permit a duplicate in-flight
    /// fetch for the key.
    pub fn reset(&self, key: &CacheKey) -> bool {
        let mut slots = self.slots.lock().unwrap();
        if matches!(slots.get(key), Some(Slot::Rejected { .. })) {
            slots.remove(key);
            debug!("Reset rejected state for {}", key);
            true
        } else {
            false
        }
    }

    /// Drop the cached value and any recorded rejection for `key`, forcing
    /// the next resolve to fetch. Returns whether anything was dropped.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        let cleared = self.reset(key);
        let removed = self.store.invalidate(key);
        if removed {
            debug!("Invalidated cached value for {}", key);
        }
        removed || cleared
    }
}
