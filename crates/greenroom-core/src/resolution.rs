//! Resolution values returned by the fetch coordinator.
//!
//! A resolve call never blocks: it reports exactly one of three outcomes.
//! `Ready` carries the value. `Suspended` carries a settlement handle the
//! scheduler can await before re-evaluating, and `Rejected` carries the
//! classified failure for an error-handling collaborator.

use crate::error::Rejection;
use crate::key::CacheKey;
use thiserror::Error;
use tokio::sync::watch;

/// Outcome of a single resolve call.
#[derive(Debug, Clone)]
pub enum Resolution<T> {
    /// A valid cached value was available.
    Ready(T),
    /// A fetch is outstanding; re-invoke after the suspension settles.
    Suspended(Suspension),
    /// The last fetch failed; the failure stands until the key is reset.
    Rejected(Rejection),
}

impl<T> Resolution<T> {
    /// Whether this resolution carries a value.
    pub fn is_ready(&self) -> bool {
        matches!(self, Resolution::Ready(_))
    }

    /// The carried value, if ready.
    pub fn ready(self) -> Option<T> {
        match self {
            Resolution::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// Convert into a `Result`, mapping suspension and rejection onto
    /// [`Interrupt`] so component functions can early-return with `?`.
    pub fn into_result(self) -> std::result::Result<T, Interrupt> {
        match self {
            Resolution::Ready(value) => Ok(value),
            Resolution::Suspended(suspension) => Err(Interrupt::Suspended(suspension)),
            Resolution::Rejected(rejection) => Err(Interrupt::Rejected(rejection)),
        }
    }
}

/// Settlement handle for an outstanding fetch.
///
/// Settles exactly once, when the fetch completes (fulfilled or rejected).
/// Multiple waiters may each hold their own handle for the same fetch.
#[derive(Debug, Clone)]
pub struct Suspension {
    key: CacheKey,
    settled: watch::Receiver<bool>,
}

impl Suspension {
    pub(crate) fn new(key: CacheKey, settled: watch::Receiver<bool>) -> Self {
        Self { key, settled }
    }

    /// Key of the fetch this suspension waits on.
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Wait until the fetch has settled. Returns immediately if it already
    /// has.
    pub async fn settled(mut self) {
        // The completion task sends exactly once and then drops the sender,
        // so a closed channel also means settled.
        while !*self.settled.borrow() {
            if self.settled.changed().await.is_err() {
                break;
            }
        }
    }
}

/// A non-value outcome raised out of a component function.
///
/// Produced by [`Resolution::into_result`]; the scheduler matches on it to
/// decide between waiting for settlement and delegating a failure.
#[derive(Debug, Clone, Error)]
pub enum Interrupt {
    /// Evaluation suspended on an outstanding fetch.
    #[error("Suspended on {}", .0.key())]
    Suspended(Suspension),
    /// Evaluation hit a settled failure.
    #[error(transparent)]
    Rejected(#[from] Rejection),
}

impl Interrupt {
    /// Key the interrupt is bound to.
    pub fn key(&self) -> &CacheKey {
        match self {
            Interrupt::Suspended(suspension) => suspension.key(),
            Interrupt::Rejected(rejection) => &rejection.key,
        }
    }
}
