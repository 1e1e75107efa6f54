//! Greenroom - suspense-style data fetching for declarative render loops.
//!
//! This crate provides the two halves of suspense resolution:
//!
//! - [`Store`]: an explicitly constructed, shared cache of resolved values
//!   with a presence or TTL validity policy.
//! - [`Coordinator`]: resolves a `(key, fetch operation)` pair against the
//!   store, starting at most one fetch per key and reporting the outcome as
//!   an explicit [`Resolution`]: `Ready`, `Suspended`, or `Rejected`.
//!
//! A caller that receives `Suspended` awaits the carried [`Suspension`] and
//! resolves again; a `Rejected` outcome stands until the key is reset. The
//! `greenroom-runtime` crate provides the re-evaluation loop and the
//! placeholder/error-boundary collaborator contracts around this crate.
//!
//! # Example
//!
//! ```rust,ignore
//! use greenroom::{Coordinator, Resolution, Store};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let store = Store::new();
//!     let coordinator = Coordinator::new(store);
//!
//!     // First resolve: nothing cached, so the fetch starts and the caller
//!     // gets a suspension to await.
//!     let suspension = match coordinator.resolve("greeting", || async {
//!         Ok("hello".to_string())
//!     }) {
//!         Resolution::Suspended(suspension) => suspension,
//!         other => unreachable!("cold cache always suspends: {:?}", other),
//!     };
//!     suspension.settled().await;
//!
//!     // Second resolve: answered from the store, no fetch.
//!     let greeting = coordinator
//!         .resolve("greeting", || async { unreachable!() })
//!         .ready();
//!     assert_eq!(greeting.as_deref(), Some("hello"));
//! }
//! ```

pub mod coordinator;
pub mod error;
pub mod key;
pub mod resolution;
pub mod source;
pub mod store;

// Re-export commonly used types
pub use coordinator::{Coordinator, FetchStatus};
pub use error::{FetchError, Rejection, Result};
pub use key::CacheKey;
pub use resolution::{Interrupt, Resolution, Suspension};
pub use source::DataSource;
pub use store::{Store, StoreStats, Validity};
