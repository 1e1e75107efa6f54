//! Data-source trait for fetch origins modeled as objects.

use crate::coordinator::Coordinator;
use crate::error::Result;
use crate::key::CacheKey;
use crate::resolution::Resolution;
use async_trait::async_trait;
use std::sync::Arc;

/// An origin that can produce the value for a cache key.
///
/// Implement this when the fetch side is a client object rather than an ad
/// hoc closure; [`Coordinator::resolve_from`] adapts it to the resolve
/// contract. Implementations are shared across fetch tasks via `Arc`.
#[async_trait]
pub trait DataSource<T>: Send + Sync {
    /// Fetch the value for `key` from the origin.
    async fn fetch(&self, key: &CacheKey) -> Result<T>;
}

impl<T> Coordinator<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Resolve `key` against a shared data source.
    ///
    /// Equivalent to [`Coordinator::resolve`] with an operation that calls
    /// `source.fetch(key)`.
    pub fn resolve_from<S>(&self, key: impl Into<CacheKey>, source: &Arc<S>) -> Resolution<T>
    where
        S: DataSource<T> + ?Sized + 'static,
    {
        let key = key.into();
        let source = Arc::clone(source);
        let fetch_key = key.clone();
        self.resolve(key, move || async move { source.fetch(&fetch_key).await })
    }
}
