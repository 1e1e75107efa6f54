//! Collaborator contracts the scheduler notifies while driving a render.
//!
//! A [`Fallback`] stands in for suspended output, the way a loading
//! placeholder does; a [`Boundary`] receives rejections that end a render.

use greenroom::{CacheKey, Rejection};
use tracing::{error, info};

/// Placeholder collaborator shown while a resolution is suspended.
pub trait Fallback: Send + Sync {
    /// Called when a render pass suspends on `key`, before the scheduler
    /// awaits settlement.
    fn on_suspend(&self, key: &CacheKey);

    /// Called after the fetch for `key` settles and the scheduler is about
    /// to re-run the component.
    fn on_resume(&self, _key: &CacheKey) {}
}

/// Error collaborator that receives the rejection ending a render.
pub trait Boundary: Send + Sync {
    /// Called once with the rejection before the scheduler returns it.
    fn on_rejection(&self, rejection: &Rejection);
}

/// Fallback that reports suspensions through the tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFallback;

impl Fallback for LogFallback {
    fn on_suspend(&self, key: &CacheKey) {
        info!("Suspended on {}, showing fallback", key);
    }

    fn on_resume(&self, key: &CacheKey) {
        info!("Fetch for {} settled, re-rendering", key);
    }
}

/// Boundary that reports rejections through the tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogBoundary;

impl Boundary for LogBoundary {
    fn on_rejection(&self, rejection: &Rejection) {
        error!("Render failed: {}", rejection);
    }
}
