//! Render scheduler that drives a component to a settled output.
//!
//! A component is a synchronous closure evaluated repeatedly:
//! - It returns `Ok(output)` when every resolution it needs is ready.
//! - It returns `Err(Interrupt::Suspended)` when a fetch is outstanding;
//!   the scheduler shows the fallback, awaits settlement, and re-runs it.
//! - It returns `Err(Interrupt::Rejected)` when a fetch failed; the
//!   scheduler hands the rejection to the boundary and stops.

use crate::collab::{Boundary, Fallback, LogBoundary, LogFallback};
use greenroom::{Interrupt, Rejection};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Configuration for scheduler behavior.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Maximum number of render passes before giving up (including the
    /// first one).
    pub max_passes: usize,
}

impl SchedulerConfig {
    /// Default pass budget. A well-behaved component settles in one pass
    /// per distinct fetch it performs, so this is generous.
    pub const DEFAULT_MAX_PASSES: usize = 32;

    /// Create a new scheduler config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of render passes.
    pub fn with_max_passes(mut self, passes: usize) -> Self {
        self.max_passes = passes;
        self
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_passes: SchedulerConfig::DEFAULT_MAX_PASSES,
        }
    }
}

/// Why a render did not produce output.
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    /// A fetch the component depends on failed.
    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// The component kept suspending past the pass budget.
    #[error("Component did not settle within {passes} render passes")]
    Unsettled {
        /// Number of passes that were run.
        passes: usize,
    },
}

/// Drives components through suspend-and-resume cycles until they settle.
///
/// The scheduler owns the collaborators a declarative UI would mount
/// around a component: a [`Fallback`] notified while output is suspended
/// and a [`Boundary`] notified when a rejection ends the render.
#[derive(Clone)]
pub struct Scheduler {
    fallback: Arc<dyn Fallback>,
    boundary: Arc<dyn Boundary>,
    config: SchedulerConfig,
}

impl Scheduler {
    /// Create a scheduler with logging collaborators and default config.
    pub fn new() -> Self {
        Self {
            fallback: Arc::new(LogFallback),
            boundary: Arc::new(LogBoundary),
            config: SchedulerConfig::default(),
        }
    }

    /// Start building a scheduler with custom collaborators.
    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::default()
    }

    /// Evaluate `component` until it settles.
    ///
    /// Each pass runs the component synchronously. A suspended pass parks
    /// here until the underlying fetch settles, then re-runs the
    /// component; by then the coordinator has already published the
    /// fulfilled value, so the re-run observes it. A rejected pass stops
    /// the render and surfaces the rejection. When the final budgeted pass
    /// suspends, the render stops without waiting on that settlement and
    /// returns [`RenderError::Unsettled`].
    pub async fn render<T, F>(&self, mut component: F) -> Result<T, RenderError>
    where
        F: FnMut() -> Result<T, Interrupt>,
    {
        for pass in 1..=self.config.max_passes {
            match component() {
                Ok(output) => {
                    debug!("Render settled on pass {}", pass);
                    return Ok(output);
                }
                Err(Interrupt::Suspended(suspension)) => {
                    let key = suspension.key().clone();
                    debug!("Pass {} suspended on {}", pass, key);
                    if pass == self.config.max_passes {
                        // No re-run follows; do not engage the fallback or
                        // wait on a settlement that cannot be used.
                        break;
                    }
                    self.fallback.on_suspend(&key);
                    suspension.settled().await;
                    self.fallback.on_resume(&key);
                }
                Err(Interrupt::Rejected(rejection)) => {
                    self.boundary.on_rejection(&rejection);
                    return Err(RenderError::Rejected(rejection));
                }
            }
        }

        warn!(
            "Render did not settle within {} passes",
            self.config.max_passes
        );
        Err(RenderError::Unsettled {
            passes: self.config.max_passes,
        })
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`Scheduler`].
#[derive(Default)]
pub struct SchedulerBuilder {
    fallback: Option<Arc<dyn Fallback>>,
    boundary: Option<Arc<dyn Boundary>>,
    config: SchedulerConfig,
}

impl SchedulerBuilder {
    /// Set the fallback notified while renders are suspended.
    pub fn with_fallback(mut self, fallback: Arc<dyn Fallback>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Set the boundary notified when a rejection ends a render.
    pub fn with_boundary(mut self, boundary: Arc<dyn Boundary>) -> Self {
        self.boundary = Some(boundary);
        self
    }

    /// Set the scheduler configuration.
    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the scheduler, falling back to logging collaborators for any
    /// not provided.
    pub fn build(self) -> Scheduler {
        Scheduler {
            fallback: self.fallback.unwrap_or_else(|| Arc::new(LogFallback)),
            boundary: self.boundary.unwrap_or_else(|| Arc::new(LogBoundary)),
            config: self.config,
        }
    }
}
