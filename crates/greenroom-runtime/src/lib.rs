//! Greenroom Runtime - render scheduling on top of greenroom resolutions.
//!
//! This crate turns the tagged resolutions produced by a
//! [`greenroom::Coordinator`] into a running render loop. A component is a
//! synchronous closure; the [`Scheduler`] evaluates it, parks on any
//! suspension it reports, and re-evaluates after settlement until the
//! component produces output or a rejection. Collaborators are notified at
//! each step, standing in for the loading placeholder and error boundary a
//! declarative UI would mount.
//!
//! # Modules
//!
//! - `collab` - Fallback and boundary contracts notified during a render
//! - `scheduler` - The pass-limited render loop

pub mod collab;
pub mod scheduler;

// Re-export commonly used types
pub use collab::{Boundary, Fallback, LogBoundary, LogFallback};
pub use scheduler::{RenderError, Scheduler, SchedulerBuilder, SchedulerConfig};

// Re-export greenroom types that are commonly needed with the scheduler
pub use greenroom::{Interrupt, Resolution};
