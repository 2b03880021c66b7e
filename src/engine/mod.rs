// src/engine/mod.rs

//! Orchestration engine.
//!
//! - [`outcome`] turns one launcher's event stream into a single
//!   success/failure [`Outcome`].
//! - [`chain`] runs launches one after another and stops at the first
//!   failure.

pub mod chain;
pub mod outcome;

pub use chain::{
    AfterStartFn, BeforeStartFn, ChainLink, ChainOrchestrator, ChainReport, LinkCallback,
    LinkObserver,
};
pub use outcome::{LifecycleOutcome, Outcome, PendingOutcome};
