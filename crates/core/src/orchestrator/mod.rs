//! Booking orchestrator.
//!
//! Runs the bounded retry loop around a [`BookingClient`](crate::client::BookingClient):
//! `Idle -> Discovering -> Selecting -> Committing -> {Succeeded, Exhausted}`.

mod config;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use runner::{BookingOrchestrator, CancelHandle};
pub use types::{AttemptFailure, BookingOutcome, BookingState, OrchestratorError, RunMode};
