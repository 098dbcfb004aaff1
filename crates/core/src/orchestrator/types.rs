//! Types for the booking orchestrator.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::client::{BookingClientError, BookingConfirmation, BookingStep, Slot};

/// Errors that end a run without exhausting its attempts.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// A platform error that retrying cannot fix (schema change, missing
    /// payment method, bad credentials).
    #[error(transparent)]
    Client(BookingClientError),

    /// The final commit failed without a definitive answer. The reservation
    /// may exist and must be checked on the platform before trying again.
    #[error("commit outcome unknown, verify the reservation manually: {0}")]
    CommitUnverified(BookingClientError),
}

impl OrchestratorError {
    pub fn client_error(&self) -> &BookingClientError {
        match self {
            OrchestratorError::Client(e) | OrchestratorError::CommitUnverified(e) => e,
        }
    }
}

/// States of a single orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingState {
    Idle,
    Discovering,
    Selecting,
    Committing,
    Succeeded,
    Exhausted,
}

impl fmt::Display for BookingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BookingState::Idle => "idle",
            BookingState::Discovering => "discovering",
            BookingState::Selecting => "selecting",
            BookingState::Committing => "committing",
            BookingState::Succeeded => "succeeded",
            BookingState::Exhausted => "exhausted",
        };
        f.write_str(name)
    }
}

/// Whether a run commits the selected slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Book,
    /// Discover and select only; never calls `book_slot`.
    DryRun,
}

/// Why a single attempt did not produce a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttemptFailure {
    /// The venue reported no openings.
    NoSlots,
    /// Openings exist, none at an acceptable time.
    NoMatch { available: usize },
    /// A transient platform error.
    Platform { step: BookingStep, message: String },
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptFailure::NoSlots => write!(f, "no slots available"),
            AttemptFailure::NoMatch { available } => {
                write!(f, "{} slots available, none at a preferred time", available)
            }
            AttemptFailure::Platform { message, .. } => f.write_str(message),
        }
    }
}

/// Terminal result of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum BookingOutcome {
    /// The slot was committed.
    Booked {
        confirmation: BookingConfirmation,
        slot: Slot,
        attempts: u32,
    },
    /// Dry run: the slot that would have been booked.
    Selected { slot: Slot, attempts: u32 },
    /// Every attempt failed; one entry per attempt, in order.
    Exhausted {
        attempts: u32,
        failures: Vec<AttemptFailure>,
    },
}

impl BookingOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, BookingOutcome::Exhausted { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            BookingOutcome::Booked { attempts, .. }
            | BookingOutcome::Selected { attempts, .. }
            | BookingOutcome::Exhausted { attempts, .. } => *attempts,
        }
    }

    /// The failure reason of the final attempt, if the run was exhausted.
    pub fn last_failure(&self) -> Option<&AttemptFailure> {
        match self {
            BookingOutcome::Exhausted { failures, .. } => failures.last(),
            _ => None,
        }
    }
}
