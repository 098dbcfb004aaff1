//! Booking orchestrator implementation.
//!
//! Drives one booking run through discover, select and commit, retrying the
//! whole cycle on transient failures up to the configured attempt bound.
//! Attempts are strictly sequential.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::client::{BookingClient, BookingClientError, BookingStep};
use crate::request::BookingPlan;
use crate::selection::{format_time, select_best_slot};

use super::config::OrchestratorConfig;
use super::types::{AttemptFailure, BookingOutcome, BookingState, OrchestratorError, RunMode};

/// The booking orchestrator.
pub struct BookingOrchestrator {
    config: OrchestratorConfig,
    cancelled: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

/// Stops an orchestrator before its next attempt.
///
/// A pending retry delay is cut short; in-flight requests are not
/// interrupted. Cancellation is permanent: every later `run` on the same
/// orchestrator ends before its first attempt.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.wake.notify_waiters();
    }
}

impl BookingOrchestrator {
    /// Create a new orchestrator.
    pub fn new(config: OrchestratorConfig) -> Self {
        Self {
            config,
            cancelled: Arc::new(AtomicBool::new(false)),
            wake: Arc::new(Notify::new()),
        }
    }

    /// Override the attempt bound (minimum 1).
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.config.max_attempts = max_attempts.max(1);
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            cancelled: Arc::clone(&self.cancelled),
            wake: Arc::clone(&self.wake),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Run discover, select and commit until a booking succeeds or the
    /// attempts run out.
    ///
    /// Only transient platform errors consume an attempt; anything else ends
    /// the run with an error.
    pub async fn run(
        &self,
        client: &dyn BookingClient,
        plan: &BookingPlan,
        mode: RunMode,
    ) -> Result<BookingOutcome, OrchestratorError> {
        if client.platform() != plan.platform {
            return Err(OrchestratorError::Client(BookingClientError::InvalidInput {
                platform: client.platform(),
                message: format!("plan targets {}", plan.platform),
            }));
        }

        let max_attempts = self.config.max_attempts.max(1);
        let mut state = BookingState::Idle;
        let mut failures = Vec::new();

        info!(
            platform = %plan.platform,
            venue_id = %plan.venue_id,
            date = %plan.date,
            party_size = plan.party_size,
            preferred_times = plan.preferred_times.len(),
            max_attempts,
            "Starting booking run"
        );

        for attempt in 1..=max_attempts {
            if self.is_cancelled() {
                info!(attempt, "Booking run cancelled");
                break;
            }

            transition(&mut state, BookingState::Discovering);
            info!(attempt, max_attempts, "Booking attempt");

            let failure = match client
                .find_slots(&plan.venue_id, plan.date, plan.party_size)
                .await
            {
                Err(e) => classify(e)?,
                Ok(slots) if slots.is_empty() => AttemptFailure::NoSlots,
                Ok(slots) => {
                    transition(&mut state, BookingState::Selecting);
                    info!(count = slots.len(), "Found available slots");

                    let selected = select_best_slot(
                        &slots,
                        &plan.preferred_times,
                        plan.table_types.as_deref(),
                    );

                    match selected {
                        None => AttemptFailure::NoMatch {
                            available: slots.len(),
                        },
                        Some(slot) => {
                            let slot = slot.clone();
                            info!(
                                time = %format_time(slot.time),
                                table_type = %slot.table_type,
                                "Selected slot"
                            );

                            if mode == RunMode::DryRun {
                                transition(&mut state, BookingState::Succeeded);
                                return Ok(BookingOutcome::Selected { slot, attempts: attempt });
                            }

                            transition(&mut state, BookingState::Committing);
                            match client.book_slot(&slot, plan.date, plan.party_size).await {
                                Ok(confirmation) => {
                                    transition(&mut state, BookingState::Succeeded);
                                    info!(
                                        confirmation_id = %confirmation.confirmation_id,
                                        attempt,
                                        "Reservation confirmed"
                                    );
                                    return Ok(BookingOutcome::Booked {
                                        confirmation,
                                        slot,
                                        attempts: attempt,
                                    });
                                }
                                Err(e) => classify(e)?,
                            }
                        }
                    }
                }
            };

            warn!(attempt, max_attempts, reason = %failure, "Attempt failed");
            failures.push(failure);

            if attempt < max_attempts {
                self.pause().await;
            }
        }

        transition(&mut state, BookingState::Exhausted);
        let attempts = failures.len() as u32;
        warn!(attempts, "Booking attempts exhausted");

        Ok(BookingOutcome::Exhausted { attempts, failures })
    }
}

impl BookingOrchestrator {
    /// Sleep the retry delay, returning early on cancel.
    async fn pause(&self) {
        let woken = self.wake.notified();
        if self.is_cancelled() {
            return;
        }

        tokio::select! {
            _ = tokio::time::sleep(self.config.retry_delay()) => {}
            _ = woken => debug!("Retry delay interrupted by cancel"),
        }
    }
}

fn transition(state: &mut BookingState, next: BookingState) {
    debug!(from = %state, to = %next, "Booking state transition");
    *state = next;
}

/// Turn a transient error into an attempt failure; anything else ends the run.
fn classify(error: BookingClientError) -> Result<AttemptFailure, OrchestratorError> {
    if error.is_transient() {
        return Ok(AttemptFailure::Platform {
            step: error.step().unwrap_or(BookingStep::Discover),
            message: error.to_string(),
        });
    }

    if error.is_ambiguous_commit() {
        return Err(OrchestratorError::CommitUnverified(error));
    }

    Err(OrchestratorError::Client(error))
}
