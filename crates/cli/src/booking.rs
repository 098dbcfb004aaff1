//! One booking run on behalf of a caller.
//!
//! Shared by the `book` command and the invocation endpoint.

use thiserror::Error;
use tracing::info;

use oddjob_core::{
    BookingClientError, BookingOrchestrator, BookingOutcome, BookingRequest, OrchestratorError,
    Platform, RequestError, RunMode,
};

use crate::state::AppState;

#[derive(Debug, Error)]
pub enum BookingError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("{0} is not configured, add a [{0}] section to your config")]
    NotConfigured(Platform),

    #[error(transparent)]
    Run(#[from] OrchestratorError),
}

impl BookingError {
    /// Whether the caller can fix this by changing the request or config.
    pub fn is_caller_error(&self) -> bool {
        match self {
            BookingError::Request(_) | BookingError::NotConfigured(_) => true,
            BookingError::Run(OrchestratorError::Client(e)) => matches!(
                e,
                BookingClientError::InvalidInput { .. } | BookingClientError::NotConfigured { .. }
            ),
            BookingError::Run(OrchestratorError::CommitUnverified(_)) => false,
        }
    }
}

/// Validate `request`, then run the orchestrator against the matching client.
pub async fn run_request(
    state: &AppState,
    request: BookingRequest,
) -> Result<BookingOutcome, BookingError> {
    let platform = request.platform;
    let retries = request.retries;
    let mode = if request.dry_run {
        RunMode::DryRun
    } else {
        RunMode::Book
    };

    let plan = request.into_plan(state.today())?;
    let client = state
        .client(platform)
        .ok_or(BookingError::NotConfigured(platform))?
        .map_err(OrchestratorError::Client)?;

    let mut orchestrator = BookingOrchestrator::new(state.orchestrator_config().clone());
    if let Some(max_attempts) = retries {
        orchestrator = orchestrator.with_max_attempts(max_attempts);
    }

    if mode == RunMode::DryRun {
        info!("Dry run, the selected slot will not be booked");
    }

    Ok(orchestrator.run(client.as_ref(), &plan, mode).await?)
}
