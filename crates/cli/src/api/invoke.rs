//! Scheduler invocation handler.
//!
//! A one-shot trigger posts the serialized booking request here at the
//! moment reservations open.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use oddjob_core::{
    selection::format_time, AttemptFailure, BookingConfirmation, BookingOutcome, BookingRequest,
    Slot,
};

use crate::booking::{run_request, BookingError};
use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

/// The slot that was booked or would have been booked
#[derive(Debug, Serialize)]
pub struct SlotSummary {
    pub venue_id: String,
    pub time: String,
    pub table_type: String,
}

impl From<&Slot> for SlotSummary {
    fn from(slot: &Slot) -> Self {
        Self {
            venue_id: slot.venue_id.clone(),
            time: format_time(slot.time),
            table_type: slot.table_type.clone(),
        }
    }
}

/// Response for a completed run
#[derive(Debug, Serialize)]
pub struct InvokeResponse {
    pub success: bool,
    pub dry_run: bool,
    pub attempts: u32,
    pub slot: SlotSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<BookingConfirmation>,
}

/// Response for a run that did not book
#[derive(Debug, Serialize)]
pub struct InvokeFailureResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_failure: Option<AttemptFailure>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct InvokeErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Run one booking request to completion
pub async fn invoke(
    State(state): State<Arc<AppState>>,
    body: Result<Json<BookingRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    info!(
        platform = %request.platform,
        venue_id = %request.venue_id,
        date = %request.date,
        dry_run = request.dry_run,
        "Invocation received"
    );

    match run_request(&state, request).await {
        Ok(outcome) => outcome_response(outcome),
        Err(e) if e.is_caller_error() => {
            warn!("Rejected invocation: {}", e);
            bad_request(e.to_string())
        }
        Err(e) => {
            error!("Booking failed: {}", e);
            platform_failure(&e)
        }
    }
}

fn outcome_response(outcome: BookingOutcome) -> Response {
    match outcome {
        BookingOutcome::Booked {
            confirmation,
            slot,
            attempts,
        } => (
            StatusCode::OK,
            Json(InvokeResponse {
                success: true,
                dry_run: false,
                attempts,
                slot: SlotSummary::from(&slot),
                confirmation: Some(confirmation),
            }),
        )
            .into_response(),
        BookingOutcome::Selected { slot, attempts } => (
            StatusCode::OK,
            Json(InvokeResponse {
                success: true,
                dry_run: true,
                attempts,
                slot: SlotSummary::from(&slot),
                confirmation: None,
            }),
        )
            .into_response(),
        BookingOutcome::Exhausted { attempts, failures } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(InvokeFailureResponse {
                success: false,
                error: format!("no reservation after {} attempts", attempts),
                attempts: Some(attempts),
                last_failure: failures.last().cloned(),
            }),
        )
            .into_response(),
    }
}

fn platform_failure(error: &BookingError) -> Response {
    (
        StatusCode::BAD_GATEWAY,
        Json(InvokeFailureResponse {
            success: false,
            error: error.to_string(),
            attempts: None,
            last_failure: None,
        }),
    )
        .into_response()
}

fn bad_request(message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(InvokeErrorResponse { error: message }),
    )
        .into_response()
}
