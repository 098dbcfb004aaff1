//! Booking platform clients.
//!
//! Each platform implements [`BookingClient`]: one read-only discovery call
//! and a multi-step commit handshake. Shared code never branches on the
//! platform; new platforms are added by implementing the trait and
//! registering a constructor in [`create_client`].

mod http;
mod opentable;
mod resy;
mod types;

pub use opentable::{OpenTableClient, OpenTableCredentials};
pub use resy::{ResyClient, ResyCredentials};
pub use types::*;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::config::Config;

/// The network step a platform error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStep {
    /// Availability query.
    Discover,
    /// Resy book-token exchange.
    Details,
    /// OpenTable slot lock.
    Lock,
    /// Final binding reservation request.
    Commit,
}

impl fmt::Display for BookingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BookingStep::Discover => "discover",
            BookingStep::Details => "details",
            BookingStep::Lock => "lock",
            BookingStep::Commit => "commit",
        };
        f.write_str(name)
    }
}

/// Errors raised by booking clients. Every variant names its platform.
#[derive(Debug, Error)]
pub enum BookingClientError {
    /// The request never produced a response (connect failure, timeout).
    #[error("[{platform}] {step} request failed: {source}")]
    Transport {
        platform: Platform,
        step: BookingStep,
        source: reqwest::Error,
    },

    /// The platform answered with a non-success HTTP status.
    #[error("[{platform}] {step} returned HTTP {status}: {body}")]
    Status {
        platform: Platform,
        step: BookingStep,
        status: u16,
        body: String,
    },

    /// The platform refused the operation; its payload is kept verbatim.
    #[error("[{platform}] {step} rejected: {payload}")]
    Rejected {
        platform: Platform,
        step: BookingStep,
        payload: String,
    },

    /// A successful response did not match the expected schema.
    #[error("[{platform}] unexpected {step} response: {message}")]
    Protocol {
        platform: Platform,
        step: BookingStep,
        message: String,
    },

    /// The account has no payment instrument to guarantee the booking.
    #[error("[{platform}] no payment method on file, add a credit card to your account")]
    NoPaymentMethod { platform: Platform },

    /// The caller passed something this platform cannot use.
    #[error("[{platform}] invalid input: {message}")]
    InvalidInput { platform: Platform, message: String },

    /// Credentials are missing or unusable.
    #[error("[{platform}] client not configured: {message}")]
    NotConfigured { platform: Platform, message: String },
}

impl BookingClientError {
    pub fn platform(&self) -> Platform {
        match self {
            BookingClientError::Transport { platform, .. }
            | BookingClientError::Status { platform, .. }
            | BookingClientError::Rejected { platform, .. }
            | BookingClientError::Protocol { platform, .. }
            | BookingClientError::NoPaymentMethod { platform }
            | BookingClientError::InvalidInput { platform, .. }
            | BookingClientError::NotConfigured { platform, .. } => *platform,
        }
    }

    /// The network step, for errors that came from one.
    pub fn step(&self) -> Option<BookingStep> {
        match self {
            BookingClientError::Transport { step, .. }
            | BookingClientError::Status { step, .. }
            | BookingClientError::Rejected { step, .. }
            | BookingClientError::Protocol { step, .. } => Some(*step),
            _ => None,
        }
    }

    /// Whether repeating the whole discover-select-book cycle may succeed.
    ///
    /// Commit-step failures only count when the platform definitively
    /// refused; a commit that may have gone through is never retried.
    pub fn is_transient(&self) -> bool {
        match self {
            BookingClientError::Transport { step, .. } => *step != BookingStep::Commit,
            BookingClientError::Status { step, status, .. } => {
                if *status == 401 {
                    false
                } else if *step == BookingStep::Commit {
                    (400..500).contains(status)
                } else {
                    true
                }
            }
            BookingClientError::Rejected { .. } => true,
            BookingClientError::Protocol { .. }
            | BookingClientError::NoPaymentMethod { .. }
            | BookingClientError::InvalidInput { .. }
            | BookingClientError::NotConfigured { .. } => false,
        }
    }

    /// True when the final commit failed without a definitive answer, so the
    /// reservation may exist and must be verified by hand.
    ///
    /// An unreadable success reply counts: the platform accepted the request.
    pub fn is_ambiguous_commit(&self) -> bool {
        match self {
            BookingClientError::Transport { step, .. }
            | BookingClientError::Protocol { step, .. } => *step == BookingStep::Commit,
            BookingClientError::Status { step, status, .. } => {
                *step == BookingStep::Commit && *status >= 500
            }
            _ => false,
        }
    }
}

/// A reservation platform client.
///
/// An instance owns one account's credentials. Concurrent runs should each
/// use their own instance.
#[async_trait]
pub trait BookingClient: Send + Sync {
    /// Platform this client speaks to.
    fn platform(&self) -> Platform;

    /// Query every currently bookable opening, in platform order.
    ///
    /// An empty list is a normal answer, not an error.
    async fn find_slots(
        &self,
        venue_id: &str,
        date: NaiveDate,
        party_size: u32,
    ) -> Result<Vec<Slot>, BookingClientError>;

    /// Run the platform's commit handshake for a slot from `find_slots`.
    async fn book_slot(
        &self,
        slot: &Slot,
        date: NaiveDate,
        party_size: u32,
    ) -> Result<BookingConfirmation, BookingClientError>;
}

/// Build the client for `platform` from its configured credentials.
pub fn create_client(
    platform: Platform,
    config: &Config,
) -> Result<Box<dyn BookingClient>, BookingClientError> {
    let timeout = Duration::from_secs(config.http.timeout_secs);

    let missing = || BookingClientError::NotConfigured {
        platform,
        message: format!(
            "no credentials found, add a [{}] section to your config",
            platform
        ),
    };

    match platform {
        Platform::Resy => {
            let credentials = config.resy.clone().ok_or_else(missing)?;
            Ok(Box::new(ResyClient::new(credentials, timeout)?))
        }
        Platform::OpenTable => {
            let credentials = config.opentable.clone().ok_or_else(missing)?;
            Ok(Box::new(OpenTableClient::new(credentials, timeout)?))
        }
    }
}
