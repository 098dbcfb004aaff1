//! Mock booking client for testing.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::client::{BookingClient, BookingClientError, BookingConfirmation, Platform, Slot};

/// A recorded booking call for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedBooking {
    pub slot: Slot,
    pub date: NaiveDate,
    pub party_size: u32,
}

/// Mock implementation of the BookingClient trait.
///
/// Discovery and booking results are scripted per call, first in first out.
/// Once a script runs dry, discovery returns no slots and booking returns a
/// synthetic confirmation.
///
/// # Example
///
/// ```rust,ignore
/// use oddjob_core::testing::{MockBookingClient, fixtures};
///
/// let client = MockBookingClient::new(Platform::Resy);
/// client.push_slots(vec![]).await;
/// client.push_slots(vec![fixtures::resy_slot(seven_pm, "Dining Room")]).await;
///
/// // First attempt sees nothing, second books the 19:00 slot.
/// ```
#[derive(Debug, Clone)]
pub struct MockBookingClient {
    platform: Platform,
    discoveries: Arc<RwLock<VecDeque<Result<Vec<Slot>, BookingClientError>>>>,
    bookings: Arc<RwLock<VecDeque<Result<BookingConfirmation, BookingClientError>>>>,
    find_calls: Arc<RwLock<u32>>,
    booked: Arc<RwLock<Vec<RecordedBooking>>>,
}

impl Default for MockBookingClient {
    fn default() -> Self {
        Self::new(Platform::Resy)
    }
}

impl MockBookingClient {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            discoveries: Arc::new(RwLock::new(VecDeque::new())),
            bookings: Arc::new(RwLock::new(VecDeque::new())),
            find_calls: Arc::new(RwLock::new(0)),
            booked: Arc::new(RwLock::new(Vec::new())),
        }
    }

    // =========================================================================
    // Scripting
    // =========================================================================

    /// Queue the slots returned by the next unscripted discovery.
    pub async fn push_slots(&self, slots: Vec<Slot>) {
        self.discoveries.write().await.push_back(Ok(slots));
    }

    /// Queue a discovery failure.
    pub async fn push_find_error(&self, error: BookingClientError) {
        self.discoveries.write().await.push_back(Err(error));
    }

    /// Queue the result of the next booking call.
    pub async fn push_booking(&self, result: Result<BookingConfirmation, BookingClientError>) {
        self.bookings.write().await.push_back(result);
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Number of `find_slots` calls so far.
    pub async fn find_calls(&self) -> u32 {
        *self.find_calls.read().await
    }

    /// Every `book_slot` call so far, in order.
    pub async fn booked(&self) -> Vec<RecordedBooking> {
        self.booked.read().await.clone()
    }

    fn confirmation_for(&self, call: usize) -> BookingConfirmation {
        BookingConfirmation {
            platform: self.platform,
            confirmation_id: format!("mock-{}", call),
            reservation_id: None,
            details: BTreeMap::new(),
        }
    }
}

#[async_trait]
impl BookingClient for MockBookingClient {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn find_slots(
        &self,
        _venue_id: &str,
        _date: NaiveDate,
        _party_size: u32,
    ) -> Result<Vec<Slot>, BookingClientError> {
        *self.find_calls.write().await += 1;
        self.discoveries
            .write()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn book_slot(
        &self,
        slot: &Slot,
        date: NaiveDate,
        party_size: u32,
    ) -> Result<BookingConfirmation, BookingClientError> {
        let call = {
            let mut booked = self.booked.write().await;
            booked.push(RecordedBooking {
                slot: slot.clone(),
                date,
                party_size,
            });
            booked.len()
        };

        match self.bookings.write().await.pop_front() {
            Some(result) => result,
            None => Ok(self.confirmation_for(call)),
        }
    }
}
