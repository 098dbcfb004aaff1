//! Testing utilities and mock implementations.
//!
//! [`MockBookingClient`] stands in for a platform client so the orchestrator
//! and the invocation endpoint can be exercised without network access.

mod mock_booking_client;

pub use mock_booking_client::{MockBookingClient, RecordedBooking};

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{NaiveDate, NaiveTime};

    use crate::client::{
        OpenTableCredentials, OpenTableSlotData, Platform, ResySlotData, Slot, SlotData,
    };
    use crate::request::BookingRequest;

    /// Create a Resy slot at `time` with a config token derived from it.
    pub fn resy_slot(time: NaiveTime, table_type: &str) -> Slot {
        Slot {
            venue_id: "25973".to_string(),
            time,
            table_type: table_type.to_string(),
            data: SlotData::Resy(ResySlotData {
                config_token: format!("rgs://resy/25973/{}", time.format("%H%M")),
            }),
        }
    }

    /// Create an OpenTable slot at `time` on 2026-02-19.
    pub fn opentable_slot(time: NaiveTime, table_type: &str) -> Slot {
        Slot {
            venue_id: "1234".to_string(),
            time,
            table_type: table_type.to_string(),
            data: SlotData::OpenTable(OpenTableSlotData {
                slot_hash: format!("hash-{}", time.format("%H%M")),
                slot_availability_token: "availability-token".to_string(),
                dining_area_id: 1,
                reservation_date_time: format!("2026-02-19T{}", time.format("%H:%M")),
            }),
        }
    }

    /// Complete OpenTable credentials with the given CSRF token.
    pub fn opentable_credentials(csrf_token: &str) -> OpenTableCredentials {
        OpenTableCredentials {
            csrf_token: csrf_token.to_string(),
            cookies: "otSessionId=abc".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone_number: "5555550100".to_string(),
            phone_country: "US".to_string(),
            country: "US".to_string(),
            gpid: "1000".to_string(),
            database_region: "NA".to_string(),
            base_url: None,
        }
    }

    /// A valid request for two on 2026-02-19 between 18:30 and 19:30.
    pub fn booking_request(platform: Platform, venue_id: &str) -> BookingRequest {
        BookingRequest {
            platform,
            venue_id: venue_id.to_string(),
            date: "2026-02-19".to_string(),
            party_size: 2,
            best: "19:00".to_string(),
            earliest: "18:30".to_string(),
            latest: "19:30".to_string(),
            table_types: None,
            retries: None,
            dry_run: false,
        }
    }

    /// A date no later than the date used by [`booking_request`].
    pub fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 1).unwrap_or_default()
    }
}
