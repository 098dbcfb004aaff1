//! Resy API client.
//!
//! Booking flow:
//! 1. `GET /4/find` lists openings, each carrying a config token.
//! 2. `GET /3/details` exchanges the config token for a one-time book token
//!    and the account's payment methods.
//! 3. `POST /3/book` commits the book token; the returned resy token is the
//!    proof of reservation.
//!
//! The commit is not idempotent. A repeated `/3/book` after a timeout may
//! create a second reservation.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::http::{build_client, decode, header_map, missing, send};
use super::{
    BookingClient, BookingClientError, BookingConfirmation, BookingStep, Platform, ResySlotData,
    Slot, SlotData,
};
use crate::selection::parse_time;

const DEFAULT_BASE_URL: &str = "https://api.resy.com";
const WIDGET_ORIGIN: &str = "https://widgets.resy.com";
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

const PLATFORM: Platform = Platform::Resy;

/// Resy account credentials, as captured from a logged-in browser session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResyCredentials {
    /// API key from the `Authorization: ResyAPI api_key="..."` header.
    pub api_key: String,
    /// Session token from the `x-resy-auth-token` header.
    pub auth_token: String,
    /// API base URL (default: https://api.resy.com).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Resy API client.
pub struct ResyClient {
    client: Client,
    base_url: String,
}

impl ResyClient {
    /// Create a new Resy client.
    pub fn new(credentials: ResyCredentials, timeout: Duration) -> Result<Self, BookingClientError> {
        if credentials.api_key.trim().is_empty() {
            return Err(BookingClientError::NotConfigured {
                platform: PLATFORM,
                message: "resy.api_key is required".to_string(),
            });
        }
        if credentials.auth_token.trim().is_empty() {
            return Err(BookingClientError::NotConfigured {
                platform: PLATFORM,
                message: "resy.auth_token is required".to_string(),
            });
        }

        let headers = header_map(
            PLATFORM,
            &[
                (
                    "authorization",
                    format!("ResyAPI api_key=\"{}\"", credentials.api_key),
                ),
                ("x-resy-auth-token", credentials.auth_token.clone()),
                ("user-agent", USER_AGENT.to_string()),
            ],
        )?;

        let client = build_client(PLATFORM, headers, timeout)?;

        let base_url = credentials
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self { client, base_url })
    }

    /// Exchange a config token for a book token and payment method.
    async fn get_details(
        &self,
        config_token: &str,
        date: NaiveDate,
        party_size: u32,
    ) -> Result<BookingDetails, BookingClientError> {
        let step = BookingStep::Details;
        let url = format!("{}/3/details", self.base_url);

        debug!(party_size, "Resy details request");

        let request = self.client.get(&url).query(&[
            ("config_id", config_token.to_string()),
            ("day", date.format("%Y-%m-%d").to_string()),
            ("party_size", party_size.to_string()),
        ]);

        let body = send(PLATFORM, step, request).await?;
        let details: DetailsResponse = decode(PLATFORM, step, &body)?;
        parse_details(details)
    }

    /// Commit a book token.
    async fn book(&self, details: &BookingDetails) -> Result<BookResponse, BookingClientError> {
        let step = BookingStep::Commit;
        let url = format!("{}/3/book", self.base_url);

        let payment = format!("{{\"id\": {}}}", details.payment_method_id);
        let form = [
            ("book_token", details.book_token.as_str()),
            ("struct_payment_method", payment.as_str()),
        ];

        let request = self
            .client
            .post(&url)
            .header("origin", WIDGET_ORIGIN)
            .header("referer", format!("{}/", WIDGET_ORIGIN))
            .form(&form);

        let body = send(PLATFORM, step, request).await?;
        decode(PLATFORM, step, &body)
    }
}

#[async_trait]
impl BookingClient for ResyClient {
    fn platform(&self) -> Platform {
        PLATFORM
    }

    async fn find_slots(
        &self,
        venue_id: &str,
        date: NaiveDate,
        party_size: u32,
    ) -> Result<Vec<Slot>, BookingClientError> {
        let step = BookingStep::Discover;
        let url = format!("{}/4/find", self.base_url);

        debug!(venue_id, %date, party_size, "Resy find request");

        let request = self.client.get(&url).query(&[
            ("lat", "0".to_string()),
            ("long", "0".to_string()),
            ("day", date.format("%Y-%m-%d").to_string()),
            ("party_size", party_size.to_string()),
            ("venue_id", venue_id.to_string()),
        ]);

        let body = send(PLATFORM, step, request).await?;
        let response: FindResponse = decode(PLATFORM, step, &body)?;
        parse_find_response(venue_id, response)
    }

    async fn book_slot(
        &self,
        slot: &Slot,
        date: NaiveDate,
        party_size: u32,
    ) -> Result<BookingConfirmation, BookingClientError> {
        let SlotData::Resy(data) = &slot.data else {
            return Err(BookingClientError::InvalidInput {
                platform: PLATFORM,
                message: format!("cannot book a {} slot", slot.platform()),
            });
        };

        let details = self.get_details(&data.config_token, date, party_size).await?;
        let booked = self.book(&details).await?;

        let confirmation_id = booked
            .resy_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| missing(PLATFORM, BookingStep::Commit, "resy_token"))?;

        let reservation_id = booked.reservation_id.and_then(|v| match v {
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::String(s) => Some(s),
            _ => None,
        });

        info!(venue_id = %slot.venue_id, time = %slot.time, "Resy reservation confirmed");

        Ok(BookingConfirmation {
            platform: PLATFORM,
            confirmation_id,
            reservation_id,
            details: BTreeMap::new(),
        })
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct FindResponse {
    results: Option<FindResults>,
}

#[derive(Debug, Deserialize)]
struct FindResults {
    #[serde(default)]
    venues: Vec<FindVenue>,
}

#[derive(Debug, Deserialize)]
struct FindVenue {
    #[serde(default)]
    slots: Vec<FindSlot>,
}

#[derive(Debug, Deserialize)]
struct FindSlot {
    config: Option<FindSlotConfig>,
    date: Option<FindSlotDate>,
}

#[derive(Debug, Deserialize)]
struct FindSlotConfig {
    token: Option<String>,
    #[serde(rename = "type", default)]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct FindSlotDate {
    /// e.g. "2024-03-15 18:00:00"
    start: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    book_token: Option<BookToken>,
    user: Option<DetailsUser>,
}

#[derive(Debug, Deserialize)]
struct BookToken {
    value: String,
}

#[derive(Debug, Deserialize)]
struct DetailsUser {
    #[serde(default)]
    payment_methods: Vec<PaymentMethod>,
}

#[derive(Debug, Deserialize)]
struct PaymentMethod {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct BookResponse {
    resy_token: Option<String>,
    reservation_id: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq)]
struct BookingDetails {
    book_token: String,
    payment_method_id: i64,
}

fn parse_find_response(venue_id: &str, response: FindResponse) -> Result<Vec<Slot>, BookingClientError> {
    let step = BookingStep::Discover;
    let results = response
        .results
        .ok_or_else(|| missing(PLATFORM, step, "results"))?;

    let Some(venue) = results.venues.into_iter().next() else {
        return Ok(Vec::new());
    };

    venue
        .slots
        .into_iter()
        .map(|slot| {
            let config = slot.config.ok_or_else(|| missing(PLATFORM, step, "slot config"))?;
            let token = config
                .token
                .filter(|t| !t.is_empty())
                .ok_or_else(|| missing(PLATFORM, step, "config.token"))?;
            let start = slot
                .date
                .and_then(|d| d.start)
                .ok_or_else(|| missing(PLATFORM, step, "date.start"))?;

            let time_part = start.rsplit(' ').next().unwrap_or(&start);
            let time = parse_time(time_part).map_err(|e| BookingClientError::Protocol {
                platform: PLATFORM,
                step,
                message: format!("bad slot start '{}': {}", start, e),
            })?;

            Ok(Slot {
                venue_id: venue_id.to_string(),
                time,
                table_type: config.kind,
                data: SlotData::Resy(ResySlotData {
                    config_token: token,
                }),
            })
        })
        .collect()
}

fn parse_details(details: DetailsResponse) -> Result<BookingDetails, BookingClientError> {
    let book_token = details
        .book_token
        .map(|t| t.value)
        .ok_or_else(|| missing(PLATFORM, BookingStep::Details, "book_token.value"))?;

    let payment_method_id = details
        .user
        .and_then(|u| u.payment_methods.into_iter().next())
        .map(|p| p.id)
        .ok_or(BookingClientError::NoPaymentMethod { platform: PLATFORM })?;

    Ok(BookingDetails {
        book_token,
        payment_method_id,
    })
}
