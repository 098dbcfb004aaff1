//! OpenTable web API client.
//!
//! Uses the same GraphQL and REST endpoints the opentable.com frontend
//! calls, authenticated with a browser session's CSRF token and cookies.
//!
//! Booking flow:
//! 1. `RestaurantsAvailability` (GraphQL query) lists slots.
//! 2. `BookDetailsStandardSlotLock` (GraphQL mutation) holds one slot for a
//!    short, platform-enforced window.
//! 3. `POST /booking/make-reservation` finalizes it with guest details.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::http::{build_client, decode, header_map, missing, send};
use super::{
    BookingClient, BookingClientError, BookingConfirmation, BookingStep, OpenTableSlotData,
    Platform, Slot, SlotData,
};

const DEFAULT_BASE_URL: &str = "https://www.opentable.com/dapi";
const SITE_ORIGIN: &str = "https://www.opentable.com";
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/144.0.0.0 Safari/537.36";

// Persisted query hashes rotate when the frontend is redeployed. Unknown
// query errors mean these need to be recaptured from the browser.
const AVAILABILITY_HASH: &str = "b2d05a06151b3cb21d9dfce4f021303eeba288fac347068b29c1cb66badc46af";
const SLOT_LOCK_HASH: &str = "1100bf68905fd7cb1d4fd0f4504a4954aa28ec45fb22913fa977af8b06fd97fa";
const STALE_QUERY_HINT: &str = " (persisted query hash may be stale, recapture it from the browser)";

/// Availability is requested around this time to get the widest range.
const AVAILABILITY_ANCHOR: (u32, u32) = (19, 0);

const DEFAULT_DINING_AREA_ID: i64 = 1;

const PLATFORM: Platform = Platform::OpenTable;

/// OpenTable session credentials and guest contact details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenTableCredentials {
    pub csrf_token: String,
    /// Raw `Cookie` header value from a logged-in session.
    pub cookies: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    #[serde(default = "default_country")]
    pub phone_country: String,
    #[serde(default = "default_country")]
    pub country: String,
    /// Global person id of the account holder.
    pub gpid: String,
    #[serde(default = "default_database_region")]
    pub database_region: String,
    /// API base URL (default: https://www.opentable.com/dapi).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

fn default_country() -> String {
    "US".to_string()
}

fn default_database_region() -> String {
    "NA".to_string()
}

/// OpenTable API client.
pub struct OpenTableClient {
    client: Client,
    base_url: String,
    credentials: OpenTableCredentials,
}

impl OpenTableClient {
    /// Create a new OpenTable client.
    pub fn new(
        credentials: OpenTableCredentials,
        timeout: Duration,
    ) -> Result<Self, BookingClientError> {
        let required = [
            ("csrf_token", &credentials.csrf_token),
            ("cookies", &credentials.cookies),
            ("first_name", &credentials.first_name),
            ("last_name", &credentials.last_name),
            ("email", &credentials.email),
            ("phone_number", &credentials.phone_number),
            ("gpid", &credentials.gpid),
        ];
        if let Some((name, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(BookingClientError::NotConfigured {
                platform: PLATFORM,
                message: format!("opentable.{} is required", name),
            });
        }

        let headers = header_map(
            PLATFORM,
            &[
                ("origin", SITE_ORIGIN.to_string()),
                ("referer", format!("{}/", SITE_ORIGIN)),
                ("user-agent", USER_AGENT.to_string()),
                ("x-csrf-token", credentials.csrf_token.clone()),
                ("cookie", credentials.cookies.clone()),
            ],
        )?;

        let client = build_client(PLATFORM, headers, timeout)?;

        let base_url = credentials
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    /// Run a persisted GraphQL operation and return its `data` object.
    async fn gql<T: serde::de::DeserializeOwned>(
        &self,
        step: BookingStep,
        optype: &str,
        opname: &str,
        payload: &Value,
    ) -> Result<T, BookingClientError> {
        let url = format!("{}/fe/gql", self.base_url);

        debug!(opname, "OpenTable GraphQL request");

        let request = self
            .client
            .post(&url)
            .query(&[("optype", optype), ("opname", opname)])
            .json(payload);

        let body = send(PLATFORM, step, request).await?;
        let envelope: GqlEnvelope<T> = decode(PLATFORM, step, &body)?;

        if let Some(errors) = envelope.errors {
            let mut payload = errors.to_string();
            // Availability has no business-level refusals, so errors here
            // usually mean the frontend was redeployed.
            if step == BookingStep::Discover {
                warn!(
                    opname,
                    errors = %payload,
                    "OpenTable rejected the availability query, persisted query hash may have rotated"
                );
                payload.push_str(STALE_QUERY_HINT);
            }
            return Err(BookingClientError::Rejected {
                platform: PLATFORM,
                step,
                payload,
            });
        }

        envelope.data.ok_or_else(|| missing(PLATFORM, step, "data"))
    }

    /// Lock a slot and return the lock id for the reservation call.
    async fn lock_slot(
        &self,
        restaurant_id: i64,
        data: &OpenTableSlotData,
        party_size: u32,
    ) -> Result<i64, BookingClientError> {
        let step = BookingStep::Lock;
        let payload = json!({
            "operationName": "BookDetailsStandardSlotLock",
            "variables": {
                "input": {
                    "restaurantId": restaurant_id,
                    "seatingOption": "DEFAULT",
                    "reservationDateTime": data.reservation_date_time,
                    "partySize": party_size,
                    "databaseRegion": self.credentials.database_region,
                    "slotHash": data.slot_hash,
                    "reservationType": "STANDARD",
                    "diningAreaId": data.dining_area_id,
                },
            },
            "extensions": {
                "persistedQuery": {
                    "version": 1,
                    "sha256Hash": SLOT_LOCK_HASH,
                },
            },
        });

        let response: LockData = self
            .gql(step, "mutation", "BookDetailsStandardSlotLock", &payload)
            .await?;
        parse_lock(response)
    }

    fn reservation_payload(
        &self,
        restaurant_id: i64,
        data: &OpenTableSlotData,
        slot_lock_id: i64,
        party_size: u32,
    ) -> Value {
        let guest = &self.credentials;
        json!({
            "restaurantId": restaurant_id,
            "slotHash": data.slot_hash,
            "slotLockId": slot_lock_id,
            "slotAvailabilityToken": data.slot_availability_token,
            "reservationDateTime": data.reservation_date_time,
            "partySize": party_size,
            "firstName": guest.first_name,
            "lastName": guest.last_name,
            "email": guest.email,
            "phoneNumber": guest.phone_number,
            "phoneNumberCountryId": guest.phone_country,
            "country": guest.country,
            "gpid": guest.gpid,
            "dinerIsAccountHolder": true,
            "reservationType": "Standard",
            "reservationAttribute": "default",
            "diningAreaId": data.dining_area_id,
            "points": 100,
            "pointsType": "Standard",
            "tipAmount": 0,
            "tipPercent": 0,
            "optInEmailRestaurant": false,
            "isModify": false,
            "tcAccepted": true,
            "confirmPoints": true,
            "correlationId": Uuid::new_v4().to_string(),
            "attributionToken": "",
            "additionalServiceFees": [],
            "nonBookableExperiences": [],
            "katakanaFirstName": "",
            "katakanaLastName": "",
        })
    }

    /// Finalize a locked slot.
    async fn make_reservation(&self, payload: &Value) -> Result<Value, BookingClientError> {
        let step = BookingStep::Commit;
        let url = format!("{}/booking/make-reservation", self.base_url);

        let request = self
            .client
            .post(&url)
            .header("accept", "application/json")
            .json(payload);

        let body = send(PLATFORM, step, request).await?;
        decode(PLATFORM, step, &body)
    }
}

#[async_trait]
impl BookingClient for OpenTableClient {
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
        let restaurant_id = restaurant_id(venue_id)?;
        let (hour, minute) = AVAILABILITY_ANCHOR;

        debug!(venue_id, %date, party_size, "OpenTable availability request");

        let payload = json!({
            "operationName": "RestaurantsAvailability",
            "variables": {
                "restaurantIds": [restaurant_id],
                "date": date.format("%Y-%m-%d").to_string(),
                "time": format!("{:02}:{:02}", hour, minute),
                "partySize": party_size,
                "databaseRegion": self.credentials.database_region,
            },
            "extensions": {
                "persistedQuery": {
                    "sha256Hash": AVAILABILITY_HASH,
                },
            },
        });

        let data: AvailabilityData = self
            .gql(step, "query", "RestaurantsAvailability", &payload)
            .await?;
        parse_availability(venue_id, date, data)
    }

    async fn book_slot(
        &self,
        slot: &Slot,
        _date: NaiveDate,
        party_size: u32,
    ) -> Result<BookingConfirmation, BookingClientError> {
        let SlotData::OpenTable(data) = &slot.data else {
            return Err(BookingClientError::InvalidInput {
                platform: PLATFORM,
                message: format!("cannot book a {} slot", slot.platform()),
            });
        };
        let restaurant_id = restaurant_id(&slot.venue_id)?;

        let slot_lock_id = self.lock_slot(restaurant_id, data, party_size).await?;
        debug!(slot_lock_id, "OpenTable slot locked");

        let payload = self.reservation_payload(restaurant_id, data, slot_lock_id, party_size);
        let response = self.make_reservation(&payload).await?;
        let confirmation = parse_reservation(response)?;

        info!(venue_id = %slot.venue_id, time = %slot.time, "OpenTable reservation confirmed");

        Ok(confirmation)
    }
}

fn restaurant_id(venue_id: &str) -> Result<i64, BookingClientError> {
    venue_id
        .trim()
        .parse()
        .map_err(|_| BookingClientError::InvalidInput {
            platform: PLATFORM,
            message: format!("restaurant id must be numeric, got '{}'", venue_id),
        })
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct GqlEnvelope<T> {
    data: Option<T>,
    errors: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct AvailabilityData {
    #[serde(default)]
    availability: Option<Vec<RestaurantAvailability>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RestaurantAvailability {
    #[serde(default)]
    availability_days: Vec<AvailabilityDay>,
}

#[derive(Debug, Deserialize)]
struct AvailabilityDay {
    #[serde(default)]
    slots: Vec<AvailabilitySlot>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AvailabilitySlot {
    #[serde(default)]
    is_available: bool,
    time_offset_minutes: Option<i64>,
    slot_hash: Option<String>,
    slot_availability_token: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    dining_areas_by_seating: Vec<DiningArea>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiningArea {
    id: Option<i64>,
    inventory_access_rule_map: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LockData {
    lock_slot: Option<LockSlotResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LockSlotResponse {
    #[serde(default)]
    success: bool,
    slot_lock_errors: Option<Value>,
    slot_lock: Option<SlotLock>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SlotLock {
    slot_lock_id: Option<i64>,
}

fn parse_availability(
    venue_id: &str,
    date: NaiveDate,
    data: AvailabilityData,
) -> Result<Vec<Slot>, BookingClientError> {
    let step = BookingStep::Discover;

    let Some(day) = data
        .availability
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|restaurant| restaurant.availability_days.into_iter().next())
    else {
        return Ok(Vec::new());
    };

    let (hour, minute) = AVAILABILITY_ANCHOR;
    let anchor_minutes = i64::from(hour * 60 + minute);

    let mut slots = Vec::new();
    for slot in day.slots.into_iter().filter(|s| s.is_available) {
        let offset = slot
            .time_offset_minutes
            .ok_or_else(|| missing(PLATFORM, step, "timeOffsetMinutes"))?;
        let slot_hash = slot
            .slot_hash
            .ok_or_else(|| missing(PLATFORM, step, "slotHash"))?;

        let minutes = anchor_minutes + offset;
        let Some(time) = u32::try_from(minutes * 60)
            .ok()
            .and_then(|secs| NaiveTime::from_num_seconds_from_midnight_opt(secs, 0))
        else {
            debug!(offset, "skipping OpenTable slot outside the requested day");
            continue;
        };

        let dining_area_id = slot
            .dining_areas_by_seating
            .first()
            .filter(|area| has_access_rules(area.inventory_access_rule_map.as_ref()))
            .and_then(|area| area.id)
            .unwrap_or(DEFAULT_DINING_AREA_ID);

        slots.push(Slot {
            venue_id: venue_id.to_string(),
            time,
            table_type: slot.kind.unwrap_or_else(|| "Standard".to_string()),
            data: SlotData::OpenTable(OpenTableSlotData {
                slot_hash,
                slot_availability_token: slot.slot_availability_token.unwrap_or_default(),
                dining_area_id,
                reservation_date_time: format!(
                    "{}T{}",
                    date.format("%Y-%m-%d"),
                    time.format("%H:%M")
                ),
            }),
        });
    }

    Ok(slots)
}

fn has_access_rules(map: Option<&Value>) -> bool {
    match map {
        None | Some(Value::Null) => false,
        Some(Value::Object(o)) => !o.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Bool(b)) => *b,
        Some(_) => true,
    }
}

fn parse_lock(data: LockData) -> Result<i64, BookingClientError> {
    let step = BookingStep::Lock;
    let lock = data
        .lock_slot
        .ok_or_else(|| missing(PLATFORM, step, "lockSlot"))?;

    if !lock.success {
        let payload = lock
            .slot_lock_errors
            .filter(|e| !e.is_null())
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(BookingClientError::Rejected {
            platform: PLATFORM,
            step,
            payload,
        });
    }

    lock.slot_lock
        .and_then(|l| l.slot_lock_id)
        .ok_or_else(|| missing(PLATFORM, step, "slotLock.slotLockId"))
}

fn parse_reservation(response: Value) -> Result<BookingConfirmation, BookingClientError> {
    let step = BookingStep::Commit;

    if response.get("success").and_then(Value::as_bool) != Some(true) {
        return Err(BookingClientError::Rejected {
            platform: PLATFORM,
            step,
            payload: response.to_string(),
        });
    }

    let confirmation_id = response
        .get("confirmationNumber")
        .and_then(scalar_to_string)
        .ok_or_else(|| missing(PLATFORM, step, "confirmationNumber"))?;

    let reservation_id = response.get("reservationId").and_then(scalar_to_string);

    let mut details = BTreeMap::new();
    for (key, field) in [
        ("security_token", "securityToken"),
        ("environment", "environment"),
        ("reservation_type", "reservationType"),
    ] {
        if let Some(value) = response.get(field).and_then(scalar_to_string) {
            details.insert(key.to_string(), value);
        }
    }

    Ok(BookingConfirmation {
        platform: PLATFORM,
        confirmation_id,
        reservation_id,
        details,
    })
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 19).unwrap()
    }

    fn availability(json: &str) -> Result<Vec<Slot>, BookingClientError> {
        let data: AvailabilityData = serde_json::from_str(json).unwrap();
        parse_availability("1234", date(), data)
    }

    #[test]
    fn test_parse_availability_converts_offsets() {
        let slots = availability(
            r#"{"availability": [{"availabilityDays": [{"slots": [
                {"isAvailable": true, "timeOffsetMinutes": -30, "slotHash": "h1",
                 "slotAvailabilityToken": "t1", "type": "Standard"},
                {"isAvailable": false, "timeOffsetMinutes": 0, "slotHash": "h2"},
                {"isAvailable": true, "timeOffsetMinutes": 45, "slotHash": "h3",
                 "diningAreasBySeating": [{"id": 7, "inventoryAccessRuleMap": {"r": 1}}]}
            ]}]}]}"#,
        )
        .unwrap();

        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].time, NaiveTime::from_hms_opt(18, 30, 0).unwrap());
        assert_eq!(slots[1].time, NaiveTime::from_hms_opt(19, 45, 0).unwrap());
        assert_eq!(slots[1].table_type, "Standard");

        match &slots[0].data {
            SlotData::OpenTable(data) => {
                assert_eq!(data.slot_hash, "h1");
                assert_eq!(data.slot_availability_token, "t1");
                assert_eq!(data.dining_area_id, DEFAULT_DINING_AREA_ID);
                assert_eq!(data.reservation_date_time, "2026-02-19T18:30");
            }
            other => panic!("unexpected slot data {:?}", other),
        }
        match &slots[1].data {
            SlotData::OpenTable(data) => assert_eq!(data.dining_area_id, 7),
            other => panic!("unexpected slot data {:?}", other),
        }
    }

    #[test]
    fn test_parse_availability_dining_area_without_rules() {
        let slots = availability(
            r#"{"availability": [{"availabilityDays": [{"slots": [
                {"isAvailable": true, "timeOffsetMinutes": 0, "slotHash": "h",
                 "diningAreasBySeating": [{"id": 9, "inventoryAccessRuleMap": null}]}
            ]}]}]}"#,
        )
        .unwrap();

        match &slots[0].data {
            SlotData::OpenTable(data) => assert_eq!(data.dining_area_id, DEFAULT_DINING_AREA_ID),
            other => panic!("unexpected slot data {:?}", other),
        }
    }

    #[test]
    fn test_parse_availability_empty() {
        assert!(availability(r#"{"availability": []}"#).unwrap().is_empty());
        assert!(availability(r#"{"availability": [{"availabilityDays": []}]}"#)
            .unwrap()
            .is_empty());
        assert!(availability(r#"{}"#).unwrap().is_empty());
    }

    #[test]
    fn test_parse_availability_missing_hash() {
        let result = availability(
            r#"{"availability": [{"availabilityDays": [{"slots": [
                {"isAvailable": true, "timeOffsetMinutes": 0}
            ]}]}]}"#,
        );
        assert!(matches!(result, Err(BookingClientError::Protocol { .. })));
    }

    #[test]
    fn test_parse_lock_failure_is_verbatim() {
        let data: LockData = serde_json::from_str(
            r#"{"lockSlot": {"success": false, "slotLockErrors": ["SLOT_UNAVAILABLE"]}}"#,
        )
        .unwrap();

        match parse_lock(data) {
            Err(BookingClientError::Rejected { step, payload, .. }) => {
                assert_eq!(step, BookingStep::Lock);
                assert_eq!(payload, "[\"SLOT_UNAVAILABLE\"]");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_lock_success() {
        let data: LockData = serde_json::from_str(
            r#"{"lockSlot": {"success": true, "slotLock": {"slotLockId": 998877}}}"#,
        )
        .unwrap();
        assert_eq!(parse_lock(data).unwrap(), 998877);
    }

    #[test]
    fn test_parse_reservation() {
        let confirmation = parse_reservation(json!({
            "success": true,
            "confirmationNumber": 123456,
            "reservationId": 42,
            "securityToken": "sec",
            "environment": "prod",
        }))
        .unwrap();

        assert_eq!(confirmation.platform, Platform::OpenTable);
        assert_eq!(confirmation.confirmation_id, "123456");
        assert_eq!(confirmation.reservation_id.as_deref(), Some("42"));
        assert_eq!(confirmation.details.get("security_token").unwrap(), "sec");
        assert!(!confirmation.details.contains_key("reservation_type"));
    }

    #[test]
    fn test_parse_reservation_unsuccessful() {
        let result = parse_reservation(json!({"success": false, "errorCode": "DUPLICATE"}));
        match result {
            Err(BookingClientError::Rejected { step, payload, .. }) => {
                assert_eq!(step, BookingStep::Commit);
                assert!(payload.contains("DUPLICATE"));
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_restaurant_id_must_be_numeric() {
        assert_eq!(restaurant_id("1234").unwrap(), 1234);
        assert!(matches!(
            restaurant_id("le-bernardin"),
            Err(BookingClientError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_new_reports_missing_field() {
        let credentials = crate::testing::fixtures::opentable_credentials("");
        let result = OpenTableClient::new(credentials, Duration::from_secs(5));
        match result {
            Err(BookingClientError::NotConfigured { message, .. }) => {
                assert!(message.contains("csrf_token"))
            }
            _ => panic!("expected NotConfigured"),
        }
    }
}
