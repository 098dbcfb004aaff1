//! Caller input for a booking run.
//!
//! The CLI and the invocation endpoint both build a [`BookingRequest`];
//! [`BookingRequest::into_plan`] rejects bad input before any network call
//! and ranks the acceptable times once for the whole run.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::Platform;
use crate::selection::{parse_time, rank_preferred_times, snap_to_quantum, TimeParseError};

/// Errors in caller-supplied booking parameters.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("invalid date '{0}', use YYYY-MM-DD")]
    InvalidDate(String),

    #[error("date {0} is in the past")]
    DateInPast(NaiveDate),

    #[error("party size must be at least 1")]
    InvalidPartySize,

    #[error("venue id is required")]
    MissingVenue,

    #[error("invalid {field} time: {source}")]
    InvalidTime {
        field: &'static str,
        source: TimeParseError,
    },

    #[error("earliest time ({earliest}) is after best time ({best})")]
    EarliestAfterBest { earliest: String, best: String },

    #[error("best time ({best}) is after latest time ({latest})")]
    BestAfterLatest { best: String, latest: String },
}

/// A booking request as received from the CLI or a scheduled trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    #[serde(default)]
    pub platform: Platform,
    #[serde(deserialize_with = "venue_id_from_any")]
    pub venue_id: String,
    /// Reservation date, `YYYY-MM-DD`.
    pub date: String,
    pub party_size: u32,
    /// Ideal time, e.g. `19:00`.
    pub best: String,
    pub earliest: String,
    pub latest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_types: Option<Vec<String>>,
    /// Overrides the configured attempt bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,
    #[serde(default)]
    pub dry_run: bool,
}

/// A validated request with its ranked preferred times.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingPlan {
    pub platform: Platform,
    pub venue_id: String,
    pub date: NaiveDate,
    pub party_size: u32,
    /// Acceptable times, closest to the ideal first.
    pub preferred_times: Vec<NaiveTime>,
    pub table_types: Option<Vec<String>>,
}

impl BookingRequest {
    /// Validate against `today` and rank the acceptable times.
    pub fn into_plan(self, today: NaiveDate) -> Result<BookingPlan, RequestError> {
        let venue_id = self.venue_id.trim().to_string();
        if venue_id.is_empty() {
            return Err(RequestError::MissingVenue);
        }

        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .map_err(|_| RequestError::InvalidDate(self.date.clone()))?;
        if date < today {
            return Err(RequestError::DateInPast(date));
        }

        if self.party_size == 0 {
            return Err(RequestError::InvalidPartySize);
        }

        let best = time_field("best", &self.best)?;
        let earliest = time_field("earliest", &self.earliest)?;
        let latest = time_field("latest", &self.latest)?;

        if earliest > best {
            return Err(RequestError::EarliestAfterBest {
                earliest: self.earliest,
                best: self.best,
            });
        }
        if best > latest {
            return Err(RequestError::BestAfterLatest {
                best: self.best,
                latest: self.latest,
            });
        }

        let table_types = self
            .table_types
            .map(|types| {
                types
                    .into_iter()
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|types| !types.is_empty());

        Ok(BookingPlan {
            platform: self.platform,
            venue_id,
            date,
            party_size: self.party_size,
            preferred_times: rank_preferred_times(best, earliest, latest),
            table_types,
        })
    }
}

/// Parse and snap one of the request's time fields.
fn time_field(field: &'static str, value: &str) -> Result<NaiveTime, RequestError> {
    parse_time(value)
        .map(snap_to_quantum)
        .map_err(|source| RequestError::InvalidTime { field, source })
}

/// Scheduler payloads carry numeric Resy venue ids.
fn venue_id_from_any<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum VenueId {
        Text(String),
        Number(u64),
    }

    Ok(match VenueId::deserialize(deserializer)? {
        VenueId::Text(s) => s,
        VenueId::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 1).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn request() -> BookingRequest {
        BookingRequest {
            platform: Platform::Resy,
            venue_id: "25973".to_string(),
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

    #[test]
    fn test_into_plan_ranks_times() {
        let plan = request().into_plan(today()).unwrap();
        assert_eq!(plan.date, NaiveDate::from_ymd_opt(2026, 2, 19).unwrap());
        assert_eq!(
            plan.preferred_times,
            vec![t(19, 0), t(19, 15), t(18, 45), t(19, 30), t(18, 30)]
        );
    }

    #[test]
    fn test_into_plan_rejects_past_date() {
        let mut req = request();
        req.date = "2026-01-31".to_string();
        assert!(matches!(
            req.into_plan(today()),
            Err(RequestError::DateInPast(_))
        ));
    }

    #[test]
    fn test_into_plan_allows_today() {
        let mut req = request();
        req.date = "2026-02-01".to_string();
        assert!(req.into_plan(today()).is_ok());
    }

    #[test]
    fn test_into_plan_rejects_bad_date() {
        let mut req = request();
        req.date = "02/19/2026".to_string();
        assert!(matches!(
            req.into_plan(today()),
            Err(RequestError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_into_plan_rejects_zero_party() {
        let mut req = request();
        req.party_size = 0;
        assert_eq!(req.into_plan(today()), Err(RequestError::InvalidPartySize));
    }

    #[test]
    fn test_into_plan_rejects_time_order() {
        let mut req = request();
        req.earliest = "19:30".to_string();
        assert!(matches!(
            req.into_plan(today()),
            Err(RequestError::EarliestAfterBest { .. })
        ));

        let mut req = request();
        req.latest = "18:00".to_string();
        let err = req.into_plan(today()).unwrap_err();
        assert_eq!(err.to_string(), "best time (19:00) is after latest time (18:00)");
    }

    #[test]
    fn test_into_plan_rejects_unparseable_time() {
        let mut req = request();
        req.best = "seven".to_string();
        assert!(matches!(
            req.into_plan(today()),
            Err(RequestError::InvalidTime { field: "best", .. })
        ));
    }

    #[test]
    fn test_into_plan_drops_blank_table_types() {
        let mut req = request();
        req.table_types = Some(vec![" ".to_string()]);
        assert_eq!(req.into_plan(today()).unwrap().table_types, None);

        let mut req = request();
        req.table_types = Some(vec![" Patio ".to_string()]);
        assert_eq!(
            req.into_plan(today()).unwrap().table_types,
            Some(vec!["Patio".to_string()])
        );
    }

    #[test]
    fn test_deserialize_scheduler_payload() {
        let req: BookingRequest = serde_json::from_str(
            r#"{
                "venue_id": 25973,
                "date": "2026-02-19",
                "party_size": 2,
                "best": "19:00",
                "earliest": "18:00",
                "latest": "21:00",
                "table_types": ["Indoor Dining"],
                "retries": 5
            }"#,
        )
        .unwrap();

        assert_eq!(req.platform, Platform::Resy);
        assert_eq!(req.venue_id, "25973");
        assert_eq!(req.retries, Some(5));
        assert!(!req.dry_run);
    }
}
