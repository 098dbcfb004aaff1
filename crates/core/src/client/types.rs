//! Platform-neutral booking types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

// ============================================================================
// Platform
// ============================================================================

/// A reservation platform with its own wire protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Resy,
    OpenTable,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Resy => "resy",
            Platform::OpenTable => "opentable",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "resy" => Ok(Platform::Resy),
            "opentable" => Ok(Platform::OpenTable),
            other => Err(format!("unknown platform '{}', expected resy or opentable", other)),
        }
    }
}

// ============================================================================
// Slots
// ============================================================================

/// One bookable opening returned by a platform's availability query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    /// Platform-specific venue identifier.
    pub venue_id: String,
    /// Wall-clock start time.
    pub time: NaiveTime,
    /// Free-text seating category, e.g. "Patio".
    pub table_type: String,
    /// Tokens the owning client needs to book this slot.
    pub data: SlotData,
}

impl Slot {
    /// The platform that discovered this slot.
    pub fn platform(&self) -> Platform {
        self.data.platform()
    }
}

/// Per-platform booking tokens captured at discovery time.
///
/// Only the client of the matching platform interprets these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "platform", rename_all = "lowercase")]
pub enum SlotData {
    Resy(ResySlotData),
    OpenTable(OpenTableSlotData),
}

impl SlotData {
    pub fn platform(&self) -> Platform {
        match self {
            SlotData::Resy(_) => Platform::Resy,
            SlotData::OpenTable(_) => Platform::OpenTable,
        }
    }
}

/// Resy slot tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResySlotData {
    /// Config token exchanged for a one-time book token.
    pub config_token: String,
}

/// OpenTable slot tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenTableSlotData {
    /// Hash identifying the slot for the lock mutation.
    pub slot_hash: String,
    /// Availability token echoed back on the final reservation call.
    pub slot_availability_token: String,
    /// Seating area the lock is requested for.
    pub dining_area_id: i64,
    /// Local date-time of the slot (`YYYY-MM-DDTHH:MM`).
    pub reservation_date_time: String,
}

// ============================================================================
// Confirmation
// ============================================================================

/// Proof of a committed reservation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingConfirmation {
    pub platform: Platform,
    /// Primary proof of booking (Resy token, OpenTable confirmation number).
    pub confirmation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservation_id: Option<String>,
    /// Extra platform fields kept for diagnostics.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_from_str() {
        assert_eq!("resy".parse::<Platform>().unwrap(), Platform::Resy);
        assert_eq!("OpenTable".parse::<Platform>().unwrap(), Platform::OpenTable);
        assert!("tock".parse::<Platform>().is_err());
    }

    #[test]
    fn test_platform_defaults_to_resy() {
        assert_eq!(Platform::default(), Platform::Resy);
    }

    #[test]
    fn test_platform_serde_names() {
        assert_eq!(serde_json::to_string(&Platform::OpenTable).unwrap(), "\"opentable\"");
        let parsed: Platform = serde_json::from_str("\"resy\"").unwrap();
        assert_eq!(parsed, Platform::Resy);
    }

    #[test]
    fn test_slot_platform_follows_data() {
        let slot = Slot {
            venue_id: "1234".to_string(),
            time: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            table_type: "Standard".to_string(),
            data: SlotData::OpenTable(OpenTableSlotData {
                slot_hash: "hash".to_string(),
                slot_availability_token: "token".to_string(),
                dining_area_id: 1,
                reservation_date_time: "2026-02-19T19:00".to_string(),
            }),
        };
        assert_eq!(slot.platform(), Platform::OpenTable);
    }

    #[test]
    fn test_confirmation_serialization_skips_empty() {
        let confirmation = BookingConfirmation {
            platform: Platform::Resy,
            confirmation_id: "tok".to_string(),
            reservation_id: None,
            details: BTreeMap::new(),
        };
        let json = serde_json::to_value(&confirmation).unwrap();
        assert_eq!(json["platform"], "resy");
        assert!(json.get("reservation_id").is_none());
        assert!(json.get("details").is_none());
    }
}
