//! Preferred-time ranking.
//!
//! Reservation platforms publish openings on a 15 minute grid, so every
//! input is snapped to that grid before ranking.

use chrono::{NaiveTime, Timelike};
use thiserror::Error;

/// Width of one ranking step, in seconds.
pub const QUANTUM_SECS: u32 = 15 * 60;

const LAST_QUANTUM_SECS: u32 = 24 * 60 * 60 - QUANTUM_SECS;

/// Errors from parsing a user-supplied time of day.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("empty time value")]
    Empty,

    #[error("invalid time '{0}', expected H, HH:MM or HH:MM:SS")]
    Invalid(String),
}

/// Parse a time of day such as `19`, `7:30`, `19:00` or `19:00:00`.
pub fn parse_time(value: &str) -> Result<NaiveTime, TimeParseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TimeParseError::Empty);
    }

    let invalid = || TimeParseError::Invalid(trimmed.to_string());

    let parts: Vec<&str> = trimmed.split(':').collect();
    if parts.len() > 3 {
        return Err(invalid());
    }

    let mut fields = [0u32; 3];
    for (field, part) in fields.iter_mut().zip(&parts) {
        if part.is_empty() || part.len() > 2 {
            return Err(invalid());
        }
        *field = part.parse().map_err(|_| invalid())?;
    }

    NaiveTime::from_hms_opt(fields[0], fields[1], fields[2]).ok_or_else(invalid)
}

/// Round to the nearest quantum. Ties go to the later quantum, and a value
/// that would round past the end of the day is clamped to 23:45.
pub fn snap_to_quantum(time: NaiveTime) -> NaiveTime {
    let secs = time.num_seconds_from_midnight();
    let snapped = ((secs + QUANTUM_SECS / 2) / QUANTUM_SECS * QUANTUM_SECS).min(LAST_QUANTUM_SECS);
    from_secs(snapped)
}

/// Build the ordered list of acceptable times, closest to `best` first.
///
/// The list starts at `best` and expands outward one quantum at a time,
/// adding the later candidate before the earlier one at each distance.
/// Expansion stops at the first distance where neither candidate is within
/// `[earliest, latest]`. Callers must ensure `earliest <= best <= latest`.
///
/// ```
/// use chrono::NaiveTime;
/// use oddjob_core::selection::rank_preferred_times;
///
/// let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
/// let ranked = rank_preferred_times(t(19, 0), t(18, 30), t(19, 30));
/// assert_eq!(ranked, vec![t(19, 0), t(19, 15), t(18, 45), t(19, 30), t(18, 30)]);
/// ```
pub fn rank_preferred_times(best: NaiveTime, earliest: NaiveTime, latest: NaiveTime) -> Vec<NaiveTime> {
    let best = snap_to_quantum(best).num_seconds_from_midnight();
    let earliest = snap_to_quantum(earliest).num_seconds_from_midnight();
    let latest = snap_to_quantum(latest).num_seconds_from_midnight();

    let mut ranked = vec![from_secs(best)];
    let mut offset = QUANTUM_SECS;

    loop {
        let mut added = false;

        let upper = best + offset;
        if upper <= latest {
            ranked.push(from_secs(upper));
            added = true;
        }

        if let Some(lower) = best.checked_sub(offset) {
            if lower >= earliest {
                ranked.push(from_secs(lower));
                added = true;
            }
        }

        if !added {
            break;
        }
        offset += QUANTUM_SECS;
    }

    ranked
}

/// Format as the `HH:MM:SS` wall-clock string the platforms use.
pub fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M:%S").to_string()
}

fn from_secs(secs: u32) -> NaiveTime {
    // Callers only pass values below LAST_QUANTUM_SECS + QUANTUM_SECS.
    NaiveTime::from_num_seconds_from_midnight_opt(secs, 0).unwrap_or(NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_rank_full_window() {
        let ranked = rank_preferred_times(t(19, 0), t(18, 0), t(20, 0));
        assert_eq!(
            ranked,
            vec![
                t(19, 0),
                t(19, 15),
                t(18, 45),
                t(19, 30),
                t(18, 30),
                t(19, 45),
                t(18, 15),
                t(20, 0),
                t(18, 0),
            ]
        );
    }

    #[test]
    fn test_rank_single_point() {
        assert_eq!(rank_preferred_times(t(19, 0), t(19, 0), t(19, 0)), vec![t(19, 0)]);
    }

    #[test]
    fn test_rank_asymmetric_window() {
        let ranked = rank_preferred_times(t(19, 0), t(19, 0), t(19, 45));
        assert_eq!(ranked, vec![t(19, 0), t(19, 15), t(19, 30), t(19, 45)]);

        let ranked = rank_preferred_times(t(19, 0), t(18, 30), t(19, 0));
        assert_eq!(ranked, vec![t(19, 0), t(18, 45), t(18, 30)]);
    }

    #[test]
    fn test_rank_distance_is_non_decreasing() {
        let best = t(12, 30);
        let ranked = rank_preferred_times(best, t(9, 0), t(14, 0));
        let distance = |x: &NaiveTime| (x.num_seconds_from_midnight() as i64 - best.num_seconds_from_midnight() as i64).abs();

        assert_eq!(ranked[0], best);
        assert!(ranked.iter().all(|x| *x >= t(9, 0) && *x <= t(14, 0)));
        assert!(ranked.windows(2).all(|w| distance(&w[0]) <= distance(&w[1])));
        assert_eq!(ranked.len(), 21);
    }

    #[test]
    fn test_rank_near_midnight() {
        let ranked = rank_preferred_times(t(0, 0), t(0, 0), t(0, 30));
        assert_eq!(ranked, vec![t(0, 0), t(0, 15), t(0, 30)]);

        let ranked = rank_preferred_times(t(23, 45), t(23, 15), t(23, 45));
        assert_eq!(ranked, vec![t(23, 45), t(23, 30), t(23, 15)]);
    }

    #[test]
    fn test_rank_snaps_inputs() {
        let ranked = rank_preferred_times(t(19, 7), t(18, 52), t(19, 23));
        assert_eq!(ranked, vec![t(19, 0), t(19, 15), t(18, 45)]);
    }

    #[test]
    fn test_snap_to_quantum() {
        assert_eq!(snap_to_quantum(t(19, 7)), t(19, 0));
        assert_eq!(snap_to_quantum(t(19, 8)), t(19, 15));
        assert_eq!(snap_to_quantum(t(19, 53)), t(20, 0));
        assert_eq!(snap_to_quantum(NaiveTime::from_hms_opt(19, 7, 30).unwrap()), t(19, 15));
        assert_eq!(snap_to_quantum(t(23, 55)), t(23, 45));
    }

    #[test]
    fn test_parse_time_formats() {
        assert_eq!(parse_time("19:00").unwrap(), t(19, 0));
        assert_eq!(parse_time("7:30").unwrap(), t(7, 30));
        assert_eq!(parse_time("19").unwrap(), t(19, 0));
        assert_eq!(parse_time(" 18:45:00 ").unwrap(), t(18, 45));
    }

    #[test]
    fn test_parse_time_rejects_garbage() {
        assert_eq!(parse_time(""), Err(TimeParseError::Empty));
        assert!(matches!(parse_time("7pm"), Err(TimeParseError::Invalid(_))));
        assert!(matches!(parse_time("25:00"), Err(TimeParseError::Invalid(_))));
        assert!(matches!(parse_time("19:000"), Err(TimeParseError::Invalid(_))));
        assert!(matches!(parse_time("1:2:3:4"), Err(TimeParseError::Invalid(_))));
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(t(9, 15)), "09:15:00");
    }
}
