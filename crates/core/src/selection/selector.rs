//! Best-slot selection across platforms.

use std::collections::HashMap;

use chrono::NaiveTime;

use crate::client::Slot;

/// Pick the best slot for the ranked times and optional table preferences.
///
/// The first ranked time with any opening wins. Within that time, the first
/// preferred table type that is a case-insensitive substring of a slot's
/// table type wins; otherwise the platform's first slot at that time is
/// taken. Returns `None` when no ranked time has an opening.
pub fn select_best_slot<'a>(
    slots: &'a [Slot],
    ranked_times: &[NaiveTime],
    preferred_table_types: Option<&[String]>,
) -> Option<&'a Slot> {
    if slots.is_empty() {
        return None;
    }

    let mut by_time: HashMap<NaiveTime, Vec<&Slot>> = HashMap::new();
    for slot in slots {
        by_time.entry(slot.time).or_default().push(slot);
    }

    let preferred: Vec<String> = preferred_table_types
        .unwrap_or_default()
        .iter()
        .map(|t| t.to_lowercase())
        .collect();

    for time in ranked_times {
        let Some(available) = by_time.get(time) else {
            continue;
        };

        for wanted in &preferred {
            if let Some(slot) = available
                .iter()
                .copied()
                .find(|s| s.table_type.to_lowercase().contains(wanted.as_str()))
            {
                return Some(slot);
            }
        }

        return available.first().copied();
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_empty_slots_selects_nothing() {
        assert!(select_best_slot(&[], &[t(19, 0)], None).is_none());
    }

    #[test]
    fn test_first_ranked_time_with_opening_wins() {
        let slots = vec![
            fixtures::resy_slot(t(18, 0), "Dining Room"),
            fixtures::resy_slot(t(19, 0), "Dining Room"),
        ];
        let ranked = [t(19, 0), t(18, 45), t(19, 15), t(18, 0)];

        let chosen = select_best_slot(&slots, &ranked, None).unwrap();
        assert_eq!(chosen.time, t(19, 0));
    }

    #[test]
    fn test_no_ranked_time_matches() {
        let slots = vec![fixtures::resy_slot(t(21, 0), "Bar")];
        assert!(select_best_slot(&slots, &[t(19, 0), t(19, 15)], None).is_none());
    }

    #[test]
    fn test_table_type_is_case_insensitive_substring() {
        let slots = vec![
            fixtures::resy_slot(t(19, 0), "Bar"),
            fixtures::resy_slot(t(19, 0), "Outdoor Patio"),
        ];
        let prefs = vec!["patio".to_string()];

        let chosen = select_best_slot(&slots, &[t(19, 0)], Some(&prefs)).unwrap();
        assert_eq!(chosen.table_type, "Outdoor Patio");
    }

    #[test]
    fn test_table_preference_order_is_respected() {
        let slots = vec![
            fixtures::resy_slot(t(19, 0), "Patio"),
            fixtures::resy_slot(t(19, 0), "Bar"),
        ];
        let prefs = vec!["bar".to_string(), "patio".to_string()];

        let chosen = select_best_slot(&slots, &[t(19, 0)], Some(&prefs)).unwrap();
        assert_eq!(chosen.table_type, "Bar");
    }

    #[test]
    fn test_unmatched_preference_falls_back_to_platform_order() {
        let slots = vec![
            fixtures::resy_slot(t(19, 0), "Bar"),
            fixtures::resy_slot(t(19, 0), "Dining Room"),
        ];
        let prefs = vec!["rooftop".to_string()];

        let chosen = select_best_slot(&slots, &[t(19, 0)], Some(&prefs)).unwrap();
        assert_eq!(chosen.table_type, "Bar");
    }

    #[test]
    fn test_time_rank_beats_table_preference() {
        let slots = vec![
            fixtures::resy_slot(t(19, 15), "Patio"),
            fixtures::resy_slot(t(19, 0), "Bar"),
        ];
        let prefs = vec!["patio".to_string()];

        let chosen = select_best_slot(&slots, &[t(19, 0), t(19, 15)], Some(&prefs)).unwrap();
        assert_eq!(chosen.table_type, "Bar");
    }
}
