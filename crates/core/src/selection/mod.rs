//! Preference ranking and slot selection.
//!
//! Both halves are pure: the ranker turns a time window into an ordered
//! candidate list once per booking run, and the selector walks that list
//! against whatever a platform reported on each attempt.

mod selector;
mod times;

pub use selector::select_best_slot;
pub use times::{
    format_time, parse_time, rank_preferred_times, snap_to_quantum, TimeParseError, QUANTUM_SECS,
};
