//! Slot arithmetic for a single doctor and a single calendar day.
//!
//! Both functions are pure: callers fetch the doctor and the day's bookings
//! from the store first and hand them in.

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveTime, Timelike};

use shared_database::Appointment;

/// Candidate start times `from, from+d, from+2d, ...` strictly before `to`.
///
/// The last slot may run past `to`; only its start has to fit. Returns an
/// empty grid when the window is empty or inverted, or when `slot_minutes` is 0.
pub fn generate_time_grid(from: NaiveTime, to: NaiveTime, slot_minutes: u32) -> Vec<NaiveTime> {
    if slot_minutes == 0 || from >= to {
        return Vec::new();
    }

    // Seconds since midnight, so the walk never wraps past 24:00.
    let step = usize::try_from(u64::from(slot_minutes) * 60).unwrap_or(usize::MAX);
    let start = u64::from(from.num_seconds_from_midnight());
    let end = u64::from(to.num_seconds_from_midnight());

    (start..end)
        .step_by(step)
        .filter_map(|secs| u32::try_from(secs).ok())
        .filter_map(|secs| NaiveTime::from_num_seconds_from_midnight_opt(secs, 0))
        .collect()
}

/// Start times on `date` that are held by a booked appointment.
pub fn occupied_start_times(appointments: &[Appointment], date: NaiveDate) -> HashSet<NaiveTime> {
    appointments
        .iter()
        .filter(|a| a.status.occupies_slot() && a.start_time.date() == date)
        .map(|a| a.start_time.time())
        .collect()
}

/// The grid minus every occupied start time, order preserved.
pub fn filter_available(grid: &[NaiveTime], occupied: &HashSet<NaiveTime>) -> Vec<NaiveTime> {
    grid.iter()
        .copied()
        .filter(|slot| !occupied.contains(slot))
        .collect()
}

pub fn format_slot(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}
