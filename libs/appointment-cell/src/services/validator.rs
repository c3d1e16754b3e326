//! Decision logic for one booking request.
//!
//! A [`BookingAttempt`] starts in `Received` and moves to `Validated` once
//! every rule has passed, then to `Committed` when the store accepts the row.
//! Any failing rule moves it to `Rejected`. Rules are checked in a fixed order
//! (doctor exists, time inside the working window, slot not taken) and the
//! first failure wins. The attempt performs no I/O; the booking service feeds
//! it the results of each store call.

use std::fmt;

use chrono::{Duration, NaiveDateTime};
use tracing::{debug, warn};

use shared_database::{Appointment, AppointmentStatus, Doctor, NewAppointment, StoreError};

use crate::models::{AppointmentError, BookingInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStage {
    Received,
    Validated,
    Committed,
    Rejected,
}

impl BookingStage {
    pub fn valid_transitions(&self) -> &'static [BookingStage] {
        match self {
            BookingStage::Received => &[BookingStage::Validated, BookingStage::Rejected],
            // The store can still refuse a validated row.
            BookingStage::Validated => &[BookingStage::Committed, BookingStage::Rejected],
            BookingStage::Committed | BookingStage::Rejected => &[],
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

impl fmt::Display for BookingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BookingStage::Received => "RECEIVED",
            BookingStage::Validated => "VALIDATED",
            BookingStage::Committed => "COMMITTED",
            BookingStage::Rejected => "REJECTED",
        };
        f.write_str(label)
    }
}

/// Absolute start and end of the requested slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotWindow {
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
}

#[derive(Debug)]
pub struct BookingAttempt {
    input: BookingInput,
    stage: BookingStage,
    slot: Option<SlotWindow>,
}

impl BookingAttempt {
    pub fn receive(input: BookingInput) -> Self {
        debug!(
            "Booking received: doctor {} on {} at {}",
            input.doctor_id, input.date, input.time
        );
        Self {
            input,
            stage: BookingStage::Received,
            slot: None,
        }
    }

    pub fn stage(&self) -> BookingStage {
        self.stage
    }

    /// Rules 1 and 2: the doctor lookup succeeded and the requested time lies
    /// in `[available_from, available_to)`. Fixes the slot's absolute bounds.
    pub fn check_doctor(
        &mut self,
        lookup: Result<Doctor, StoreError>,
    ) -> Result<SlotWindow, AppointmentError> {
        self.expect_stage(BookingStage::Received)?;

        let doctor = match lookup {
            Ok(doctor) => doctor,
            Err(StoreError::NotFound(_)) => return Err(self.reject(AppointmentError::DoctorNotFound)),
            Err(other) => return Err(self.reject(other.into())),
        };

        if !doctor.works_at(self.input.time) {
            return Err(self.reject(AppointmentError::outside_working_hours()));
        }

        let start_time = self.input.date.and_time(self.input.time);
        let slot = SlotWindow {
            start_time,
            end_time: start_time + Duration::minutes(i64::from(doctor.slot_duration)),
        };
        self.slot = Some(slot);
        Ok(slot)
    }

    /// Rule 3: nothing is booked at the exact start time. On success the
    /// attempt is `Validated` and returns the row to insert.
    pub fn check_conflict(
        &mut self,
        lookup: Result<Option<Appointment>, StoreError>,
    ) -> Result<NewAppointment, AppointmentError> {
        self.expect_stage(BookingStage::Received)?;
        let slot = self
            .slot
            .ok_or(AppointmentError::OutOfSequence(self.stage))?;

        let existing = lookup.map_err(|err| self.reject(err.into()))?;
        if let Some(taken) = existing {
            if taken.status.occupies_slot() {
                return Err(self.reject(AppointmentError::Conflict));
            }
        }

        self.advance(BookingStage::Validated);
        Ok(NewAppointment {
            doctor_id: self.input.doctor_id,
            patient_id: self.input.patient_id,
            start_time: slot.start_time,
            end_time: slot.end_time,
            status: AppointmentStatus::Booked,
        })
    }

    /// Records the store's answer to the insert. A uniqueness violation means
    /// another request won the slot after our pre-check.
    pub fn commit(
        &mut self,
        inserted: Result<Appointment, StoreError>,
    ) -> Result<Appointment, AppointmentError> {
        self.expect_stage(BookingStage::Validated)?;

        match inserted {
            Ok(appointment) => {
                self.advance(BookingStage::Committed);
                Ok(appointment)
            }
            Err(err) => Err(self.reject(err.into())),
        }
    }

    fn expect_stage(&self, expected: BookingStage) -> Result<(), AppointmentError> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(AppointmentError::OutOfSequence(self.stage))
        }
    }

    fn advance(&mut self, next: BookingStage) {
        debug_assert!(self.stage.valid_transitions().contains(&next));
        debug!("Booking for doctor {}: {} -> {}", self.input.doctor_id, self.stage, next);
        self.stage = next;
    }

    fn reject(&mut self, err: AppointmentError) -> AppointmentError {
        warn!(
            "Booking rejected for doctor {} on {} at {}: {}",
            self.input.doctor_id, self.input.date, self.input.time, err
        );
        self.advance(BookingStage::Rejected);
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{NaiveDate, NaiveTime};
    use uuid::Uuid;

    fn t(raw: &str) -> NaiveTime {
        NaiveTime::parse_from_str(raw, "%H:%M").unwrap()
    }

    fn doctor(from: &str, to: &str, slot_duration: u32) -> Doctor {
        Doctor {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            specialization: "Dermatologist".to_string(),
            available_from: t(from),
            available_to: t(to),
            slot_duration,
        }
    }

    fn input_for(doctor: &Doctor, time: &str) -> BookingInput {
        BookingInput {
            doctor_id: doctor.id,
            patient_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            time: t(time),
        }
    }

    fn booked_at(slot: SlotWindow, status: AppointmentStatus) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            doctor_id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            start_time: slot.start_time,
            end_time: slot.end_time,
            status,
            created_at: None,
        }
    }

    #[test]
    fn off_grid_time_inside_window_is_committed_with_slot_length() {
        let doc = doctor("09:00", "17:00", 30);
        let mut attempt = BookingAttempt::receive(input_for(&doc, "10:15"));

        let slot = attempt.check_doctor(Ok(doc.clone())).unwrap();
        let row = attempt.check_conflict(Ok(None)).unwrap();
        assert_eq!(attempt.stage(), BookingStage::Validated);
        assert_eq!(row.status, AppointmentStatus::Booked);
        assert_eq!(row.start_time.time(), t("10:15"));
        assert_eq!(row.end_time.time(), t("10:45"));

        let committed = attempt.commit(Ok(booked_at(slot, AppointmentStatus::Booked))).unwrap();
        assert_eq!(committed.end_time, slot.end_time);
        assert_eq!(attempt.stage(), BookingStage::Committed);
        assert!(attempt.stage().is_terminal());
    }

    #[test]
    fn missing_doctor_wins_over_everything_else() {
        let doc = doctor("09:00", "10:00", 30);
        let mut attempt = BookingAttempt::receive(input_for(&doc, "23:00"));

        let result = attempt.check_doctor(Err(StoreError::NotFound("Doctor".to_string())));
        assert_eq!(result, Err(AppointmentError::DoctorNotFound));
        assert_eq!(attempt.stage(), BookingStage::Rejected);
    }

    #[test]
    fn working_window_is_half_open() {
        let doc = doctor("09:00", "17:00", 30);

        let mut at_open = BookingAttempt::receive(input_for(&doc, "09:00"));
        assert!(at_open.check_doctor(Ok(doc.clone())).is_ok());

        let mut at_close = BookingAttempt::receive(input_for(&doc, "17:00"));
        assert_matches!(
            at_close.check_doctor(Ok(doc.clone())),
            Err(AppointmentError::InvalidSlot(_))
        );
        assert_eq!(at_close.stage(), BookingStage::Rejected);

        let mut before_open = BookingAttempt::receive(input_for(&doc, "08:59"));
        assert_matches!(
            before_open.check_doctor(Ok(doc)),
            Err(AppointmentError::InvalidSlot(_))
        );
    }

    #[test]
    fn booked_row_at_same_start_is_a_conflict() {
        let doc = doctor("09:00", "17:00", 30);
        let mut attempt = BookingAttempt::receive(input_for(&doc, "10:00"));
        let slot = attempt.check_doctor(Ok(doc)).unwrap();

        let existing = booked_at(slot, AppointmentStatus::Booked);
        assert_eq!(attempt.check_conflict(Ok(Some(existing))), Err(AppointmentError::Conflict));
        assert_eq!(attempt.stage(), BookingStage::Rejected);
    }

    #[test]
    fn cancelled_row_at_same_start_does_not_block() {
        let doc = doctor("09:00", "17:00", 30);
        let mut attempt = BookingAttempt::receive(input_for(&doc, "10:00"));
        let slot = attempt.check_doctor(Ok(doc)).unwrap();

        let existing = booked_at(slot, AppointmentStatus::Cancelled);
        assert!(attempt.check_conflict(Ok(Some(existing))).is_ok());
    }

    #[test]
    fn failed_booking_lookup_rejects_the_attempt() {
        let doc = doctor("09:00", "17:00", 30);
        let mut attempt = BookingAttempt::receive(input_for(&doc, "10:00"));
        attempt.check_doctor(Ok(doc)).unwrap();

        let result = attempt.check_conflict(Err(StoreError::Backend("timeout".to_string())));
        assert_matches!(result, Err(AppointmentError::Store(StoreError::Backend(_))));
        assert_eq!(attempt.stage(), BookingStage::Rejected);
    }

    #[test]
    fn losing_the_insert_race_is_a_conflict() {
        let doc = doctor("09:00", "17:00", 30);
        let mut attempt = BookingAttempt::receive(input_for(&doc, "10:00"));
        attempt.check_doctor(Ok(doc)).unwrap();
        attempt.check_conflict(Ok(None)).unwrap();

        let result = attempt.commit(Err(StoreError::ConstraintViolation("dup".to_string())));
        assert_eq!(result, Err(AppointmentError::Conflict));
        assert_eq!(attempt.stage(), BookingStage::Rejected);
    }

    #[test]
    fn steps_out_of_order_are_refused() {
        let doc = doctor("09:00", "17:00", 30);
        let mut attempt = BookingAttempt::receive(input_for(&doc, "10:00"));

        assert_eq!(
            attempt.check_conflict(Ok(None)),
            Err(AppointmentError::OutOfSequence(BookingStage::Received))
        );
        assert_matches!(
            attempt.commit(Err(StoreError::Backend("x".to_string()))),
            Err(AppointmentError::OutOfSequence(BookingStage::Received))
        );
        assert_eq!(attempt.stage(), BookingStage::Received);
    }
}
