use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use shared_database::{Appointment, AppointmentStore};

use crate::models::{AppointmentError, BookingInput, DoctorAppointmentView, PatientAppointmentView};
use crate::services::validator::BookingAttempt;

pub struct AppointmentBookingService {
    store: Arc<dyn AppointmentStore>,
}

impl AppointmentBookingService {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }

    /// Books `input.time` on `input.date` with the doctor for the patient.
    ///
    /// The pre-check against existing bookings is best effort. The store's
    /// uniqueness constraint decides concurrent attempts, and its rejection
    /// comes back as [`AppointmentError::Conflict`].
    pub async fn book_appointment(&self, input: BookingInput) -> Result<Appointment, AppointmentError> {
        let mut attempt = BookingAttempt::receive(input);

        let lookup = self.store.get_doctor(input.doctor_id).await;
        let slot = attempt.check_doctor(lookup)?;

        let existing = self
            .store
            .find_booked_appointment(input.doctor_id, slot.start_time)
            .await;
        let new_appointment = attempt.check_conflict(existing)?;

        let inserted = self.store.insert_appointment(new_appointment).await;
        let appointment = attempt.commit(inserted)?;

        info!(
            "Appointment {} booked: doctor {} patient {} {} - {}",
            appointment.id,
            appointment.doctor_id,
            appointment.patient_id,
            appointment.start_time,
            appointment.end_time
        );
        Ok(appointment)
    }

    pub async fn find_my_appointments(
        &self,
        patient_id: Uuid,
    ) -> Result<Vec<PatientAppointmentView>, AppointmentError> {
        debug!("Fetching appointments for patient {}", patient_id);

        let rows = self.store.list_patient_appointments(patient_id).await?;
        Ok(rows.into_iter().map(PatientAppointmentView::from).collect())
    }

    pub async fn find_doctor_appointments(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<DoctorAppointmentView>, AppointmentError> {
        debug!("Fetching appointments for doctor {}", doctor_id);

        let rows = self.store.list_doctor_appointments(doctor_id).await?;
        Ok(rows.into_iter().map(DoctorAppointmentView::from).collect())
    }
}
