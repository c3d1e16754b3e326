use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;
use uuid::Uuid;

use crate::records::{
    Appointment, Doctor, DoctorAppointmentRow, DoctorListing, DoctorQuery, NewAppointment,
    NewDoctor, NewUser, PatientAppointmentRow, UserAccount,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    /// A uniqueness constraint rejected the write. Concurrent bookings of the
    /// same slot surface here for every writer but the first.
    #[error("Unique constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("Store request failed: {0}")]
    Backend(String),

    #[error("Malformed store payload: {0}")]
    Decode(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable record of users, doctors and appointments.
///
/// Implementations must enforce "at most one booked appointment per
/// `(doctor_id, start_time)`" atomically in `insert_appointment`.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    // --- Doctors ---
    async fn get_doctor(&self, doctor_id: Uuid) -> StoreResult<Doctor>;

    async fn list_doctors(&self, query: &DoctorQuery) -> StoreResult<(Vec<DoctorListing>, u64)>;

    async fn create_doctor(&self, doctor: NewDoctor) -> StoreResult<Doctor>;

    // --- Appointments ---
    async fn find_booked_appointment(
        &self,
        doctor_id: Uuid,
        start_time: NaiveDateTime,
    ) -> StoreResult<Option<Appointment>>;

    async fn list_booked_appointments(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> StoreResult<Vec<Appointment>>;

    async fn insert_appointment(&self, appointment: NewAppointment) -> StoreResult<Appointment>;

    async fn list_patient_appointments(
        &self,
        patient_id: Uuid,
    ) -> StoreResult<Vec<PatientAppointmentRow>>;

    async fn list_doctor_appointments(
        &self,
        doctor_id: Uuid,
    ) -> StoreResult<Vec<DoctorAppointmentRow>>;

    // --- Users ---
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserAccount>>;

    async fn create_user(&self, user: NewUser) -> StoreResult<UserAccount>;
}
