use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::{
    Appointment, AppointmentStatus, DoctorAppointmentRow, PatientAppointmentRow, StoreError,
};
use shared_models::error::AppError;

use crate::services::validator::BookingStage;

/// `H:MM` or `HH:MM`, 24-hour clock.
static TIME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-1]?[0-9]|2[0-3]):[0-5][0-9]$").unwrap());

// ==============================================================================
// REQUESTS
// ==============================================================================

/// Raw booking body. Fields stay optional strings so missing or malformed
/// values can be reported with the booking error kinds instead of a generic
/// JSON rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookAppointmentRequest {
    pub doctor_id: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
}

/// A booking request after shape validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingInput {
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl BookAppointmentRequest {
    pub fn into_input(self, patient_id: Uuid) -> Result<BookingInput, AppointmentError> {
        let doctor_id = Uuid::parse_str(self.doctor_id.as_deref().unwrap_or_default().trim())
            .map_err(|_| AppointmentError::InvalidRequest("doctorId must be a UUID".to_string()))?;

        let date = NaiveDate::parse_from_str(self.date.as_deref().unwrap_or_default().trim(), "%Y-%m-%d")
            .map_err(|_| {
                AppointmentError::InvalidSlot("Date must be in YYYY-MM-DD format".to_string())
            })?;

        let time = parse_time(self.time.as_deref().unwrap_or_default().trim())?;

        Ok(BookingInput {
            doctor_id,
            patient_id,
            date,
            time,
        })
    }
}

pub fn parse_time(raw: &str) -> Result<NaiveTime, AppointmentError> {
    let invalid = || AppointmentError::InvalidSlot("Time must be in HH:MM format".to_string());

    if !TIME_PATTERN.is_match(raw) {
        return Err(invalid());
    }

    let (hours, minutes) = raw.split_once(':').ok_or_else(invalid)?;
    let hours: u32 = hours.parse().map_err(|_| invalid())?;
    let minutes: u32 = minutes.parse().map_err(|_| invalid())?;

    NaiveTime::from_hms_opt(hours, minutes, 0).ok_or_else(invalid)
}

// ==============================================================================
// RESPONSES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentResponse {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub status: AppointmentStatus,
}

impl From<Appointment> for AppointmentResponse {
    fn from(appointment: Appointment) -> Self {
        Self {
            id: appointment.id,
            doctor_id: appointment.doctor_id,
            start_time: appointment.start_time,
            end_time: appointment.end_time,
            status: appointment.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientAppointmentView {
    pub id: Uuid,
    pub doctor_name: String,
    pub specialization: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub status: AppointmentStatus,
}

impl From<PatientAppointmentRow> for PatientAppointmentView {
    fn from(row: PatientAppointmentRow) -> Self {
        Self {
            id: row.id,
            doctor_name: row.doctor_name,
            specialization: row.specialization,
            start_time: row.start_time,
            end_time: row.end_time,
            status: row.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorAppointmentView {
    pub id: Uuid,
    pub patient_name: String,
    pub patient_email: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub status: AppointmentStatus,
}

impl From<DoctorAppointmentRow> for DoctorAppointmentView {
    fn from(row: DoctorAppointmentRow) -> Self {
        Self {
            id: row.id,
            patient_name: row.patient_name,
            patient_email: row.patient_email,
            start_time: row.start_time,
            end_time: row.end_time,
            status: row.status,
        }
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppointmentError {
    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("{0}")]
    InvalidSlot(String),

    #[error("Slot already booked for this doctor")]
    Conflict,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Booking step attempted out of order at stage {0}")]
    OutOfSequence(BookingStage),

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl AppointmentError {
    pub fn outside_working_hours() -> Self {
        AppointmentError::InvalidSlot("Selected time is outside doctor availability".to_string())
    }
}

impl From<StoreError> for AppointmentError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ConstraintViolation(_) => AppointmentError::Conflict,
            other => AppointmentError::Store(other),
        }
    }
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::DoctorNotFound => AppError::NotFound(err.to_string()),
            AppointmentError::InvalidSlot(_) => AppError::BadRequest(err.to_string()),
            AppointmentError::InvalidRequest(_) => AppError::ValidationError(err.to_string()),
            AppointmentError::Conflict => AppError::Conflict(err.to_string()),
            AppointmentError::OutOfSequence(_) => AppError::Internal(err.to_string()),
            AppointmentError::Store(inner) => AppError::Database(inner.to_string()),
        }
    }
}
