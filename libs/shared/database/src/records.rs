use std::fmt;

use chrono::{DateTime, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::auth::Role;

// ==============================================================================
// USERS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

// ==============================================================================
// DOCTORS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub specialization: String,
    #[serde(with = "time_of_day")]
    pub available_from: NaiveTime,
    #[serde(with = "time_of_day")]
    pub available_to: NaiveTime,
    pub slot_duration: u32,
}

impl Doctor {
    /// Whether `time` falls inside the half-open working window `[from, to)`.
    pub fn works_at(&self, time: NaiveTime) -> bool {
        self.available_from <= time && time < self.available_to
    }

    pub fn has_valid_schedule(&self) -> bool {
        self.available_from < self.available_to && self.slot_duration > 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDoctor {
    pub user_id: Uuid,
    pub specialization: String,
    #[serde(with = "time_of_day")]
    pub available_from: NaiveTime,
    #[serde(with = "time_of_day")]
    pub available_to: NaiveTime,
    pub slot_duration: u32,
}

/// A doctor profile joined with the owning user's display name.
#[derive(Debug, Clone, PartialEq)]
pub struct DoctorListing {
    pub doctor: Doctor,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct DoctorQuery {
    pub page: u32,
    pub limit: u32,
    pub specialization: Option<String>,
}

impl DoctorQuery {
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.limit as usize
    }
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Booked,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    /// Only a booked appointment holds its slot.
    pub fn occupies_slot(&self) -> bool {
        match self {
            AppointmentStatus::Booked => true,
            AppointmentStatus::Cancelled | AppointmentStatus::Completed => false,
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Booked => write!(f, "booked"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::Completed => write!(f, "completed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub status: AppointmentStatus,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub status: AppointmentStatus,
}

/// An appointment as seen by the patient who booked it.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientAppointmentRow {
    pub id: Uuid,
    pub doctor_name: String,
    pub specialization: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub status: AppointmentStatus,
}

/// An appointment as seen by the doctor it is booked with.
#[derive(Debug, Clone, PartialEq)]
pub struct DoctorAppointmentRow {
    pub id: Uuid,
    pub patient_name: String,
    pub patient_email: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub status: AppointmentStatus,
}

/// Serde helpers for `time` columns. Writes `HH:MM`, reads `HH:MM` or `HH:MM:SS`.
pub mod time_of_day {
    use chrono::NaiveTime;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid time of day: {}", raw)))
    }

    pub fn parse(raw: &str) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(raw, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doctor() -> Doctor {
        Doctor {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            specialization: "Dermatologist".to_string(),
            available_from: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            available_to: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            slot_duration: 30,
        }
    }

    #[test]
    fn working_window_is_half_open() {
        let doctor = doctor();
        assert!(doctor.works_at(NaiveTime::from_hms_opt(9, 0, 0).unwrap()));
        assert!(doctor.works_at(NaiveTime::from_hms_opt(16, 59, 0).unwrap()));
        assert!(!doctor.works_at(NaiveTime::from_hms_opt(17, 0, 0).unwrap()));
        assert!(!doctor.works_at(NaiveTime::from_hms_opt(8, 59, 0).unwrap()));
    }

    #[test]
    fn doctor_reads_postgres_time_columns() {
        let id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let parsed: Doctor = serde_json::from_value(json!({
            "id": id,
            "user_id": user_id,
            "specialization": "Cardiologist",
            "available_from": "08:00:00",
            "available_to": "16:00",
            "slot_duration": 45
        }))
        .unwrap();

        assert_eq!(parsed.available_from, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert_eq!(parsed.available_to, NaiveTime::from_hms_opt(16, 0, 0).unwrap());
        assert_eq!(serde_json::to_value(&parsed).unwrap()["available_from"], "08:00");
    }

    #[test]
    fn only_booked_status_occupies_a_slot() {
        assert!(AppointmentStatus::Booked.occupies_slot());
        assert!(!AppointmentStatus::Cancelled.occupies_slot());
        assert!(!AppointmentStatus::Completed.occupies_slot());
    }

    #[test]
    fn query_offset_starts_at_page_one() {
        let query = DoctorQuery { page: 3, limit: 10, specialization: None };
        assert_eq!(query.offset(), 20);
        let first = DoctorQuery { page: 1, limit: 10, specialization: None };
        assert_eq!(first.offset(), 0);
    }
}
