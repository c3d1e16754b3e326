use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::records::{
    Appointment, AppointmentStatus, Doctor, DoctorAppointmentRow, DoctorListing, DoctorQuery,
    NewAppointment, NewDoctor, NewUser, PatientAppointmentRow, UserAccount,
};
use crate::store::{AppointmentStore, StoreError, StoreResult};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, UserAccount>,
    doctors: Vec<Doctor>,
    appointments: Vec<Appointment>,
}

impl Tables {
    fn doctor(&self, doctor_id: Uuid) -> Option<&Doctor> {
        self.doctors.iter().find(|d| d.id == doctor_id)
    }

    fn user_name(&self, user_id: Uuid) -> String {
        self.users
            .get(&user_id)
            .map(|u| u.name.clone())
            .unwrap_or_default()
    }
}

/// Process-local store used for development and tests.
///
/// Every write happens under one write lock, so the booked-slot uniqueness
/// check and the insert are atomic with respect to each other.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an appointment verbatim, bypassing the uniqueness check.
    /// Lets tests stage rows the way a corrupted or legacy table might hold them.
    #[cfg(any(test, feature = "test-utils"))]
    pub async fn insert_raw_appointment(&self, appointment: Appointment) {
        self.tables.write().await.appointments.push(appointment);
    }
}

#[async_trait]
impl AppointmentStore for InMemoryStore {
    async fn get_doctor(&self, doctor_id: Uuid) -> StoreResult<Doctor> {
        let tables = self.tables.read().await;
        tables
            .doctor(doctor_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("Doctor".to_string()))
    }

    async fn list_doctors(&self, query: &DoctorQuery) -> StoreResult<(Vec<DoctorListing>, u64)> {
        let tables = self.tables.read().await;
        let needle = query.specialization.as_ref().map(|s| s.to_lowercase());

        let matching: Vec<&Doctor> = tables
            .doctors
            .iter()
            .filter(|d| match &needle {
                Some(needle) => d.specialization.to_lowercase().contains(needle),
                None => true,
            })
            .collect();

        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(query.offset())
            .take(query.limit as usize)
            .map(|doctor| DoctorListing {
                name: tables.user_name(doctor.user_id),
                doctor: doctor.clone(),
            })
            .collect();

        Ok((page, total))
    }

    async fn create_doctor(&self, doctor: NewDoctor) -> StoreResult<Doctor> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&doctor.user_id) {
            return Err(StoreError::NotFound("User".to_string()));
        }
        if tables.doctors.iter().any(|d| d.user_id == doctor.user_id) {
            return Err(StoreError::ConstraintViolation(format!(
                "doctor profile already exists for user {}",
                doctor.user_id
            )));
        }

        let created = Doctor {
            id: Uuid::new_v4(),
            user_id: doctor.user_id,
            specialization: doctor.specialization,
            available_from: doctor.available_from,
            available_to: doctor.available_to,
            slot_duration: doctor.slot_duration,
        };
        tables.doctors.push(created.clone());
        Ok(created)
    }

    async fn find_booked_appointment(
        &self,
        doctor_id: Uuid,
        start_time: NaiveDateTime,
    ) -> StoreResult<Option<Appointment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .appointments
            .iter()
            .find(|a| {
                a.doctor_id == doctor_id
                    && a.start_time == start_time
                    && a.status == AppointmentStatus::Booked
            })
            .cloned())
    }

    async fn list_booked_appointments(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> StoreResult<Vec<Appointment>> {
        let tables = self.tables.read().await;
        let mut booked: Vec<Appointment> = tables
            .appointments
            .iter()
            .filter(|a| {
                a.doctor_id == doctor_id
                    && a.start_time.date() == date
                    && a.status == AppointmentStatus::Booked
            })
            .cloned()
            .collect();
        booked.sort_by_key(|a| a.start_time);
        Ok(booked)
    }

    async fn insert_appointment(&self, appointment: NewAppointment) -> StoreResult<Appointment> {
        let mut tables = self.tables.write().await;

        if appointment.status.occupies_slot()
            && tables.appointments.iter().any(|a| {
                a.doctor_id == appointment.doctor_id
                    && a.start_time == appointment.start_time
                    && a.status.occupies_slot()
            })
        {
            debug!(
                "Rejecting duplicate booking for doctor {} at {}",
                appointment.doctor_id, appointment.start_time
            );
            return Err(StoreError::ConstraintViolation(format!(
                "doctor {} already booked at {}",
                appointment.doctor_id, appointment.start_time
            )));
        }

        let created = Appointment {
            id: Uuid::new_v4(),
            doctor_id: appointment.doctor_id,
            patient_id: appointment.patient_id,
            start_time: appointment.start_time,
            end_time: appointment.end_time,
            status: appointment.status,
            created_at: Some(Utc::now()),
        };
        tables.appointments.push(created.clone());
        Ok(created)
    }

    async fn list_patient_appointments(
        &self,
        patient_id: Uuid,
    ) -> StoreResult<Vec<PatientAppointmentRow>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<PatientAppointmentRow> = tables
            .appointments
            .iter()
            .filter(|a| a.patient_id == patient_id)
            .map(|a| {
                let doctor = tables.doctor(a.doctor_id);
                PatientAppointmentRow {
                    id: a.id,
                    doctor_name: doctor.map(|d| tables.user_name(d.user_id)).unwrap_or_default(),
                    specialization: doctor.map(|d| d.specialization.clone()).unwrap_or_default(),
                    start_time: a.start_time,
                    end_time: a.end_time,
                    status: a.status,
                }
            })
            .collect();
        rows.sort_by_key(|r| r.start_time);
        Ok(rows)
    }

    async fn list_doctor_appointments(
        &self,
        doctor_id: Uuid,
    ) -> StoreResult<Vec<DoctorAppointmentRow>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<DoctorAppointmentRow> = tables
            .appointments
            .iter()
            .filter(|a| a.doctor_id == doctor_id)
            .map(|a| {
                let patient = tables.users.get(&a.patient_id);
                DoctorAppointmentRow {
                    id: a.id,
                    patient_name: patient.map(|p| p.name.clone()).unwrap_or_default(),
                    patient_email: patient.map(|p| p.email.clone()).unwrap_or_default(),
                    start_time: a.start_time,
                    end_time: a.end_time,
                    status: a.status,
                }
            })
            .collect();
        rows.sort_by_key(|r| r.start_time);
        Ok(rows)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserAccount>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<UserAccount> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::ConstraintViolation(format!(
                "email {} already registered",
                user.email
            )));
        }

        let created = UserAccount {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: Some(Utc::now()),
        };
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use shared_models::auth::Role;

    async fn seed_doctor(store: &InMemoryStore) -> Doctor {
        let user = store
            .create_user(NewUser {
                name: "Dr. John Smith".to_string(),
                email: "john.smith@hospital.com".to_string(),
                password_hash: "hash".to_string(),
                role: Role::Doctor,
            })
            .await
            .unwrap();

        store
            .create_doctor(NewDoctor {
                user_id: user.id,
                specialization: "Dermatologist".to_string(),
                available_from: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                available_to: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
                slot_duration: 30,
            })
            .await
            .unwrap()
    }

    fn at(date: &str, time: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{} {}", date, time), "%Y-%m-%d %H:%M").unwrap()
    }

    #[tokio::test]
    async fn rejects_second_booked_row_for_same_slot() {
        let store = InMemoryStore::new();
        let doctor = seed_doctor(&store).await;
        let new = NewAppointment {
            doctor_id: doctor.id,
            patient_id: Uuid::new_v4(),
            start_time: at("2025-01-15", "10:00"),
            end_time: at("2025-01-15", "10:30"),
            status: AppointmentStatus::Booked,
        };

        store.insert_appointment(new.clone()).await.unwrap();
        let second = store.insert_appointment(new).await;

        assert!(matches!(second, Err(StoreError::ConstraintViolation(_))));
    }

    #[tokio::test]
    async fn cancelled_rows_do_not_hold_the_slot() {
        let store = InMemoryStore::new();
        let doctor = seed_doctor(&store).await;
        let start = at("2025-01-15", "10:00");

        store
            .insert_raw_appointment(Appointment {
                id: Uuid::new_v4(),
                doctor_id: doctor.id,
                patient_id: Uuid::new_v4(),
                start_time: start,
                end_time: at("2025-01-15", "10:30"),
                status: AppointmentStatus::Cancelled,
                created_at: None,
            })
            .await;

        assert!(store.find_booked_appointment(doctor.id, start).await.unwrap().is_none());
        assert!(store.list_booked_appointments(doctor.id, start.date()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn lists_doctors_with_case_insensitive_filter() {
        let store = InMemoryStore::new();
        seed_doctor(&store).await;

        let query = DoctorQuery { page: 1, limit: 10, specialization: Some("derma".to_string()) };
        let (doctors, total) = store.list_doctors(&query).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(doctors[0].name, "Dr. John Smith");

        let query = DoctorQuery { page: 1, limit: 10, specialization: Some("cardio".to_string()) };
        let (doctors, total) = store.list_doctors(&query).await.unwrap();
        assert_eq!(total, 0);
        assert!(doctors.is_empty());
    }

    #[tokio::test]
    async fn duplicate_email_is_a_constraint_violation() {
        let store = InMemoryStore::new();
        seed_doctor(&store).await;

        let result = store
            .create_user(NewUser {
                name: "Someone Else".to_string(),
                email: "john.smith@hospital.com".to_string(),
                password_hash: "hash".to_string(),
                role: Role::Patient,
            })
            .await;

        assert!(matches!(result, Err(StoreError::ConstraintViolation(_))));
    }
}
