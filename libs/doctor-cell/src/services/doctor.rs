use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::{AppointmentStore, Doctor, DoctorQuery};

use crate::models::{
    DoctorError, DoctorListResponse, DoctorSearchQuery, DoctorSummary, DEFAULT_LIMIT, DEFAULT_PAGE,
};
use crate::services::slots::{filter_available, generate_time_grid, occupied_start_times};

pub struct DoctorService {
    store: Arc<dyn AppointmentStore>,
}

impl DoctorService {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }

    /// Paginated doctor directory with an optional specialization filter.
    pub async fn list_doctors(
        &self,
        query: DoctorSearchQuery,
    ) -> Result<DoctorListResponse, DoctorError> {
        let page = query.page.unwrap_or(DEFAULT_PAGE);
        let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
        if page == 0 || limit == 0 {
            return Err(DoctorError::InvalidQuery(
                "page and limit must be at least 1".to_string(),
            ));
        }

        let specialization = query
            .specialization
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        debug!("Listing doctors page {} limit {} specialization {:?}", page, limit, specialization);

        let (listings, total) = self
            .store
            .list_doctors(&DoctorQuery {
                page,
                limit,
                specialization,
            })
            .await?;

        Ok(DoctorListResponse {
            data: listings.into_iter().map(DoctorSummary::from).collect(),
            total,
            page,
            limit,
            total_pages: total.div_ceil(limit as u64),
        })
    }

    pub async fn get_doctor(&self, doctor_id: Uuid) -> Result<Doctor, DoctorError> {
        Ok(self.store.get_doctor(doctor_id).await?)
    }

    /// Free slot start times for `doctor_id` on `date`, ascending.
    pub async fn compute_available_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<NaiveTime>, DoctorError> {
        let doctor = self.get_doctor(doctor_id).await?;
        if !doctor.has_valid_schedule() {
            warn!(
                "Doctor {} has an unusable schedule {}-{} / {} min",
                doctor.id, doctor.available_from, doctor.available_to, doctor.slot_duration
            );
        }

        let booked = self.store.list_booked_appointments(doctor_id, date).await?;

        let grid = generate_time_grid(doctor.available_from, doctor.available_to, doctor.slot_duration);
        let free = filter_available(&grid, &occupied_start_times(&booked, date));

        debug!(
            "Doctor {} on {}: {} of {} slots free",
            doctor_id,
            date,
            free.len(),
            grid.len()
        );
        Ok(free)
    }
}
