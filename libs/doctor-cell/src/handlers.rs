use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use shared_database::AppState;
use shared_models::error::AppError;

use crate::models::{
    parse_date, AvailableSlotsResponse, DoctorListResponse, DoctorSearchQuery, SlotsQuery,
};
use crate::services::{slots::format_slot, DoctorService};

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<AppState>,
    Query(query): Query<DoctorSearchQuery>,
) -> Result<Json<DoctorListResponse>, AppError> {
    let doctor_service = DoctorService::new(state.store.clone());

    let doctors = doctor_service.list_doctors(query).await?;

    Ok(Json(doctors))
}

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<AppState>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<AvailableSlotsResponse>, AppError> {
    let date = parse_date(&query.date)?;
    let doctor_service = DoctorService::new(state.store.clone());

    let slots = doctor_service.compute_available_slots(doctor_id, date).await?;

    Ok(Json(AvailableSlotsResponse {
        doctor_id,
        date,
        available_slots: slots.into_iter().map(format_slot).collect(),
    }))
}
