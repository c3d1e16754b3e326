use axum::{
    extract::{rejection::JsonRejection, Extension, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use shared_database::AppState;
use shared_models::auth::{AuthUser, Role};
use shared_models::error::AppError;
use shared_utils::extractor::require_role;

use crate::models::{
    AppointmentResponse, BookAppointmentRequest, DoctorAppointmentView, PatientAppointmentView,
};
use crate::services::AppointmentBookingService;

/// Books a slot for the calling patient.
#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: Result<Json<BookAppointmentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AppointmentResponse>), AppError> {
    require_role(&user, Role::Patient)?;

    let Json(request) = body.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let input = request.into_input(user.id)?;
    let booking_service = AppointmentBookingService::new(state.store.clone());

    let appointment = booking_service.book_appointment(input).await?;

    Ok((StatusCode::CREATED, Json(appointment.into())))
}

#[axum::debug_handler]
pub async fn get_my_appointments(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<PatientAppointmentView>>, AppError> {
    require_role(&user, Role::Patient)?;

    let booking_service = AppointmentBookingService::new(state.store.clone());
    let appointments = booking_service.find_my_appointments(user.id).await?;

    Ok(Json(appointments))
}

#[axum::debug_handler]
pub async fn get_doctor_appointments(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Vec<DoctorAppointmentView>>, AppError> {
    require_role(&user, Role::Doctor)?;

    let booking_service = AppointmentBookingService::new(state.store.clone());
    let appointments = booking_service.find_doctor_appointments(doctor_id).await?;

    Ok(Json(appointments))
}
