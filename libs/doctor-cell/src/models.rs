use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::{records::time_of_day, DoctorListing, StoreError};
use shared_models::error::AppError;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

// ==============================================================================
// QUERY PARAMETERS
// ==============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorSearchQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub specialization: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotsQuery {
    pub date: String,
}

// ==============================================================================
// RESPONSES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorSummary {
    pub id: Uuid,
    pub name: String,
    pub specialization: String,
    #[serde(with = "time_of_day")]
    pub available_from: chrono::NaiveTime,
    #[serde(with = "time_of_day")]
    pub available_to: chrono::NaiveTime,
    pub slot_duration: u32,
}

impl From<DoctorListing> for DoctorSummary {
    fn from(listing: DoctorListing) -> Self {
        Self {
            id: listing.doctor.id,
            name: listing.name,
            specialization: listing.doctor.specialization,
            available_from: listing.doctor.available_from,
            available_to: listing.doctor.available_to,
            slot_duration: listing.doctor.slot_duration,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorListResponse {
    pub data: Vec<DoctorSummary>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableSlotsResponse {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub available_slots: Vec<String>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for DoctorError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => DoctorError::NotFound,
            other => DoctorError::Store(other),
        }
    }
}

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound => AppError::NotFound(err.to_string()),
            DoctorError::InvalidDate(_) | DoctorError::InvalidQuery(_) => {
                AppError::BadRequest(err.to_string())
            }
            DoctorError::Store(inner) => AppError::Database(inner.to_string()),
        }
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, DoctorError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| DoctorError::InvalidDate(raw.to_string()))
}
