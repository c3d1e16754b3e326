use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE, CONTENT_TYPE},
    Client, Method, Response, StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use tracing::{debug, error};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::records::{
    Appointment, AppointmentStatus, Doctor, DoctorAppointmentRow, DoctorListing, DoctorQuery,
    NewAppointment, NewDoctor, NewUser, PatientAppointmentRow, UserAccount,
};
use crate::store::{AppointmentStore, StoreError, StoreResult};

/// Postgres SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

const DOCTOR_COLUMNS: &str =
    "id,user_id,specialization,available_from,available_to,slot_duration";

/// Thin PostgREST client for the Supabase project backing the store.
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            service_key: config.supabase_service_key.clone(),
        }
    }

    fn get_headers(&self) -> StoreResult<HeaderMap> {
        let mut headers = HeaderMap::new();

        let key = HeaderValue::from_str(&self.service_key)
            .map_err(|_| StoreError::Backend("Service key is not a valid header value".to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.service_key))
            .map_err(|_| StoreError::Backend("Service key is not a valid header value".to_string()))?;

        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(headers)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> StoreResult<Response> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers()?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);
        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req
            .send()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response.text().await.unwrap_or_default();
        error!("PostgREST error ({}): {}", status, error_text);
        Err(classify_error(status, &error_text))
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> StoreResult<T>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> StoreResult<T>
    where
        T: DeserializeOwned,
    {
        let response = self.send(method, path, body, extra_headers).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// GET with `Prefer: count=exact`, returning the rows and the total from `Content-Range`.
    pub async fn request_with_count<T>(&self, path: &str) -> StoreResult<(T, Option<u64>)>
    where
        T: DeserializeOwned,
    {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("count=exact"));

        let response = self.send(Method::GET, path, None, Some(headers)).await?;
        let total = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_content_range_total);

        let rows = response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        Ok((rows, total))
    }

    pub async fn insert<T>(&self, table: &str, body: Value) -> StoreResult<T>
    where
        T: DeserializeOwned,
    {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let mut rows: Vec<T> = self
            .request_with_headers(Method::POST, &format!("/rest/v1/{}", table), Some(body), Some(headers))
            .await?;

        if rows.is_empty() {
            return Err(StoreError::Decode(format!("Insert into {} returned no rows", table)));
        }
        Ok(rows.swap_remove(0))
    }
}

fn classify_error(status: StatusCode, body: &str) -> StoreError {
    let code = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("code").and_then(|c| c.as_str()).map(str::to_string));

    match status.as_u16() {
        409 if code.as_deref() == Some(UNIQUE_VIOLATION) => {
            StoreError::ConstraintViolation(body.to_string())
        }
        401 | 403 => StoreError::Backend(format!("Authentication error: {}", body)),
        404 => StoreError::NotFound(format!("Resource ({})", body)),
        _ => StoreError::Backend(format!("API error ({}): {}", status, body)),
    }
}

/// `Content-Range: 0-9/42` -> `42`. `*` totals are unknown.
fn parse_content_range_total(raw: &str) -> Option<u64> {
    raw.rsplit('/').next().and_then(|total| total.parse().ok())
}

// ==============================================================================
// POSTGREST ROW SHAPES (embedded resources)
// ==============================================================================

#[derive(Deserialize)]
struct UserName {
    name: String,
}

#[derive(Deserialize)]
struct UserContact {
    name: String,
    email: String,
}

#[derive(Deserialize)]
struct DoctorWithUser {
    #[serde(flatten)]
    doctor: Doctor,
    user: Option<UserName>,
}

#[derive(Deserialize)]
struct DoctorSummary {
    specialization: String,
    user: Option<UserName>,
}

#[derive(Deserialize)]
struct PatientAppointmentRecord {
    id: Uuid,
    start_time: NaiveDateTime,
    end_time: NaiveDateTime,
    status: AppointmentStatus,
    doctor: Option<DoctorSummary>,
}

#[derive(Deserialize)]
struct DoctorAppointmentRecord {
    id: Uuid,
    start_time: NaiveDateTime,
    end_time: NaiveDateTime,
    status: AppointmentStatus,
    patient: Option<UserContact>,
}

fn timestamp(value: NaiveDateTime) -> String {
    value.format("%Y-%m-%dT%H:%M:%S").to_string()
}

// ==============================================================================
// STORE IMPLEMENTATION
// ==============================================================================

/// `AppointmentStore` backed by Supabase tables `users`, `doctors` and
/// `appointments`. Double-booking is rejected by the partial unique index on
/// `appointments (doctor_id, start_time) WHERE status = 'booked'`.
pub struct SupabaseStore {
    supabase: SupabaseClient,
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }
}

#[async_trait]
impl AppointmentStore for SupabaseStore {
    async fn get_doctor(&self, doctor_id: Uuid) -> StoreResult<Doctor> {
        let path = format!("/rest/v1/doctors?id=eq.{}&select={}&limit=1", doctor_id, DOCTOR_COLUMNS);
        let mut rows: Vec<Doctor> = self.supabase.request(Method::GET, &path, None).await?;

        if rows.is_empty() {
            return Err(StoreError::NotFound("Doctor".to_string()));
        }
        Ok(rows.swap_remove(0))
    }

    async fn list_doctors(&self, query: &DoctorQuery) -> StoreResult<(Vec<DoctorListing>, u64)> {
        let mut path = format!(
            "/rest/v1/doctors?select={},user:users(name)&order=created_at.asc&offset={}&limit={}",
            DOCTOR_COLUMNS,
            query.offset(),
            query.limit
        );
        if let Some(specialization) = &query.specialization {
            path.push_str(&format!(
                "&specialization=ilike.*{}*",
                urlencoding::encode(specialization)
            ));
        }

        let (rows, total): (Vec<DoctorWithUser>, _) = self.supabase.request_with_count(&path).await?;
        let total = total.unwrap_or(rows.len() as u64);

        let listings = rows
            .into_iter()
            .map(|row| DoctorListing {
                name: row.user.map(|u| u.name).unwrap_or_default(),
                doctor: row.doctor,
            })
            .collect();

        Ok((listings, total))
    }

    async fn create_doctor(&self, doctor: NewDoctor) -> StoreResult<Doctor> {
        let body = serde_json::to_value(&doctor).map_err(|e| StoreError::Decode(e.to_string()))?;
        self.supabase.insert("doctors", body).await
    }

    async fn find_booked_appointment(
        &self,
        doctor_id: Uuid,
        start_time: NaiveDateTime,
    ) -> StoreResult<Option<Appointment>> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&start_time=eq.{}&status=eq.{}&limit=1",
            doctor_id,
            timestamp(start_time),
            AppointmentStatus::Booked
        );
        let rows: Vec<Appointment> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(rows.into_iter().next())
    }

    async fn list_booked_appointments(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> StoreResult<Vec<Appointment>> {
        let day_start = date.and_hms_opt(0, 0, 0).unwrap_or_default();
        let next_day = day_start + Duration::days(1);

        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&status=eq.{}&start_time=gte.{}&start_time=lt.{}&order=start_time.asc",
            doctor_id,
            AppointmentStatus::Booked,
            timestamp(day_start),
            timestamp(next_day)
        );
        self.supabase.request(Method::GET, &path, None).await
    }

    async fn insert_appointment(&self, appointment: NewAppointment) -> StoreResult<Appointment> {
        let body =
            serde_json::to_value(&appointment).map_err(|e| StoreError::Decode(e.to_string()))?;
        self.supabase.insert("appointments", body).await
    }

    async fn list_patient_appointments(
        &self,
        patient_id: Uuid,
    ) -> StoreResult<Vec<PatientAppointmentRow>> {
        let path = format!(
            "/rest/v1/appointments?patient_id=eq.{}&select=id,start_time,end_time,status,doctor:doctors(specialization,user:users(name))&order=start_time.asc",
            patient_id
        );
        let rows: Vec<PatientAppointmentRecord> = self.supabase.request(Method::GET, &path, None).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let (doctor_name, specialization) = match row.doctor {
                    Some(doctor) => (
                        doctor.user.map(|u| u.name).unwrap_or_default(),
                        doctor.specialization,
                    ),
                    None => (String::new(), String::new()),
                };
                PatientAppointmentRow {
                    id: row.id,
                    doctor_name,
                    specialization,
                    start_time: row.start_time,
                    end_time: row.end_time,
                    status: row.status,
                }
            })
            .collect())
    }

    async fn list_doctor_appointments(
        &self,
        doctor_id: Uuid,
    ) -> StoreResult<Vec<DoctorAppointmentRow>> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&select=id,start_time,end_time,status,patient:users!patient_id(name,email)&order=start_time.asc",
            doctor_id
        );
        let rows: Vec<DoctorAppointmentRecord> = self.supabase.request(Method::GET, &path, None).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let (patient_name, patient_email) = row
                    .patient
                    .map(|p| (p.name, p.email))
                    .unwrap_or_default();
                DoctorAppointmentRow {
                    id: row.id,
                    patient_name,
                    patient_email,
                    start_time: row.start_time,
                    end_time: row.end_time,
                    status: row.status,
                }
            })
            .collect())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserAccount>> {
        let path = format!("/rest/v1/users?email=eq.{}&limit=1", urlencoding::encode(email));
        let rows: Vec<UserAccount> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(rows.into_iter().next())
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<UserAccount> {
        let body = serde_json::to_value(&user).map_err(|e| StoreError::Decode(e.to_string()))?;
        self.supabase.insert("users", body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_range_total() {
        assert_eq!(parse_content_range_total("0-9/42"), Some(42));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("0-9/*"), None);
    }

    #[test]
    fn only_unique_violations_become_constraint_errors() {
        let unique = classify_error(StatusCode::CONFLICT, r#"{"code":"23505","message":"dup"}"#);
        assert!(matches!(unique, StoreError::ConstraintViolation(_)));

        let foreign_key = classify_error(StatusCode::CONFLICT, r#"{"code":"23503","message":"fk"}"#);
        assert!(matches!(foreign_key, StoreError::Backend(_)));
    }
}
