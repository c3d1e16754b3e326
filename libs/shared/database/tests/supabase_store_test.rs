use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_config::AppConfig;
use shared_database::{
    AppointmentStatus, AppointmentStore, DoctorQuery, NewAppointment, StoreError, SupabaseStore,
};

fn config_for(server: &MockServer) -> AppConfig {
    AppConfig {
        supabase_url: server.uri(),
        supabase_service_key: "service-key".to_string(),
        jwt_secret: "secret".to_string(),
        jwt_expiry_hours: 24,
        port: 3000,
        frontend_url: "http://localhost:3000".to_string(),
    }
}

fn doctor_row(id: Uuid) -> serde_json::Value {
    json!({
        "id": id,
        "user_id": Uuid::new_v4(),
        "specialization": "Dermatologist",
        "available_from": "09:00:00",
        "available_to": "17:00:00",
        "slot_duration": 30
    })
}

fn start(date: &str, time: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(&format!("{}T{}", date, time), "%Y-%m-%dT%H:%M").unwrap()
}

#[tokio::test]
async fn get_doctor_sends_service_key_and_parses_row() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", format!("eq.{}", doctor_id)))
        .and(header("apikey", "service-key"))
        .and(header("authorization", "Bearer service-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([doctor_row(doctor_id)])))
        .mount(&server)
        .await;

    let store = SupabaseStore::new(&config_for(&server));
    let doctor = store.get_doctor(doctor_id).await.unwrap();

    assert_eq!(doctor.id, doctor_id);
    assert_eq!(doctor.available_from, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    assert_eq!(doctor.slot_duration, 30);
}

#[tokio::test]
async fn missing_doctor_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let store = SupabaseStore::new(&config_for(&server));
    let result = store.get_doctor(Uuid::new_v4()).await;

    assert_matches!(result, Err(StoreError::NotFound(_)));
}

#[tokio::test]
async fn unique_violation_on_insert_is_constraint_violation() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .and(header("prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "details": "Key (doctor_id, start_time)=(...) already exists.",
            "message": "duplicate key value violates unique constraint \"appointments_one_booked_per_slot\""
        })))
        .mount(&server)
        .await;

    let store = SupabaseStore::new(&config_for(&server));
    let result = store
        .insert_appointment(NewAppointment {
            doctor_id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            start_time: start("2025-01-15", "10:00"),
            end_time: start("2025-01-15", "10:30"),
            status: AppointmentStatus::Booked,
        })
        .await;

    assert_matches!(result, Err(StoreError::ConstraintViolation(_)));
}

#[tokio::test]
async fn booked_appointments_are_queried_for_one_day() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .and(query_param("status", "eq.booked"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": Uuid::new_v4(),
            "doctor_id": doctor_id,
            "patient_id": Uuid::new_v4(),
            "start_time": "2025-01-15T09:00:00",
            "end_time": "2025-01-15T09:30:00",
            "status": "booked",
            "created_at": "2025-01-10T08:00:00+00:00"
        }])))
        .mount(&server)
        .await;

    let store = SupabaseStore::new(&config_for(&server));
    let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
    let booked = store.list_booked_appointments(doctor_id, date).await.unwrap();

    assert_eq!(booked.len(), 1);
    assert_eq!(booked[0].start_time, start("2025-01-15", "09:00"));
    assert_eq!(booked[0].status, AppointmentStatus::Booked);

    let requests = server.received_requests().await.unwrap();
    let query = requests[0].url.query().unwrap_or_default().to_string();
    assert!(query.contains("start_time=gte.2025-01-15T00:00:00"));
    assert!(query.contains("start_time=lt.2025-01-16T00:00:00"));
}

#[tokio::test]
async fn doctor_listing_reads_total_from_content_range() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let mut row = doctor_row(doctor_id);
    row["user"] = json!({ "name": "Dr. John Smith" });

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("limit", "10"))
        .and(query_param("offset", "0"))
        .and(header("prefer", "count=exact"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-range", "0-0/7")
                .set_body_json(json!([row])),
        )
        .mount(&server)
        .await;

    let store = SupabaseStore::new(&config_for(&server));
    let query = DoctorQuery { page: 1, limit: 10, specialization: Some("derm".to_string()) };
    let (doctors, total) = store.list_doctors(&query).await.unwrap();

    assert_eq!(total, 7);
    assert_eq!(doctors.len(), 1);
    assert_eq!(doctors[0].name, "Dr. John Smith");
    assert_eq!(doctors[0].doctor.id, doctor_id);
}

#[tokio::test]
async fn server_errors_surface_as_backend_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let store = SupabaseStore::new(&config_for(&server));
    let result = store.find_user_by_email("alice@example.com").await;

    assert_matches!(result, Err(StoreError::Backend(_)));
}
