use anyhow::{anyhow, Context};
use chrono::NaiveTime;
use tracing::info;

use auth_cell::services::PasswordService;
use shared_database::{AppointmentStore, NewDoctor, NewUser};
use shared_models::auth::Role;

const DEMO_PASSWORD: &str = "password123";

struct DemoDoctor {
    name: &'static str,
    email: &'static str,
    specialization: &'static str,
    from: (u32, u32),
    to: (u32, u32),
    slot_duration: u32,
}

const DEMO_DOCTORS: [DemoDoctor; 4] = [
    DemoDoctor {
        name: "Dr. John Smith",
        email: "john.smith@hospital.com",
        specialization: "Dermatologist",
        from: (9, 0),
        to: (17, 0),
        slot_duration: 30,
    },
    DemoDoctor {
        name: "Dr. Sarah Wilson",
        email: "sarah.wilson@hospital.com",
        specialization: "Cardiologist",
        from: (8, 0),
        to: (16, 0),
        slot_duration: 45,
    },
    DemoDoctor {
        name: "Dr. Michael Brown",
        email: "michael.brown@hospital.com",
        specialization: "Orthopedic",
        from: (10, 0),
        to: (18, 0),
        slot_duration: 30,
    },
    DemoDoctor {
        name: "Dr. Emily Davis",
        email: "emily.davis@hospital.com",
        specialization: "Pediatrician",
        from: (9, 30),
        to: (17, 30),
        slot_duration: 25,
    },
];

fn time_of_day((hour, minute): (u32, u32)) -> anyhow::Result<NaiveTime> {
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| anyhow!("invalid time {}:{}", hour, minute))
}

/// One patient and four doctors, all signing in with `password123`.
/// Skips accounts whose email already exists.
pub async fn seed_demo_data(store: &dyn AppointmentStore) -> anyhow::Result<()> {
    let password_hash = PasswordService::hash_password(DEMO_PASSWORD)
        .map_err(|e| anyhow!("failed to hash demo password: {}", e))?;

    if store.find_user_by_email("alice@example.com").await?.is_none() {
        store
            .create_user(NewUser {
                name: "Alice Johnson".to_string(),
                email: "alice@example.com".to_string(),
                password_hash: password_hash.clone(),
                role: Role::Patient,
            })
            .await
            .context("creating demo patient")?;
    }

    let mut created = 0;
    for demo in &DEMO_DOCTORS {
        if store.find_user_by_email(demo.email).await?.is_some() {
            continue;
        }

        let user = store
            .create_user(NewUser {
                name: demo.name.to_string(),
                email: demo.email.to_string(),
                password_hash: password_hash.clone(),
                role: Role::Doctor,
            })
            .await
            .with_context(|| format!("creating user for {}", demo.name))?;

        store
            .create_doctor(NewDoctor {
                user_id: user.id,
                specialization: demo.specialization.to_string(),
                available_from: time_of_day(demo.from)?,
                available_to: time_of_day(demo.to)?,
                slot_duration: demo.slot_duration,
            })
            .await
            .with_context(|| format!("creating doctor profile for {}", demo.name))?;
        created += 1;
    }

    info!("Seeded demo data: {} new doctors", created);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_database::{DoctorQuery, InMemoryStore};

    #[tokio::test]
    async fn seeding_twice_does_not_duplicate() {
        let store = InMemoryStore::new();

        seed_demo_data(&store).await.unwrap();
        seed_demo_data(&store).await.unwrap();

        let (doctors, total) = store
            .list_doctors(&DoctorQuery {
                page: 1,
                limit: 10,
                specialization: None,
            })
            .await
            .unwrap();
        assert_eq!(total, 4);
        assert_eq!(doctors[3].name, "Dr. Emily Davis");
        assert_eq!(doctors[3].doctor.slot_duration, 25);
        assert!(store.find_user_by_email("alice@example.com").await.unwrap().is_some());
    }
}
