use std::sync::Arc;

use shared_config::AppConfig;

use crate::memory::InMemoryStore;
use crate::store::AppointmentStore;
use crate::supabase::SupabaseStore;

/// Router state shared by every cell: configuration plus the store handle.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn AppointmentStore>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, store: Arc<dyn AppointmentStore>) -> Self {
        Self { config, store }
    }

    /// Picks the PostgREST backend when Supabase is configured, otherwise an empty in-memory store.
    pub fn from_config(config: Arc<AppConfig>) -> Self {
        let store: Arc<dyn AppointmentStore> = if config.is_database_configured() {
            Arc::new(SupabaseStore::new(&config))
        } else {
            Arc::new(InMemoryStore::new())
        };
        Self { config, store }
    }
}
