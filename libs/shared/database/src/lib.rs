pub mod memory;
pub mod records;
pub mod state;
pub mod store;
pub mod supabase;

pub use memory::InMemoryStore;
pub use records::*;
pub use state::AppState;
pub use store::{AppointmentStore, StoreError, StoreResult};
pub use supabase::{SupabaseClient, SupabaseStore};
