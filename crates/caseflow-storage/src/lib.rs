// Record store for the Caseflow workflow engine
//
// Two interchangeable backends behind the StorageBackend enum:
// - Database: Postgres via sqlx (production)
// - InMemoryDatabase: HashMaps behind parking_lot locks (dev mode, tests)

pub mod backend;
pub mod memory;
pub mod models;
pub mod repositories;

pub use backend::StorageBackend;
pub use memory::InMemoryDatabase;
pub use models::*;
pub use repositories::Database;
