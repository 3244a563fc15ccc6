// Service exports
pub mod cache;
pub mod firestore;
pub mod location;
pub mod memory;
pub mod postgres;

pub use cache::{CacheError, CacheKey, CacheManager, CacheStats, CachedProfileStore};
pub use firestore::FirestoreProfileStore;
pub use location::{FixedLocationProvider, RequestLocationProvider, UnavailableLocationProvider};
pub use memory::InMemoryProfileStore;
pub use postgres::{DecisionKind, PostgresError, PostgresProfileStore};
