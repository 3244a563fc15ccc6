// Core algorithm exports
pub mod compatibility;
pub mod discovery;
pub mod distance;
pub mod ports;

pub use compatibility::{
    age_compatible, gender_compatible, match_intention_compatible, music_compatible,
    CompatibilityEvaluator,
};
pub use discovery::{DiscoveryError, DiscoveryOutcome, DiscoveryPipeline};
pub use distance::{haversine, haversine_miles};
pub use ports::{LocationError, LocationProvider, ProfileStore, StoreError};
