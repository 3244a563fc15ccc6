use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// User profile as stored in the profile store
///
/// Every field a compatibility check reads is optional. A missing field makes
/// the corresponding check fail rather than pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(alias = "userId", alias = "uid")]
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub gender_preference: Option<String>,
    #[serde(default)]
    pub match_intention: Option<String>,
    #[serde(default)]
    pub age_preference: Option<AgePreference>,
    #[serde(default)]
    pub music_preference: Option<Vec<String>>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Prior swipe decisions, keyed by the other profile's id
    #[serde(default, deserialize_with = "null_as_empty")]
    pub matches: HashMap<String, Decision>,
}

/// Treat an explicit `null` like a missing field
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl UserProfile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Coordinates saved on the profile, if both halves are present
    pub fn stored_coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates { latitude, longitude }),
            _ => None,
        }
    }

    /// Ids of every profile this user already liked or disliked
    pub fn decided_ids(&self) -> HashSet<&str> {
        self.matches.keys().map(String::as_str).collect()
    }

    pub fn has_decided(&self, other_id: &str) -> bool {
        self.matches.contains_key(other_id)
    }
}

/// Inclusive age range a user is interested in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgePreference {
    pub min: u32,
    pub max: u32,
}

impl AgePreference {
    #[inline]
    pub fn contains(&self, age: u32) -> bool {
        age >= self.min && age <= self.max
    }
}

/// Outcome of a previous swipe
///
/// Serialized lowercase; parsed case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Liked,
    Disliked,
}

impl<'de> Deserialize<'de> for Decision {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

impl std::str::FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "liked" => Ok(Decision::Liked),
            "disliked" => Ok(Decision::Disliked),
            other => Err(format!("unknown decision: {}", other)),
        }
    }
}

/// A latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Great-circle distance to `other` in miles
    pub fn distance_miles(&self, other: &Coordinates) -> f64 {
        crate::core::distance::haversine_miles(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }
}

/// Per-dimension compatibility results for a pair of profiles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilitySignals {
    pub gender: bool,
    pub age: bool,
    pub music: bool,
    pub match_intention: bool,
    pub location: bool,
}

impl CompatibilitySignals {
    /// Final match decision.
    ///
    /// Age and music are computed and reported but do not take part in the
    /// decision: a pair matches when gender, intention or proximity agrees.
    // FIXME: confirm with product whether age and music should be required
    // (AND of all five) before tightening this.
    #[inline]
    pub fn is_match(&self) -> bool {
        self.gender || self.match_intention || self.location
    }
}

/// How a profile without stored coordinates is located
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationFallback {
    /// Ask the location provider for the current device position
    #[default]
    Device,
    /// Only stored coordinates count; anything else is "not nearby"
    StoredOnly,
}

/// Tunables for compatibility evaluation and candidate discovery
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchingOptions {
    pub max_distance_miles: f64,
    pub location_timeout: Duration,
    pub location_fallback: LocationFallback,
    pub max_concurrent_evaluations: usize,
}

impl Default for MatchingOptions {
    fn default() -> Self {
        Self {
            max_distance_miles: 50.0,
            location_timeout: Duration::from_millis(2000),
            location_fallback: LocationFallback::Device,
            max_concurrent_evaluations: 16,
        }
    }
}
