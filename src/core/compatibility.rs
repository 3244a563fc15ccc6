use std::sync::Arc;

use crate::core::ports::{LocationError, LocationProvider};
use crate::models::{CompatibilitySignals, Coordinates, LocationFallback, MatchingOptions, UserProfile};

/// Gender preference value that accepts any gender
pub const ANY_GENDER: &str = "both";

/// Treat empty strings the same as absent values
#[inline]
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Both users must be open to the other's gender
pub fn gender_compatible(a: &UserProfile, b: &UserProfile) -> bool {
    let (Some(a_gender), Some(a_pref), Some(b_gender), Some(b_pref)) = (
        present(&a.gender),
        present(&a.gender_preference),
        present(&b.gender),
        present(&b.gender_preference),
    ) else {
        return false;
    };

    let a_accepts_b = a_pref == ANY_GENDER || a_pref == b_gender;
    let b_accepts_a = b_pref == ANY_GENDER || b_pref == a_gender;

    a_accepts_b && b_accepts_a
}

/// Each user's age falls inside the other's preferred range
pub fn age_compatible(a: &UserProfile, b: &UserProfile) -> bool {
    let (Some(a_age), Some(a_pref), Some(b_age), Some(b_pref)) =
        (a.age, a.age_preference, b.age, b.age_preference)
    else {
        return false;
    };

    a_pref.contains(b_age) && b_pref.contains(a_age)
}

/// The users share at least one genre
pub fn music_compatible(a: &UserProfile, b: &UserProfile) -> bool {
    let (Some(a_genres), Some(b_genres)) = (&a.music_preference, &b.music_preference) else {
        return false;
    };

    a_genres.iter().any(|genre| b_genres.contains(genre))
}

/// Both users are looking for exactly the same kind of connection
pub fn match_intention_compatible(a: &UserProfile, b: &UserProfile) -> bool {
    match (present(&a.match_intention), present(&b.match_intention)) {
        (Some(a_intention), Some(b_intention)) => a_intention == b_intention,
        _ => false,
    }
}

/// Evaluates a pair of profiles across all compatibility dimensions
///
/// Everything except proximity is a pure function of the two profiles.
/// Proximity may have to ask the location provider for coordinates; any
/// failure there only makes proximity false.
#[derive(Clone)]
pub struct CompatibilityEvaluator {
    location: Arc<dyn LocationProvider>,
    options: MatchingOptions,
}

impl CompatibilityEvaluator {
    pub fn new(location: Arc<dyn LocationProvider>, options: MatchingOptions) -> Self {
        Self { location, options }
    }

    pub fn options(&self) -> &MatchingOptions {
        &self.options
    }

    /// Resolve where a profile is for proximity purposes
    async fn resolve_coordinates(&self, profile: &UserProfile) -> Option<Coordinates> {
        if let Some(coordinates) = profile.stored_coordinates() {
            return Some(coordinates);
        }

        if self.options.location_fallback == LocationFallback::StoredOnly {
            return None;
        }

        let lookup = tokio::time::timeout(
            self.options.location_timeout,
            self.location.current_coordinates(),
        )
        .await
        .unwrap_or(Err(LocationError::TimedOut));

        match lookup {
            Ok(coordinates) => Some(coordinates),
            Err(e) => {
                tracing::debug!("Could not resolve location for profile {}: {}", profile.id, e);
                None
            }
        }
    }

    /// Both users are within the configured distance of each other
    pub async fn location_similar(&self, a: &UserProfile, b: &UserProfile) -> bool {
        if present(&a.location).is_none() || present(&b.location).is_none() {
            return false;
        }

        let (a_coords, b_coords) =
            tokio::join!(self.resolve_coordinates(a), self.resolve_coordinates(b));

        match (a_coords, b_coords) {
            (Some(a_coords), Some(b_coords)) => {
                a_coords.distance_miles(&b_coords) <= self.options.max_distance_miles
            }
            _ => false,
        }
    }

    /// Compute every compatibility signal for the pair
    pub async fn evaluate(&self, a: &UserProfile, b: &UserProfile) -> CompatibilitySignals {
        CompatibilitySignals {
            gender: gender_compatible(a, b),
            age: age_compatible(a, b),
            music: music_compatible(a, b),
            match_intention: match_intention_compatible(a, b),
            location: self.location_similar(a, b).await,
        }
    }

    pub async fn is_match(&self, a: &UserProfile, b: &UserProfile) -> bool {
        self.evaluate(a, b).await.is_match()
    }
}

impl std::fmt::Debug for CompatibilityEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompatibilityEvaluator")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
