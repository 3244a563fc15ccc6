/// Earth's radius in miles, as used for match proximity
pub const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Great-circle distance between two points on a sphere of the given radius
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
/// * `radius` - Sphere radius; the result is in the same unit
#[inline]
pub fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64, radius: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    radius * c
}

/// Haversine distance in miles
#[inline]
pub fn haversine_miles(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    haversine(lat1, lon1, lat2, lon2, EARTH_RADIUS_MILES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_points() {
        let distance = haversine_miles(34.0522, -118.2437, 34.0522, -118.2437);
        assert_eq!(distance, 0.0);
    }

    #[test]
    fn test_los_angeles_to_san_diego() {
        // Roughly 111 miles as the crow flies
        let distance = haversine_miles(34.0522, -118.2437, 32.7157, -117.1611);
        assert!((distance - 111.0).abs() < 3.0, "Distance should be ~111mi, got {}", distance);
    }

    #[test]
    fn test_radius_scales_result() {
        let unit = haversine(51.5074, -0.1278, 48.8566, 2.3522, 1.0);
        let miles = haversine_miles(51.5074, -0.1278, 48.8566, 2.3522);
        assert!((unit * EARTH_RADIUS_MILES - miles).abs() < 1e-9);
    }

    #[test]
    fn test_symmetric() {
        let there = haversine_miles(40.7128, -74.0060, 34.0522, -118.2437);
        let back = haversine_miles(34.0522, -118.2437, 40.7128, -74.0060);
        assert!((there - back).abs() < 1e-9);
    }
}
