use crate::models::GeoPoint;

/// Earth's radius in miles
pub const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Calculate the Haversine distance between two points in miles
///
/// No special handling of poles or antipodal points; results are accurate
/// enough for the urban distances patients travel.
#[inline]
pub fn distance_miles(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1_rad = a.latitude.to_radians();
    let lat2_rad = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_MILES * c
}

/// Round a distance to one decimal place, as shown to patients
#[inline]
pub fn round_to_tenth(miles: f64) -> f64 {
    (miles * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_miles() {
        // London to Paris is roughly 214 miles
        let london = GeoPoint::new(51.5074, -0.1278);
        let paris = GeoPoint::new(48.8566, 2.3522);

        let distance = distance_miles(london, paris);
        assert!((distance - 214.0).abs() < 5.0, "Distance should be ~214mi, got {}", distance);
    }

    #[test]
    fn test_same_point_is_zero() {
        let sf = GeoPoint::new(37.7749, -122.4194);
        assert_eq!(distance_miles(sf, sf), 0.0);
    }

    #[test]
    fn test_round_to_tenth() {
        assert_eq!(round_to_tenth(0.6489), 0.6);
        assert_eq!(round_to_tenth(3.66), 3.7);
        assert_eq!(round_to_tenth(0.0), 0.0);
    }
}
