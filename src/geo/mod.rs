pub mod polyline;

use crate::models::location::GeoPoint;

const EARTH_RADIUS_KM: f64 = 6_371.0;

pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}

/// Straight-line distance in degree space. Only meaningful for short hops
/// along a route, where it keeps the simulated step uniform.
pub fn planar_distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
    (b.lat - a.lat).hypot(b.lng - a.lng)
}

pub fn interpolate(a: &GeoPoint, b: &GeoPoint, fraction: f64) -> GeoPoint {
    GeoPoint {
        lat: a.lat + (b.lat - a.lat) * fraction,
        lng: a.lng + (b.lng - a.lng) * fraction,
    }
}

#[cfg(test)]
mod tests {
    use super::{haversine_km, interpolate, planar_distance};
    use crate::models::location::GeoPoint;

    #[test]
    fn zero_distance_for_same_point() {
        let p = GeoPoint {
            lat: 46.770439,
            lng: 23.591423,
        };
        let distance = haversine_km(&p, &p);
        assert!(distance < 1e-9);
    }

    #[test]
    fn london_to_paris_is_around_343_km() {
        let london = GeoPoint {
            lat: 51.5074,
            lng: -0.1278,
        };
        let paris = GeoPoint {
            lat: 48.8566,
            lng: 2.3522,
        };
        let distance = haversine_km(&london, &paris);
        assert!((distance - 343.0).abs() < 5.0);
    }

    #[test]
    fn planar_distance_is_euclidean_in_degrees() {
        let a = GeoPoint { lat: 0.0, lng: 0.0 };
        let b = GeoPoint { lat: 3.0, lng: 4.0 };
        assert!((planar_distance(&a, &b) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn interpolation_hits_both_endpoints() {
        let a = GeoPoint {
            lat: 46.770439,
            lng: 23.591423,
        };
        let b = GeoPoint {
            lat: 46.7743731,
            lng: 23.6120002,
        };

        assert_eq!(interpolate(&a, &b, 0.0), a);

        let near_end = interpolate(&a, &b, 0.999_999);
        assert!(planar_distance(&near_end, &b) < 1e-7);

        let mid = interpolate(&a, &b, 0.5);
        assert!((mid.lat - (a.lat + b.lat) / 2.0).abs() < 1e-12);
    }
}
