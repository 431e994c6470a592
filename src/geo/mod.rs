use crate::models::driver::GeoPoint;

const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Great-circle distance in kilometres.
pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let (lat_a, lat_b) = (a.lat.to_radians(), b.lat.to_radians());
    let half_dlat = ((b.lat - a.lat).to_radians() / 2.0).sin();
    let half_dlng = ((b.lng - a.lng).to_radians() / 2.0).sin();

    let h = half_dlat.powi(2) + lat_a.cos() * lat_b.cos() * half_dlng.powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Rounds to 100 m for display.
pub fn round_km(km: f64) -> f64 {
    (km * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::{haversine_km, round_km};
    use crate::models::driver::GeoPoint;

    #[test]
    fn same_point_is_zero() {
        let depot = GeoPoint {
            lat: -6.1754,
            lng: 106.8272,
        };
        assert!(haversine_km(&depot, &depot) < 1e-9);
    }

    #[test]
    fn jakarta_to_bandung_is_roughly_120_km() {
        let jakarta = GeoPoint {
            lat: -6.2088,
            lng: 106.8456,
        };
        let bandung = GeoPoint {
            lat: -6.9175,
            lng: 107.6191,
        };
        let distance = haversine_km(&jakarta, &bandung);
        assert!((distance - 116.0).abs() < 10.0, "{distance}");
        assert!((haversine_km(&bandung, &jakarta) - distance).abs() < 1e-9);
    }

    #[test]
    fn rounds_to_one_decimal() {
        assert_eq!(round_km(12.345), 12.3);
        assert_eq!(round_km(0.06), 0.1);
    }
}
