//! Great-circle helpers for marker placement.

use rand::Rng;

use crate::types::Coordinate;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates in kilometres.
#[must_use]
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let (lat1, lon1) = (a.latitude().to_radians(), a.longitude().to_radians());
    let (lat2, lon2) = (b.latitude().to_radians(), b.longitude().to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.clamp(0.0, 1.0).sqrt().asin()
}

/// Picks a random point uniformly over the disc of `radius_km` around
/// `center`. The returned point is always within `radius_km` of `center`
/// (great-circle distance).
pub fn jitter_around<R: Rng + ?Sized>(center: Coordinate, radius_km: f64, rng: &mut R) -> Coordinate {
    if radius_km <= 0.0 {
        return center;
    }
    // sqrt keeps the density uniform over the area rather than the radius.
    let distance = radius_km * rng.random::<f64>().sqrt();
    let bearing = rng.random::<f64>() * std::f64::consts::TAU;
    destination(center, distance, bearing)
}

/// Point reached by travelling `distance_km` from `origin` along `bearing`
/// (radians, clockwise from north).
fn destination(origin: Coordinate, distance_km: f64, bearing: f64) -> Coordinate {
    let delta = distance_km / EARTH_RADIUS_KM;
    let lat1 = origin.latitude().to_radians();
    let lon1 = origin.longitude().to_radians();

    let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * bearing.cos())
        .clamp(-1.0, 1.0)
        .asin();
    let lon2 = lon1
        + (bearing.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());

    let latitude = lat2.to_degrees().clamp(-90.0, 90.0);
    let longitude = normalize_longitude(lon2.to_degrees());
    Coordinate::new(latitude, longitude).unwrap_or(origin)
}

fn normalize_longitude(degrees: f64) -> f64 {
    let wrapped = (degrees + 540.0).rem_euclid(360.0) - 180.0;
    wrapped.clamp(-180.0, 180.0)
}
