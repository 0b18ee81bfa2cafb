//! Qibla direction: the initial great-circle bearing towards the Kaaba.

use std::fmt;

use crate::common::constants::{KAABA_LATITUDE, KAABA_LONGITUDE};
use crate::prayer::GeoCoordinate;

const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QiblaDirection {
    /// Degrees clockwise from true north, in [0, 360).
    pub bearing: f64,
    /// Great-circle distance to the Kaaba in kilometres.
    pub distance_km: f64,
}

impl QiblaDirection {
    pub fn from_coordinate(from: GeoCoordinate) -> Self {
        Self {
            bearing: bearing(from),
            distance_km: distance_km(from),
        }
    }

    pub fn compass_point(&self) -> &'static str {
        compass_point(self.bearing)
    }

    /// Angle to turn from a device heading to face the Qibla, in [0, 360).
    pub fn relative_to_heading(&self, heading: f64) -> f64 {
        normalize(self.bearing - heading)
    }
}

impl fmt::Display for QiblaDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}° {}", self.bearing, self.compass_point())
    }
}

fn kaaba() -> GeoCoordinate {
    GeoCoordinate::new(KAABA_LATITUDE, KAABA_LONGITUDE)
}

pub fn bearing(from: GeoCoordinate) -> f64 {
    let to = kaaba();
    let phi1 = from.latitude.to_radians();
    let phi2 = to.latitude.to_radians();
    let delta_lambda = (to.longitude - from.longitude).to_radians();

    let y = delta_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();
    normalize(y.atan2(x).to_degrees())
}

/// Haversine distance.
pub fn distance_km(from: GeoCoordinate) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;
    let to = kaaba();
    let phi1 = from.latitude.to_radians();
    let phi2 = to.latitude.to_radians();
    let d_phi = phi2 - phi1;
    let d_lambda = (to.longitude - from.longitude).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

pub fn compass_point(bearing: f64) -> &'static str {
    let index = ((normalize(bearing) + 11.25) / 22.5) as usize % 16;
    COMPASS_POINTS[index]
}

fn normalize(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}
