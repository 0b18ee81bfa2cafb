//! Solar geometry for prayer-time calculation.
//!
//! Low-precision approximations (declination and equation of time as
//! functions of the day of year) that are accurate to roughly a minute at
//! temperate latitudes. Angles passed in are degrees; declination is kept in
//! radians internally.

use chrono::{Datelike, NaiveDate};

/// Solar parameters that hold for a whole calendar date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarDay {
    pub day_of_year: u32,
    /// Declination in radians.
    pub declination: f64,
    /// Equation of time in hours.
    pub equation_of_time: f64,
}

impl SolarDay {
    pub fn for_date(date: NaiveDate) -> Self {
        let day_of_year = date.ordinal();
        Self {
            day_of_year,
            declination: declination(day_of_year),
            equation_of_time: equation_of_time(day_of_year),
        }
    }

    /// Solar noon as hours after 00:00 UTC of the date.
    pub fn noon_utc_hours(&self, longitude: f64) -> f64 {
        12.0 - longitude / 15.0 - self.equation_of_time
    }

    /// Hours from solar noon until the sun reaches `altitude` degrees.
    pub fn hour_angle(&self, altitude: f64, latitude: f64) -> Option<f64> {
        hour_angle(altitude, self.declination, latitude)
    }
}

/// δ = asin(0.39795 · cos(0.98563° · (d − 173))), radians.
pub fn declination(day_of_year: u32) -> f64 {
    let days_from_solstice = f64::from(day_of_year) - 173.0;
    (0.39795 * (0.98563 * days_from_solstice).to_radians().cos()).asin()
}

/// Equation of time in hours.
pub fn equation_of_time(day_of_year: u32) -> f64 {
    let b = 2.0 * std::f64::consts::PI * (f64::from(day_of_year) - 81.0) / 365.0;
    (9.87 * (2.0 * b).sin() - 7.53 * b.cos() - 1.5 * b.sin()) / 60.0
}

/// Hours between solar noon and the moment the sun's altitude equals
/// `altitude` degrees (negative below the horizon).
///
/// Returns `None` when the sun never reaches that altitude on the day.
pub fn hour_angle(altitude: f64, declination: f64, latitude: f64) -> Option<f64> {
    let phi = latitude.to_radians();
    let numerator = altitude.to_radians().sin() - declination.sin() * phi.sin();
    let denominator = declination.cos() * phi.cos();
    let ratio = numerator / denominator;

    if !ratio.is_finite() || !(-1.0..=1.0).contains(&ratio) {
        return None;
    }
    Some(ratio.acos().to_degrees() / 15.0)
}

/// Altitude of the sun at Asr, in degrees.
///
/// The shadow of a gnomon reaches `shadow_factor` times its length plus the
/// noon shadow, `tan(|φ − δ|)`.
pub fn asr_altitude(shadow_factor: f64, latitude: f64, declination: f64) -> f64 {
    let noon_shadow = (latitude.to_radians() - declination).abs().tan();
    (1.0 / (shadow_factor + noon_shadow)).atan().to_degrees()
}
