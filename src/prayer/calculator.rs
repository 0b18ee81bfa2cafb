//! Daily prayer-time calculation.
//!
//! Dhuhr is anchored at solar noon in UTC and converted into the target zone.
//! The other prayers are offsets from Dhuhr given by the hour angle at which
//! the sun reaches each prayer's altitude. All instants are truncated to whole
//! seconds so that repeated calculations compare equal.

use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use super::method::{AsrMadhab, CalculationMethod, IshaRule};
use super::solar::{SolarDay, asr_altitude};
use super::{
    CalculationError, DailyPrayerSet, GeoCoordinate, PrayerInstant, PrayerKind,
    PrayerSettingsTable,
};
use crate::common::utils::truncate_to_second;

/// Everything needed to calculate a day's prayers, minus the date.
///
/// Kept by the scheduler so it can compute tomorrow's Fajr on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculationRequest {
    pub coordinate: GeoCoordinate,
    pub timezone: Tz,
    pub method: CalculationMethod,
    pub madhab: AsrMadhab,
    pub settings: PrayerSettingsTable,
}

impl CalculationRequest {
    /// Calculate `date` and apply this request's per-prayer settings.
    pub fn calculate_for(&self, date: NaiveDate) -> Result<DailyPrayerSet, CalculationError> {
        calculate(
            self.coordinate,
            date,
            self.timezone,
            self.method,
            self.madhab,
        )
        .map(|set| set.with_settings(&self.settings))
    }
}

/// Compute the five prayer times for `date` at `coordinate`, expressed in `tz`.
///
/// Pure: the same inputs always produce the same set. Instants carry the
/// default buffers; apply user settings with [`DailyPrayerSet::with_settings`].
pub fn calculate(
    coordinate: GeoCoordinate,
    date: NaiveDate,
    tz: Tz,
    method: CalculationMethod,
    madhab: AsrMadhab,
) -> Result<DailyPrayerSet, CalculationError> {
    if !coordinate.is_valid() {
        return Err(CalculationError::InvalidCoordinate {
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
        });
    }

    let solar = SolarDay::for_date(date);
    let params = method.parameters();
    let latitude = coordinate.latitude;

    let offset = |kind: PrayerKind, altitude: f64| -> Result<Duration, CalculationError> {
        solar
            .hour_angle(altitude, latitude)
            .map(hours_to_duration)
            .ok_or(CalculationError::InvalidSolarGeometry {
                kind,
                latitude,
                date,
            })
    };

    let dhuhr = dhuhr_time(date, solar.noon_utc_hours(coordinate.longitude), tz);

    let fajr = truncate_to_second(dhuhr - offset(PrayerKind::Fajr, -params.fajr_angle)?);

    let asr_alt = asr_altitude(madhab.shadow_factor(), latitude, solar.declination);
    let asr = truncate_to_second(dhuhr + offset(PrayerKind::Asr, asr_alt)?);

    let maghrib = truncate_to_second(dhuhr + offset(PrayerKind::Maghrib, -params.maghrib_angle)?);

    let isha = match params.isha {
        IshaRule::Interval(minutes) => maghrib + Duration::minutes(i64::from(minutes)),
        IshaRule::Angle(angle) => {
            truncate_to_second(dhuhr + offset(PrayerKind::Isha, -angle)?)
        }
    };

    let instants = [
        PrayerInstant::new(PrayerKind::Fajr, fajr),
        PrayerInstant::new(PrayerKind::Dhuhr, dhuhr),
        PrayerInstant::new(PrayerKind::Asr, asr),
        PrayerInstant::new(PrayerKind::Maghrib, maghrib),
        PrayerInstant::new(PrayerKind::Isha, isha),
    ];

    Ok(DailyPrayerSet::new(
        date, tz, coordinate, method, madhab, instants,
    ))
}

/// Solar noon on `date` in `tz`, kept on the requested local calendar date.
fn dhuhr_time(date: NaiveDate, noon_utc_hours: f64, tz: Tz) -> chrono::DateTime<Tz> {
    let midnight_utc = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
    let noon = (midnight_utc + hours_to_duration(noon_utc_hours)).with_timezone(&tz);

    // Zones far from the longitude can push UTC noon onto a neighbouring day
    let shifted = match noon.date_naive().cmp(&date) {
        std::cmp::Ordering::Greater => noon - Duration::days(1),
        std::cmp::Ordering::Less => noon + Duration::days(1),
        std::cmp::Ordering::Equal => noon,
    };
    truncate_to_second(shifted)
}

fn hours_to_duration(hours: f64) -> Duration {
    Duration::milliseconds((hours * 3_600_000.0).round() as i64)
}
