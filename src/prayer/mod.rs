//! Prayer-time model and astronomical calculation.
//!
//! ## Module Structure
//!
//! - [`method`]: calculation methods, their twilight angles, Asr madhab and
//!   the tri-state that records how the method was chosen
//! - [`solar`]: low-level solar geometry (declination, equation of time,
//!   hour angles)
//! - [`calculator`]: turns a location, date, zone and method into a
//!   [`DailyPrayerSet`]
//! - [`timezone`]: zone resolution from configuration, coordinates or the system
//!
//! ## Key Types
//!
//! A [`DailyPrayerSet`] is produced in one piece by [`calculate`] and never
//! patched afterwards. Buffers and enabled flags are applied by building a new
//! set with [`DailyPrayerSet::with_settings`], so anything holding an `Arc` to
//! the old set keeps seeing consistent data.

pub mod calculator;
pub mod method;
pub mod solar;
pub mod timezone;

#[cfg(test)]
mod tests;

use chrono::{DateTime, Duration, NaiveDate, TimeZone};
use chrono_tz::Tz;
use std::fmt;

use crate::common::constants::*;

pub use calculator::{CalculationRequest, calculate};
pub use method::{AsrMadhab, CalculationMethod, IshaRule, MethodParameters, MethodSource};

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoCoordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Latitude within [-90, 90] and longitude within [-180, 180].
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for GeoCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ns = if self.latitude >= 0.0 { 'N' } else { 'S' };
        let ew = if self.longitude >= 0.0 { 'E' } else { 'W' };
        write!(
            f,
            "{:.4}°{ns}, {:.4}°{ew}",
            self.latitude.abs(),
            self.longitude.abs()
        )
    }
}

/// The five daily prayers in their fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrayerKind {
    Fajr,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

impl PrayerKind {
    pub const ALL: [PrayerKind; 5] = [
        PrayerKind::Fajr,
        PrayerKind::Dhuhr,
        PrayerKind::Asr,
        PrayerKind::Maghrib,
        PrayerKind::Isha,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PrayerKind::Fajr => "Fajr",
            PrayerKind::Dhuhr => "Dhuhr",
            PrayerKind::Asr => "Asr",
            PrayerKind::Maghrib => "Maghrib",
            PrayerKind::Isha => "Isha",
        }
    }

    /// Lowercase key used as the prefix of per-prayer config fields.
    pub fn config_key(&self) -> &'static str {
        match self {
            PrayerKind::Fajr => "fajr",
            PrayerKind::Dhuhr => "dhuhr",
            PrayerKind::Asr => "asr",
            PrayerKind::Maghrib => "maghrib",
            PrayerKind::Isha => "isha",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for PrayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// User settings for one prayer's blocking window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrayerSettings {
    pub buffer_before: u32,
    pub buffer_after: u32,
    pub enabled: bool,
}

impl Default for PrayerSettings {
    fn default() -> Self {
        Self {
            buffer_before: DEFAULT_BUFFER_BEFORE,
            buffer_after: DEFAULT_BUFFER_AFTER,
            enabled: DEFAULT_PRAYER_ENABLED,
        }
    }
}

/// Settings for all five prayers, indexed by [`PrayerKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrayerSettingsTable([PrayerSettings; 5]);

impl PrayerSettingsTable {
    pub fn get(&self, kind: PrayerKind) -> PrayerSettings {
        self.0[kind.index()]
    }

    pub fn set(&mut self, kind: PrayerKind, settings: PrayerSettings) {
        self.0[kind.index()] = settings;
    }

    /// Same settings for every prayer.
    pub fn uniform(settings: PrayerSettings) -> Self {
        Self([settings; 5])
    }
}

/// One prayer on one day, with its blocking window.
#[derive(Debug, Clone, PartialEq)]
pub struct PrayerInstant {
    pub kind: PrayerKind,
    pub time: DateTime<Tz>,
    pub buffer_before_minutes: u32,
    pub buffer_after_minutes: u32,
    pub enabled: bool,
}

impl PrayerInstant {
    /// Instant with the default 5/15 minute buffers, enabled.
    pub fn new(kind: PrayerKind, time: DateTime<Tz>) -> Self {
        Self::with_settings(kind, time, PrayerSettings::default())
    }

    pub fn with_settings(kind: PrayerKind, time: DateTime<Tz>, settings: PrayerSettings) -> Self {
        Self {
            kind,
            time,
            buffer_before_minutes: settings.buffer_before,
            buffer_after_minutes: settings.buffer_after,
            enabled: settings.enabled,
        }
    }

    pub fn window_start(&self) -> DateTime<Tz> {
        self.time - Duration::minutes(i64::from(self.buffer_before_minutes))
    }

    pub fn window_end(&self) -> DateTime<Tz> {
        self.time + Duration::minutes(i64::from(self.buffer_after_minutes))
    }

    /// Whether `now` lies in `[window_start, window_end]`, both ends inclusive.
    /// Ignores the enabled flag.
    pub fn window_contains<Z: TimeZone>(&self, now: &DateTime<Z>) -> bool {
        let now = now.with_timezone(&self.time.timezone());
        now >= self.window_start() && now <= self.window_end()
    }

    pub fn total_window_minutes(&self) -> u32 {
        self.buffer_before_minutes + self.buffer_after_minutes
    }
}

/// The five prayers of one calendar date at one location.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyPrayerSet {
    date: NaiveDate,
    timezone: Tz,
    coordinate: GeoCoordinate,
    method: CalculationMethod,
    madhab: AsrMadhab,
    instants: [PrayerInstant; 5],
}

impl DailyPrayerSet {
    /// Assemble a set from already computed instants, in Fajr..Isha order.
    pub fn new(
        date: NaiveDate,
        timezone: Tz,
        coordinate: GeoCoordinate,
        method: CalculationMethod,
        madhab: AsrMadhab,
        instants: [PrayerInstant; 5],
    ) -> Self {
        Self {
            date,
            timezone,
            coordinate,
            method,
            madhab,
            instants,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn coordinate(&self) -> GeoCoordinate {
        self.coordinate
    }

    pub fn method(&self) -> CalculationMethod {
        self.method
    }

    pub fn madhab(&self) -> AsrMadhab {
        self.madhab
    }

    pub fn instants(&self) -> &[PrayerInstant] {
        &self.instants
    }

    pub fn get(&self, kind: PrayerKind) -> &PrayerInstant {
        &self.instants[kind.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &PrayerInstant> {
        self.instants.iter()
    }

    /// A copy of this set with buffers and enabled flags taken from `table`.
    pub fn with_settings(&self, table: &PrayerSettingsTable) -> Self {
        let mut next = self.clone();
        for instant in next.instants.iter_mut() {
            let settings = table.get(instant.kind);
            instant.buffer_before_minutes = settings.buffer_before;
            instant.buffer_after_minutes = settings.buffer_after;
            instant.enabled = settings.enabled;
        }
        next
    }

    /// Whether the instants are strictly increasing from Fajr to Isha.
    pub fn is_ordered(&self) -> bool {
        self.instants.windows(2).all(|pair| pair[0].time < pair[1].time)
    }
}

/// Why a day's prayer times could not be produced.
#[derive(Debug, Clone, PartialEq)]
pub enum CalculationError {
    /// The sun never reaches the altitude a prayer needs on this date
    /// (polar day/night or deep twilight at high latitude).
    InvalidSolarGeometry {
        kind: PrayerKind,
        latitude: f64,
        date: NaiveDate,
    },
    /// Coordinates outside [-90, 90] / [-180, 180].
    InvalidCoordinate { latitude: f64, longitude: f64 },
}

impl fmt::Display for CalculationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalculationError::InvalidSolarGeometry {
                kind,
                latitude,
                date,
            } => write!(
                f,
                "Unable to calculate {kind} for latitude {latitude:.4} on {date}: \
                 the sun does not reach the required angle"
            ),
            CalculationError::InvalidCoordinate {
                latitude,
                longitude,
            } => write!(
                f,
                "Invalid coordinates ({latitude}, {longitude}): latitude must be within \
                 -90..90 and longitude within -180..180"
            ),
        }
    }
}

impl std::error::Error for CalculationError {}
