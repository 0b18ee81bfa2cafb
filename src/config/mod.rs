//! Configuration management for salahshield.
//!
//! The configuration lives in a single flat TOML file,
//! `$XDG_CONFIG_HOME/salahshield/salahshield.toml` unless `--config <dir>`
//! points elsewhere. Every field is optional in the file; [`loading`] fills in
//! defaults after [`validation`] has checked what the user wrote.
//!
//! ## Module Structure
//!
//! - [`builder`]: default file generation and line-preserving edits
//! - [`loading`]: path resolution, parsing, defaults
//! - [`validation`]: range and consistency checks with actionable messages
//! - [`watcher`]: hot reload through file system notifications
//!
//! ## Example
//!
//! ```toml
//! #[Location]
//! latitude = 45.421500             # Degrees north (-90 to 90)
//! longitude = -75.697200           # Degrees east (-180 to 180)
//!
//! #[Calculation]
//! method = "isna"                  # mwl, isna, egyptian, umm_al_qura, karachi, tehran, jafari
//! asr_madhab = "shafi"             # shafi or hanafi
//!
//! #[Prayer windows]
//! maghrib_buffer_after = 20        # Minutes to keep blocking after Maghrib (0-60)
//! ```

use anyhow::Result;
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::common::constants::*;
use crate::prayer::timezone::{TimezoneSource, resolve_timezone};
use crate::prayer::{
    AsrMadhab, CalculationMethod, CalculationRequest, GeoCoordinate, MethodSource, PrayerKind,
    PrayerSettings, PrayerSettingsTable,
};
use crate::shield::{AppCategory, Blocklist};

pub mod builder;
pub mod loading;
pub mod validation;
pub mod watcher;

pub use builder::{create_default_config, update_config_value, update_coordinates};
pub use loading::{get_config_path, get_custom_config_dir, set_config_dir};
pub use watcher::start_config_watcher;


/// Which shield implementation to drive.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShieldBackend {
    /// Only log what would be blocked.
    #[default]
    Log,
    /// Run `start_command` / `stop_command`.
    Command,
}

impl ShieldBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShieldBackend::Log => "log",
            ShieldBackend::Command => "command",
        }
    }
}

/// Raw configuration as read from disk.
///
/// Accessors such as [`Config::calculation_method`] turn the stored strings
/// into typed values; they can only fail on a config that skipped
/// validation.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub city: Option<String>,      // display name only
    pub timezone: Option<String>,  // IANA name, derived from coordinates when unset

    pub method: Option<String>,
    pub method_source: Option<String>, // "unset", "auto" or "user"
    pub asr_madhab: Option<String>,

    pub paused: Option<bool>,
    pub check_interval: Option<u64>,    // seconds between blocking checks
    pub rollover_interval: Option<u64>, // seconds between date checks

    pub shield: Option<ShieldBackend>,
    pub start_command: Option<String>,
    pub stop_command: Option<String>,

    pub fajr_buffer_before: Option<u32>,
    pub fajr_buffer_after: Option<u32>,
    pub fajr_enabled: Option<bool>,
    pub dhuhr_buffer_before: Option<u32>,
    pub dhuhr_buffer_after: Option<u32>,
    pub dhuhr_enabled: Option<bool>,
    pub asr_buffer_before: Option<u32>,
    pub asr_buffer_after: Option<u32>,
    pub asr_enabled: Option<bool>,
    pub maghrib_buffer_before: Option<u32>,
    pub maghrib_buffer_after: Option<u32>,
    pub maghrib_enabled: Option<bool>,
    pub isha_buffer_before: Option<u32>,
    pub isha_buffer_after: Option<u32>,
    pub isha_enabled: Option<bool>,

    pub blocked_apps: Option<Vec<String>>,
    pub blocked_websites: Option<Vec<String>>,
    pub blocked_categories: Option<Vec<String>>,
}

impl Config {
    pub fn load() -> Result<Self> {
        loading::load()
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        loading::load_from_path(path)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        loading::get_config_path()
    }

    /// Both coordinates, or `None` when the location has not been set up.
    pub fn coordinate(&self) -> Option<GeoCoordinate> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(GeoCoordinate::new(lat, lon)),
            _ => None,
        }
    }

    pub fn calculation_method(&self) -> Result<CalculationMethod> {
        self.method.as_deref().unwrap_or(DEFAULT_METHOD).parse()
    }

    pub fn method_source(&self) -> Result<MethodSource> {
        self.method_source
            .as_deref()
            .unwrap_or(DEFAULT_METHOD_SOURCE)
            .parse()
    }

    pub fn asr_madhab(&self) -> Result<AsrMadhab> {
        self.asr_madhab
            .as_deref()
            .unwrap_or(DEFAULT_ASR_MADHAB)
            .parse()
    }

    pub fn is_paused(&self) -> bool {
        self.paused.unwrap_or(DEFAULT_PAUSED)
    }

    pub fn check_interval(&self) -> u64 {
        self.check_interval.unwrap_or(DEFAULT_CHECK_INTERVAL)
    }

    pub fn rollover_interval(&self) -> u64 {
        self.rollover_interval.unwrap_or(DEFAULT_ROLLOVER_INTERVAL)
    }

    /// Raw (before, after, enabled) fields for one prayer.
    pub fn prayer_fields(&self, kind: PrayerKind) -> (Option<u32>, Option<u32>, Option<bool>) {
        match kind {
            PrayerKind::Fajr => (
                self.fajr_buffer_before,
                self.fajr_buffer_after,
                self.fajr_enabled,
            ),
            PrayerKind::Dhuhr => (
                self.dhuhr_buffer_before,
                self.dhuhr_buffer_after,
                self.dhuhr_enabled,
            ),
            PrayerKind::Asr => (
                self.asr_buffer_before,
                self.asr_buffer_after,
                self.asr_enabled,
            ),
            PrayerKind::Maghrib => (
                self.maghrib_buffer_before,
                self.maghrib_buffer_after,
                self.maghrib_enabled,
            ),
            PrayerKind::Isha => (
                self.isha_buffer_before,
                self.isha_buffer_after,
                self.isha_enabled,
            ),
        }
    }

    pub fn prayer_settings(&self) -> PrayerSettingsTable {
        let mut table = PrayerSettingsTable::default();
        for kind in PrayerKind::ALL {
            let (before, after, enabled) = self.prayer_fields(kind);
            table.set(
                kind,
                PrayerSettings {
                    buffer_before: before.unwrap_or(DEFAULT_BUFFER_BEFORE),
                    buffer_after: after.unwrap_or(DEFAULT_BUFFER_AFTER),
                    enabled: enabled.unwrap_or(DEFAULT_PRAYER_ENABLED),
                },
            );
        }
        table
    }

    pub fn blocklist(&self) -> Result<Blocklist> {
        let categories = self
            .blocked_categories
            .iter()
            .flatten()
            .map(|name| name.parse::<AppCategory>())
            .collect::<Result<Vec<_>>>()?;
        Ok(Blocklist {
            apps: self.blocked_apps.clone().unwrap_or_default(),
            websites: self.blocked_websites.clone().unwrap_or_default(),
            categories,
        })
    }

    pub fn resolve_timezone(&self) -> Result<(Tz, TimezoneSource)> {
        resolve_timezone(self.timezone.as_deref(), self.coordinate())
    }

    /// Everything the calculator needs, or `None` without a location.
    pub fn calculation_request(&self) -> Result<Option<CalculationRequest>> {
        let Some(coordinate) = self.coordinate() else {
            return Ok(None);
        };
        let (timezone, _) = self.resolve_timezone()?;
        Ok(Some(CalculationRequest {
            coordinate,
            timezone,
            method: self.calculation_method()?,
            madhab: self.asr_madhab()?,
            settings: self.prayer_settings(),
        }))
    }

    /// Log the effective configuration.
    pub fn log_config(&self) {
        if let Ok(path) = Self::get_config_path() {
            log_block_start!(
                "Loaded configuration from {}",
                crate::common::utils::private_path(&path)
            );
        } else {
            log_block_start!("Loaded configuration");
        }

        match self.coordinate() {
            Some(coord) => {
                match &self.city {
                    Some(city) => log_indented!("Location: {city} ({coord})"),
                    None => log_indented!("Location: {coord}"),
                }
                if let Ok((tz, source)) = self.resolve_timezone() {
                    log_indented!("Time zone: {tz} ({})", source.describe());
                }
            }
            None => log_indented!("Location: not set"),
        }

        if let (Ok(method), Ok(source)) = (self.calculation_method(), self.method_source()) {
            log_indented!("Method: {} ({source})", method.full_name());
        }
        if let Ok(madhab) = self.asr_madhab() {
            log_indented!("Asr: {madhab}");
        }

        let settings = self.prayer_settings();
        for kind in PrayerKind::ALL {
            let s = settings.get(kind);
            if s.enabled {
                log_indented!(
                    "{:<8} -{}m / +{}m",
                    kind.name(),
                    s.buffer_before,
                    s.buffer_after
                );
            } else {
                log_indented!("{:<8} disabled", kind.name());
            }
        }

        log_indented!(
            "Shield: {}{}",
            self.shield.unwrap_or_default().as_str(),
            if self.is_paused() { " (paused)" } else { "" }
        );
    }
}
