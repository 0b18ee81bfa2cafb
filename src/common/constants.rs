//! Application-wide defaults, limits and fixed values.

// # Prayer window defaults

pub const DEFAULT_BUFFER_BEFORE: u32 = 5; // minutes
pub const DEFAULT_BUFFER_AFTER: u32 = 15; // minutes
pub const DEFAULT_PRAYER_ENABLED: bool = true;

pub const MINIMUM_BUFFER_BEFORE: u32 = 0;
pub const MAXIMUM_BUFFER_BEFORE: u32 = 30;
pub const MINIMUM_BUFFER_AFTER: u32 = 0;
pub const MAXIMUM_BUFFER_AFTER: u32 = 60;

// # Calculation defaults

pub const DEFAULT_METHOD: &str = "mwl";
pub const DEFAULT_METHOD_SOURCE: &str = "unset";
pub const DEFAULT_ASR_MADHAB: &str = "shafi";

/// Minutes between Maghrib and Isha for interval-based methods.
pub const UMM_AL_QURA_ISHA_INTERVAL: u32 = 90;

/// Standard sunset depression covering refraction and the solar radius.
pub const STANDARD_MAGHRIB_ANGLE: f64 = 0.83;

// # Scheduler polling

pub const DEFAULT_CHECK_INTERVAL: u64 = 30; // seconds, blocking decisions
pub const DEFAULT_ROLLOVER_INTERVAL: u64 = 60; // seconds, day change detection

pub const MINIMUM_CHECK_INTERVAL: u64 = 5;
pub const MAXIMUM_CHECK_INTERVAL: u64 = 300;
pub const MINIMUM_ROLLOVER_INTERVAL: u64 = 10;
pub const MAXIMUM_ROLLOVER_INTERVAL: u64 = 600;

// # Shield

pub const DEFAULT_SHIELD: &str = "log";
pub const DEFAULT_PAUSED: bool = false;

pub const ENV_BLOCKED_APPS: &str = "SALAHSHIELD_BLOCKED_APPS";
pub const ENV_BLOCKED_WEBSITES: &str = "SALAHSHIELD_BLOCKED_WEBSITES";
pub const ENV_BLOCKED_CATEGORIES: &str = "SALAHSHIELD_BLOCKED_CATEGORIES";
pub const ENV_PRAYER: &str = "SALAHSHIELD_PRAYER";

// # Qibla

pub const KAABA_LATITUDE: f64 = 21.4225;
pub const KAABA_LONGITUDE: f64 = 39.8262;

// # Files

pub const CONFIG_DIR_NAME: &str = "salahshield";
pub const CONFIG_FILE_NAME: &str = "salahshield.toml";
pub const LOCK_FILE_NAME: &str = "salahshield.lock";

/// Debounce for config file change events (editors write in several steps).
pub const CONFIG_WATCH_DEBOUNCE_MS: u64 = 500;

// # Exit codes

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

#[cfg(test)]
pub mod test_constants {
    // Ottawa, used across scenario tests
    pub const OTTAWA_LAT: f64 = 45.4215;
    pub const OTTAWA_LON: f64 = -75.6972;

    pub const MAKKAH_LAT: f64 = 21.3891;
    pub const MAKKAH_LON: f64 = 39.8579;

    pub const LONDON_LAT: f64 = 51.5074;
    pub const LONDON_LON: f64 = -0.1278;
}
