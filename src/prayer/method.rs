//! Calculation methods and related enumerations.
//!
//! Each method fixes the sun depression angles used for Fajr and Isha. Umm
//! al-Qura replaces the Isha angle with a fixed interval after Maghrib.

use anyhow::{Result, bail};
use std::fmt;
use std::str::FromStr;

use crate::common::constants::{STANDARD_MAGHRIB_ANGLE, UMM_AL_QURA_ISHA_INTERVAL};

/// How Isha is derived for a method.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IshaRule {
    /// Sun depression below the horizon, in degrees.
    Angle(f64),
    /// Fixed minutes after Maghrib.
    Interval(u32),
}

/// Angles that drive the calculation for one method.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MethodParameters {
    pub fajr_angle: f64,
    pub isha: IshaRule,
    pub maghrib_angle: f64,
}

/// A named convention of twilight angles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalculationMethod {
    MuslimWorldLeague,
    Isna,
    Egyptian,
    UmmAlQura,
    Karachi,
    Tehran,
    Jafari,
}

impl CalculationMethod {
    pub const ALL: [CalculationMethod; 7] = [
        CalculationMethod::MuslimWorldLeague,
        CalculationMethod::Isna,
        CalculationMethod::Egyptian,
        CalculationMethod::UmmAlQura,
        CalculationMethod::Karachi,
        CalculationMethod::Tehran,
        CalculationMethod::Jafari,
    ];

    pub fn parameters(&self) -> MethodParameters {
        let (fajr_angle, isha, maghrib_angle) = match self {
            CalculationMethod::MuslimWorldLeague => {
                (18.0, IshaRule::Angle(17.0), STANDARD_MAGHRIB_ANGLE)
            }
            CalculationMethod::Isna => (15.0, IshaRule::Angle(15.0), STANDARD_MAGHRIB_ANGLE),
            CalculationMethod::Egyptian => (19.5, IshaRule::Angle(17.5), STANDARD_MAGHRIB_ANGLE),
            CalculationMethod::UmmAlQura => (
                18.5,
                IshaRule::Interval(UMM_AL_QURA_ISHA_INTERVAL),
                STANDARD_MAGHRIB_ANGLE,
            ),
            CalculationMethod::Karachi => (18.0, IshaRule::Angle(18.0), STANDARD_MAGHRIB_ANGLE),
            CalculationMethod::Tehran => (17.7, IshaRule::Angle(14.0), 4.5),
            CalculationMethod::Jafari => (16.0, IshaRule::Angle(14.0), 4.0),
        };
        MethodParameters {
            fajr_angle,
            isha,
            maghrib_angle,
        }
    }

    /// Identifier used in the config file and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            CalculationMethod::MuslimWorldLeague => "mwl",
            CalculationMethod::Isna => "isna",
            CalculationMethod::Egyptian => "egyptian",
            CalculationMethod::UmmAlQura => "umm_al_qura",
            CalculationMethod::Karachi => "karachi",
            CalculationMethod::Tehran => "tehran",
            CalculationMethod::Jafari => "jafari",
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            CalculationMethod::MuslimWorldLeague => "MWL",
            CalculationMethod::Isna => "ISNA",
            CalculationMethod::Egyptian => "Egypt",
            CalculationMethod::UmmAlQura => "Makkah",
            CalculationMethod::Karachi => "Karachi",
            CalculationMethod::Tehran => "Tehran",
            CalculationMethod::Jafari => "Jafari",
        }
    }

    pub fn full_name(&self) -> &'static str {
        match self {
            CalculationMethod::MuslimWorldLeague => "Muslim World League",
            CalculationMethod::Isna => "Islamic Society of North America",
            CalculationMethod::Egyptian => "Egyptian General Authority",
            CalculationMethod::UmmAlQura => "Umm Al-Qura University",
            CalculationMethod::Karachi => "University of Karachi",
            CalculationMethod::Tehran => "Institute of Geophysics, Tehran",
            CalculationMethod::Jafari => "Shia Ithna-Ashari (Jafari)",
        }
    }

    /// Where the method is customarily used.
    pub fn region(&self) -> &'static str {
        match self {
            CalculationMethod::MuslimWorldLeague => "Europe, Far East, parts of America",
            CalculationMethod::Isna => "North America",
            CalculationMethod::Egyptian => "Africa, Syria, Iraq, Lebanon, Malaysia",
            CalculationMethod::UmmAlQura => "Saudi Arabia",
            CalculationMethod::Karachi => "Pakistan, Bangladesh, India, Afghanistan",
            CalculationMethod::Tehran => "Iran, some Shia communities",
            CalculationMethod::Jafari => "Shia communities worldwide",
        }
    }

    /// Recommended method for an ISO 3166 alpha-2 country code.
    pub fn recommended_for_country(code: &str) -> Option<CalculationMethod> {
        let method = match code.to_ascii_uppercase().as_str() {
            "SA" | "AE" | "QA" | "KW" | "BH" | "OM" | "YE" => CalculationMethod::UmmAlQura,
            "US" | "CA" => CalculationMethod::Isna,
            "EG" | "SY" | "IQ" | "LB" | "MY" | "SD" | "LY" | "DZ" | "MA" | "TN" | "JO" => {
                CalculationMethod::Egyptian
            }
            "PK" | "BD" | "IN" | "AF" => CalculationMethod::Karachi,
            "IR" => CalculationMethod::Tehran,
            "GB" | "FR" | "DE" | "NL" | "BE" | "ES" | "IT" | "SE" | "NO" | "DK" | "TR" | "ID"
            | "SG" | "JP" | "CN" | "AU" | "NZ" => CalculationMethod::MuslimWorldLeague,
            _ => return None,
        };
        Some(method)
    }
}

impl fmt::Display for CalculationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for CalculationMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let method = match s.trim().to_ascii_lowercase().as_str() {
            "mwl" | "muslim_world_league" => CalculationMethod::MuslimWorldLeague,
            "isna" => CalculationMethod::Isna,
            "egypt" | "egyptian" => CalculationMethod::Egyptian,
            "makkah" | "umm_al_qura" | "ummalqura" => CalculationMethod::UmmAlQura,
            "karachi" => CalculationMethod::Karachi,
            "tehran" => CalculationMethod::Tehran,
            "jafari" => CalculationMethod::Jafari,
            other => bail!(
                "Unknown calculation method '{other}'. Valid methods: {}",
                CalculationMethod::ALL
                    .iter()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        };
        Ok(method)
    }
}

/// Shadow-length convention for Asr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AsrMadhab {
    /// Shadow equals object length plus noon shadow.
    #[default]
    Shafi,
    /// Shadow equals twice the object length plus noon shadow.
    Hanafi,
}

impl AsrMadhab {
    pub fn shadow_factor(&self) -> f64 {
        match self {
            AsrMadhab::Shafi => 1.0,
            AsrMadhab::Hanafi => 2.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AsrMadhab::Shafi => "shafi",
            AsrMadhab::Hanafi => "hanafi",
        }
    }
}

impl fmt::Display for AsrMadhab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsrMadhab::Shafi => f.write_str("Shafi"),
            AsrMadhab::Hanafi => f.write_str("Hanafi"),
        }
    }
}

impl FromStr for AsrMadhab {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shafi" | "standard" => Ok(AsrMadhab::Shafi),
            "hanafi" => Ok(AsrMadhab::Hanafi),
            other => bail!("Unknown Asr madhab '{other}'. Valid values: shafi, hanafi"),
        }
    }
}

/// How the active method was chosen.
///
/// `Auto` and `User` both mean a method is in effect; only `Unset` lets the
/// daemon pick a recommendation for the current location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MethodSource {
    #[default]
    Unset,
    Auto,
    User,
}

impl MethodSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MethodSource::Unset => "unset",
            MethodSource::Auto => "auto",
            MethodSource::User => "user",
        }
    }

    /// Whether an automatic recommendation may replace the current method.
    pub fn allows_auto_apply(&self) -> bool {
        matches!(self, MethodSource::Unset)
    }
}

impl fmt::Display for MethodSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MethodSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unset" => Ok(MethodSource::Unset),
            "auto" => Ok(MethodSource::Auto),
            "user" => Ok(MethodSource::User),
            other => bail!("Unknown method source '{other}'. Valid values: unset, auto, user"),
        }
    }
}

/// Country code for a handful of IANA zones, used to recommend a method.
pub fn country_for_timezone(zone: &str) -> Option<&'static str> {
    let code = match zone {
        "Asia/Riyadh" => "SA",
        "Asia/Dubai" => "AE",
        "Asia/Qatar" => "QA",
        "Asia/Kuwait" => "KW",
        "Asia/Bahrain" => "BH",
        "Asia/Muscat" => "OM",
        "Asia/Aden" => "YE",
        "Asia/Karachi" => "PK",
        "Asia/Dhaka" => "BD",
        "Asia/Kolkata" | "Asia/Calcutta" => "IN",
        "Asia/Kabul" => "AF",
        "Asia/Tehran" => "IR",
        "Africa/Cairo" => "EG",
        "Asia/Damascus" => "SY",
        "Asia/Baghdad" => "IQ",
        "Asia/Beirut" => "LB",
        "Asia/Amman" => "JO",
        "Asia/Kuala_Lumpur" => "MY",
        "Africa/Khartoum" => "SD",
        "Africa/Tripoli" => "LY",
        "Africa/Algiers" => "DZ",
        "Africa/Casablanca" => "MA",
        "Africa/Tunis" => "TN",
        "America/New_York" | "America/Chicago" | "America/Denver" | "America/Los_Angeles"
        | "America/Phoenix" | "America/Anchorage" | "America/Detroit" | "Pacific/Honolulu" => "US",
        "America/Toronto" | "America/Vancouver" | "America/Edmonton" | "America/Winnipeg"
        | "America/Halifax" | "America/Regina" | "America/St_Johns" => "CA",
        "Europe/London" => "GB",
        "Europe/Paris" => "FR",
        "Europe/Berlin" => "DE",
        "Europe/Amsterdam" => "NL",
        "Europe/Brussels" => "BE",
        "Europe/Madrid" => "ES",
        "Europe/Rome" => "IT",
        "Europe/Stockholm" => "SE",
        "Europe/Oslo" => "NO",
        "Europe/Copenhagen" => "DK",
        "Europe/Istanbul" => "TR",
        "Asia/Jakarta" => "ID",
        "Asia/Singapore" => "SG",
        "Asia/Tokyo" => "JP",
        "Asia/Shanghai" => "CN",
        "Australia/Sydney" | "Australia/Melbourne" | "Australia/Perth" => "AU",
        "Pacific/Auckland" => "NZ",
        _ => return None,
    };
    Some(code)
}

/// Recommended method for a zone, if its country is known.
pub fn recommended_for_timezone(zone: &str) -> Option<CalculationMethod> {
    country_for_timezone(zone).and_then(CalculationMethod::recommended_for_country)
}
