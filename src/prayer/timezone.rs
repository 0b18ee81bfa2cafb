//! Time zone resolution for prayer calculation.
//!
//! Order of precedence: an explicit `timezone` in the config, the zone that
//! contains the configured coordinates, the system zone, then UTC.

use anyhow::{Context, Result};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use std::path::Path;
use tzf_rs::DefaultFinder;

use super::GeoCoordinate;

static FINDER: Lazy<DefaultFinder> = Lazy::new(DefaultFinder::new);

/// Where the resolved zone came from, shown in status output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimezoneSource {
    Configured,
    Coordinates,
    System,
    Fallback,
}

impl TimezoneSource {
    pub fn describe(&self) -> &'static str {
        match self {
            TimezoneSource::Configured => "from config",
            TimezoneSource::Coordinates => "from coordinates",
            TimezoneSource::System => "system",
            TimezoneSource::Fallback => "fallback",
        }
    }
}

/// Zone containing the given coordinates, if the lookup yields a known name.
pub fn determine_timezone_from_coordinates(latitude: f64, longitude: f64) -> Option<Tz> {
    let name = FINDER.get_tz_name(longitude, latitude);
    if name.is_empty() {
        return None;
    }
    name.parse::<Tz>().ok()
}

/// Zone the system clock is configured for.
pub fn system_timezone() -> Option<Tz> {
    if let Ok(tz) = std::env::var("TZ") {
        let name = tz.trim_start_matches(':');
        if let Ok(parsed) = name.parse::<Tz>() {
            return Some(parsed);
        }
    }

    if let Ok(target) = std::fs::read_link("/etc/localtime")
        && let Some(name) = zone_name_from_path(&target)
        && let Ok(parsed) = name.parse::<Tz>()
    {
        return Some(parsed);
    }

    std::fs::read_to_string("/etc/timezone")
        .ok()
        .and_then(|contents| contents.trim().parse::<Tz>().ok())
}

fn zone_name_from_path(path: &Path) -> Option<String> {
    let text = path.to_string_lossy();
    text.split_once("zoneinfo/")
        .map(|(_, name)| name.to_string())
}

/// Resolve the zone to calculate in.
///
/// Fails only when `configured` is present but not a valid IANA name.
pub fn resolve_timezone(
    configured: Option<&str>,
    coordinate: Option<GeoCoordinate>,
) -> Result<(Tz, TimezoneSource)> {
    if let Some(name) = configured {
        let tz = name
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("Invalid timezone '{name}' in configuration"))?;
        return Ok((tz, TimezoneSource::Configured));
    }

    if let Some(coord) = coordinate
        && let Some(tz) = determine_timezone_from_coordinates(coord.latitude, coord.longitude)
    {
        return Ok((tz, TimezoneSource::Coordinates));
    }

    if let Some(tz) = system_timezone() {
        return Ok((tz, TimezoneSource::System));
    }

    Ok((chrono_tz::UTC, TimezoneSource::Fallback))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::constants::test_constants::*;

    #[test]
    fn test_coordinates_resolve_to_zone() {
        assert_eq!(
            determine_timezone_from_coordinates(OTTAWA_LAT, OTTAWA_LON),
            Some(chrono_tz::America::Toronto)
        );
        assert_eq!(
            determine_timezone_from_coordinates(MAKKAH_LAT, MAKKAH_LON),
            Some(chrono_tz::Asia::Riyadh)
        );
    }

    #[test]
    fn test_configured_zone_wins() {
        let (tz, source) = resolve_timezone(
            Some("Europe/London"),
            Some(GeoCoordinate::new(OTTAWA_LAT, OTTAWA_LON)),
        )
        .unwrap();
        assert_eq!(tz, chrono_tz::Europe::London);
        assert_eq!(source, TimezoneSource::Configured);
    }

    #[test]
    fn test_invalid_configured_zone() {
        assert!(resolve_timezone(Some("Mars/Olympus"), None).is_err());
    }

    #[test]
    fn test_zone_name_from_symlink_target() {
        assert_eq!(
            zone_name_from_path(Path::new("/usr/share/zoneinfo/America/Toronto")).as_deref(),
            Some("America/Toronto")
        );
        assert_eq!(zone_name_from_path(Path::new("/etc/UTC")), None);
    }
}
