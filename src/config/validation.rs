//! Configuration validation.
//!
//! Every check produces a message that names the key, the offending value
//! and the accepted range so the user can fix the file without reading docs.

use anyhow::{Result, bail};
use chrono_tz::Tz;

use super::{Config, ShieldBackend};
use crate::common::constants::*;
use crate::prayer::{AsrMadhab, CalculationMethod, MethodSource, PrayerKind};
use crate::shield::AppCategory;

pub fn validate_config(config: &Config) -> Result<()> {
    validate_location(config)?;

    if let Some(method) = &config.method {
        method.parse::<CalculationMethod>()?;
    }
    if let Some(source) = &config.method_source {
        source.parse::<MethodSource>()?;
    }
    if let Some(madhab) = &config.asr_madhab {
        madhab.parse::<AsrMadhab>()?;
    }

    if let Some(interval) = config.check_interval
        && !(MINIMUM_CHECK_INTERVAL..=MAXIMUM_CHECK_INTERVAL).contains(&interval)
    {
        bail!(
            "check_interval ({interval}) must be between {MINIMUM_CHECK_INTERVAL} and {MAXIMUM_CHECK_INTERVAL} seconds"
        );
    }
    if let Some(interval) = config.rollover_interval
        && !(MINIMUM_ROLLOVER_INTERVAL..=MAXIMUM_ROLLOVER_INTERVAL).contains(&interval)
    {
        bail!(
            "rollover_interval ({interval}) must be between {MINIMUM_ROLLOVER_INTERVAL} and {MAXIMUM_ROLLOVER_INTERVAL} seconds"
        );
    }

    for kind in PrayerKind::ALL {
        validate_buffers(config, kind)?;
    }

    if config.shield == Some(ShieldBackend::Command)
        && config
            .start_command
            .as_deref()
            .is_none_or(|cmd| cmd.trim().is_empty())
    {
        bail!("shield = \"command\" requires a non-empty start_command");
    }

    for category in config.blocked_categories.iter().flatten() {
        category.parse::<AppCategory>()?;
    }

    Ok(())
}

fn validate_location(config: &Config) -> Result<()> {
    match (config.latitude, config.longitude) {
        (Some(_), None) => bail!("latitude is set but longitude is missing"),
        (None, Some(_)) => bail!("longitude is set but latitude is missing"),
        (Some(lat), Some(lon)) => {
            if !(-90.0..=90.0).contains(&lat) {
                bail!("latitude ({lat}) must be between -90 and 90 degrees");
            }
            if !(-180.0..=180.0).contains(&lon) {
                bail!("longitude ({lon}) must be between -180 and 180 degrees");
            }
        }
        (None, None) => {}
    }

    if let Some(name) = &config.timezone
        && name.parse::<Tz>().is_err()
    {
        bail!("timezone '{name}' is not a known IANA time zone (e.g. \"America/Toronto\")");
    }

    Ok(())
}

fn validate_buffers(config: &Config, kind: PrayerKind) -> Result<()> {
    let (before, after, _) = config.prayer_fields(kind);
    let key = kind.config_key();

    if let Some(before) = before
        && !(MINIMUM_BUFFER_BEFORE..=MAXIMUM_BUFFER_BEFORE).contains(&before)
    {
        bail!(
            "{key}_buffer_before ({before}) must be between {MINIMUM_BUFFER_BEFORE} and {MAXIMUM_BUFFER_BEFORE} minutes"
        );
    }
    if let Some(after) = after
        && !(MINIMUM_BUFFER_AFTER..=MAXIMUM_BUFFER_AFTER).contains(&after)
    {
        bail!(
            "{key}_buffer_after ({after}) must be between {MINIMUM_BUFFER_AFTER} and {MAXIMUM_BUFFER_AFTER} minutes"
        );
    }
    Ok(())
}
