//! `times`: print a day's prayer times and blocking windows.

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::core::log_prayer_set;
use crate::prayer::{DailyPrayerSet, PrayerKind};

pub fn handle_times_command(date: Option<&str>, debug_enabled: bool) -> Result<()> {
    log_version!();

    let (config, request) = super::load_request()?;
    let Some(request) = request else {
        super::log_missing_location();
        log_end!();
        return Ok(());
    };

    let date = match date {
        Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{text}'. Use YYYY-MM-DD"))?,
        None => super::today_for(&request),
    };

    let set = request.calculate_for(date)?;
    if let Some(city) = &config.city {
        log_block_start!("{city} ({})", request.coordinate);
    } else {
        log_block_start!("{}", request.coordinate);
    }
    log_prayer_set(&set);

    if debug_enabled {
        log_sunset_cross_check(&set);
    }

    log_end!();
    Ok(())
}

/// Compare Maghrib with an independent sunset calculation.
fn log_sunset_cross_check(set: &DailyPrayerSet) {
    use sunrise::{Coordinates, SolarDay, SolarEvent};

    let coord = set.coordinate();
    let Some(coordinates) = Coordinates::new(coord.latitude, coord.longitude) else {
        return;
    };
    let sunset = SolarDay::new(coordinates, set.date()).event_time(SolarEvent::Sunset);
    let maghrib = set.get(PrayerKind::Maghrib).time.to_utc();

    log_pipe!();
    log_debug!("Solar cross-check:");
    log_indented!("  Sunset (reference): {} UTC", sunset.format("%H:%M:%S"));
    log_indented!("  Maghrib:            {} UTC", maghrib.format("%H:%M:%S"));
    log_indented!(
        "  Difference:         {}s",
        (maghrib - sunset).num_seconds()
    );
}
