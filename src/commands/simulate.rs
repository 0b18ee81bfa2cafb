//! `simulate`: run the daemon against a simulated clock.
//!
//! Start and end times are read as wall-clock times in the prayer zone when
//! a location is configured, and in the system zone otherwise.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Local, Utc};
use std::sync::Arc;

use crate::Salahshield;
use crate::common::logger::Log;
use crate::config::Config;
use crate::time_source::{self, SimulatedTimeSource, parse_datetime_in};

pub fn handle_simulate_command(
    start_time: &str,
    end_time: &str,
    multiplier: f64,
    log_to_file: bool,
    debug_enabled: bool,
) -> Result<()> {
    let config = Config::load()?;
    let prayer_tz = match config.coordinate() {
        Some(_) => Some(config.resolve_timezone()?.0),
        None => None,
    };

    let (start, end) = parse_range(start_time, end_time, prayer_tz)?;

    // The clock must be installed before the first log line so timestamps
    // are simulated from the start
    time_source::init_time_source(Arc::new(SimulatedTimeSource::new(start, end, multiplier)));
    Log::set_prayer_timezone(prayer_tz);

    let _guard = if log_to_file {
        let file_name = format!(
            "salahshield-simulation-{}.log",
            Local::now().format("%Y%m%d-%H%M%S")
        );
        let guard = Log::start_file_logging(file_name.clone())?;
        println!("Writing simulation log to {file_name}");
        Some(guard)
    } else {
        None
    };

    log_version!();
    log_block_start!("Simulation Mode");
    let duration = end - start;
    match prayer_tz {
        Some(tz) => log_decorated!(
            "Simulating from {} to {} ({tz})",
            start.with_timezone(&tz).format("%Y-%m-%d %H:%M:%S"),
            end.with_timezone(&tz).format("%Y-%m-%d %H:%M:%S")
        ),
        None => log_decorated!(
            "Simulating from {} to {}",
            start.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
            end.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
        ),
    }
    log_indented!(
        "Total simulated time: {} hours {} minutes",
        duration.num_hours(),
        duration.num_minutes() % 60
    );
    if multiplier == 0.0 {
        log_indented!("Time acceleration: fast-forward");
    } else {
        log_indented!(
            "Time acceleration: {multiplier}x (about {:.1} seconds)",
            duration.num_seconds() as f64 / multiplier
        );
    }

    Salahshield::new(debug_enabled).simulated().run()
}

fn parse_range(
    start_time: &str,
    end_time: &str,
    prayer_tz: Option<chrono_tz::Tz>,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let parse = |text: &str| match prayer_tz {
        Some(tz) => parse_datetime_in(text, &tz),
        None => parse_datetime_in(text, &Local),
    };
    let start = parse(start_time).context("Invalid start time")?;
    let end = parse(end_time).context("Invalid end time")?;

    if end <= start {
        bail!("End time must be after start time");
    }
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_is_read_in_prayer_zone() {
        let (start, end) = parse_range(
            "2025-11-01 04:00:00",
            "2025-11-01 22:00:00",
            Some(chrono_tz::America::Toronto),
        )
        .unwrap();
        // EDT is UTC-4 on this date
        assert_eq!(start.format("%H:%M").to_string(), "08:00");
        assert_eq!((end - start).num_hours(), 18);
    }

    #[test]
    fn test_range_must_move_forward() {
        assert!(
            parse_range("2025-11-02 04:00:00", "2025-11-01 04:00:00", Some(chrono_tz::UTC))
                .is_err()
        );
    }
}
