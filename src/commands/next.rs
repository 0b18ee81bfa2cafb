//! `next`: the upcoming prayer, rolling over to tomorrow's Fajr after Isha.

use anyhow::Result;

use crate::common::utils::{format_duration, to_std_duration};
use crate::schedule::{self, PrayerWindowScheduler};
use crate::time_source;

pub fn handle_next_command() -> Result<()> {
    log_version!();

    let (_, request) = super::load_request()?;
    let Some(request) = request else {
        super::log_missing_location();
        log_end!();
        return Ok(());
    };

    let now = time_source::now();
    let set = request.calculate_for(super::today_for(&request))?;
    let mut scheduler = PrayerWindowScheduler::new(request);

    if let Some(active) = schedule::active_window(&set, &now) {
        log_block_start!(
            "Blocking now for {} until {}",
            active.kind,
            active.window_end().format("%H:%M")
        );
    }

    match scheduler.next_prayer(&set, &now) {
        Some(next) => {
            let wait = to_std_duration(next.time.to_utc() - now);
            let day = if next.time.date_naive() == set.date() {
                "today"
            } else {
                "tomorrow"
            };
            log_block_start!(
                "Next prayer: {} at {} {day} (in {})",
                next.kind,
                next.time.format("%H:%M"),
                format_duration(wait)
            );
            if next.enabled {
                log_indented!(
                    "Blocking from {} to {}",
                    next.window_start().format("%H:%M"),
                    next.window_end().format("%H:%M")
                );
            } else {
                log_indented!("Not blocked (disabled in config)");
            }
        }
        None => {
            log_pipe!();
            log_warning!("Could not determine the next prayer");
        }
    }

    log_end!();
    Ok(())
}
