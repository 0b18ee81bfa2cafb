//! `status`: whether blocking is active right now.
//!
//! The report is computed from the configuration with the daemon's own
//! scheduling rules, so it matches what a running daemon does without
//! talking to it. `--json` prints the same report as JSON.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::common::utils::{format_duration, to_std_duration};
use crate::config::Config;
use crate::io::lock::read_running_pid;
use crate::schedule::{self, PrayerWindowScheduler};
use crate::time_source;

/// Overall state shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AppStatus {
    /// Inside an enabled prayer window.
    Active,
    /// Configured, outside every window.
    Idle,
    /// `paused = true` in the configuration.
    Paused,
    /// No location configured.
    NeedsSetup,
}

impl AppStatus {
    pub fn describe(&self) -> &'static str {
        match self {
            AppStatus::Active => "Blocking",
            AppStatus::Idle => "Not blocking",
            AppStatus::Paused => "Paused",
            AppStatus::NeedsSetup => "Needs setup",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub status: AppStatus,
    pub daemon_pid: Option<u32>,
    pub location: Option<String>,
    pub timezone: Option<String>,
    pub method: String,
    pub date: Option<NaiveDate>,
    pub current_prayer: Option<String>,
    pub window_ends_at: Option<String>,
    pub next_prayer: Option<NextPrayer>,
    pub blocked_items: usize,
}

#[derive(Debug, Serialize)]
pub struct NextPrayer {
    pub name: String,
    pub time: String,
    pub seconds_until: i64,
}

pub fn handle_status_command(json: bool) -> Result<()> {
    let config = Config::load()?;
    let report = build_report(&config, time_source::now(), read_running_pid())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    log_version!();
    display_human_readable(&report);
    log_end!();
    Ok(())
}

/// Evaluate the configuration at `now`.
pub fn build_report(
    config: &Config,
    now: DateTime<Utc>,
    daemon_pid: Option<u32>,
) -> Result<StatusReport> {
    let mut report = StatusReport {
        status: AppStatus::NeedsSetup,
        daemon_pid,
        location: None,
        timezone: None,
        method: config.calculation_method()?.as_str().to_string(),
        date: None,
        current_prayer: None,
        window_ends_at: None,
        next_prayer: None,
        blocked_items: config.blocklist()?.item_count(),
    };

    let Some(request) = config.calculation_request()? else {
        return Ok(report);
    };

    report.location = Some(match &config.city {
        Some(city) => format!("{city} ({})", request.coordinate),
        None => request.coordinate.to_string(),
    });
    report.timezone = Some(request.timezone.name().to_string());

    let date = now.with_timezone(&request.timezone).date_naive();
    let set = request.calculate_for(date)?;
    report.date = Some(date);

    let active = schedule::active_window(&set, &now);
    report.current_prayer = active.map(|instant| instant.kind.name().to_string());
    report.window_ends_at = active.map(|instant| instant.window_end().to_rfc3339());

    let mut scheduler = PrayerWindowScheduler::new(request);
    report.next_prayer = scheduler.next_prayer(&set, &now).map(|next| NextPrayer {
        name: next.kind.name().to_string(),
        time: next.time.to_rfc3339(),
        seconds_until: (next.time.to_utc() - now).num_seconds(),
    });

    report.status = if config.is_paused() {
        AppStatus::Paused
    } else if active.is_some() {
        AppStatus::Active
    } else {
        AppStatus::Idle
    };

    Ok(report)
}

fn display_human_readable(report: &StatusReport) {
    log_block_start!("Status: {}", report.status.describe());
    match report.daemon_pid {
        Some(pid) => log_indented!("Daemon: running (PID {pid})"),
        None => log_indented!("Daemon: not running"),
    }

    if report.status == AppStatus::NeedsSetup {
        super::log_missing_location();
        return;
    }

    if let Some(location) = &report.location {
        log_indented!("Location: {location}");
    }
    if let Some(tz) = &report.timezone {
        log_indented!("Time zone: {tz}");
    }
    log_indented!("Method: {}", report.method);

    if let (Some(prayer), Some(end)) = (&report.current_prayer, &report.window_ends_at) {
        let end = DateTime::parse_from_rfc3339(end)
            .map(|dt| dt.format("%H:%M").to_string())
            .unwrap_or_else(|_| end.clone());
        log_indented!("Current window: {prayer} until {end}");
    }
    if let Some(next) = &report.next_prayer {
        let wait = to_std_duration(chrono::Duration::seconds(next.seconds_until));
        log_indented!("Next prayer: {} in {}", next.name, format_duration(wait));
    }
    log_indented!("Blocklist: {} item(s)", report.blocked_items);
}
