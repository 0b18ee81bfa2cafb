//! Small shared helpers: path display, process checks, time formatting.

use chrono::{DateTime, TimeZone, Timelike};
use std::path::Path;
use std::time::Duration as StdDuration;

/// Display a path with the home directory replaced by `~`.
///
/// Used whenever a path is logged so that user names don't end up in
/// shared logs.
pub fn private_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(stripped) = path.strip_prefix(&home)
    {
        return format!("~/{}", stripped.display());
    }
    path.display().to_string()
}

/// Check whether a process with the given PID is alive.
pub fn is_process_running(pid: u32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    // Signal 0 performs the permission and existence check without delivering
    kill(Pid::from_raw(pid as i32), None).is_ok()
}

/// Send SIGUSR2 (configuration reload) to a running daemon.
pub fn signal_reload(pid: u32) -> anyhow::Result<()> {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    kill(Pid::from_raw(pid as i32), Signal::SIGUSR2)
        .map_err(|e| anyhow::anyhow!("Failed to signal process {pid}: {e}"))
}

/// Drop sub-second precision.
pub fn truncate_to_second<Tz: TimeZone>(dt: DateTime<Tz>) -> DateTime<Tz> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

/// Human readable duration, e.g. `2h 05m`, `14m 30s`, `45s`.
pub fn format_duration(duration: StdDuration) -> String {
    let total = duration.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{hours}h {minutes:02}m")
    } else if minutes > 0 {
        format!("{minutes}m {seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}

/// Convert a chrono duration to std, clamping negatives to zero.
pub fn to_std_duration(duration: chrono::Duration) -> StdDuration {
    duration.to_std().unwrap_or(StdDuration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(StdDuration::from_secs(45)), "45s");
        assert_eq!(format_duration(StdDuration::from_secs(14 * 60 + 30)), "14m 30s");
        assert_eq!(format_duration(StdDuration::from_secs(2 * 3600 + 5 * 60)), "2h 05m");
    }

    #[test]
    fn test_truncate_to_second() {
        let dt = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 5).unwrap()
            + chrono::Duration::milliseconds(750);
        let truncated = truncate_to_second(dt);
        assert_eq!(truncated.nanosecond(), 0);
        assert_eq!(truncated.second(), 5);
    }

    #[test]
    fn test_negative_duration_clamps() {
        assert_eq!(
            to_std_duration(chrono::Duration::seconds(-5)),
            StdDuration::ZERO
        );
    }

    #[test]
    fn test_private_path_outside_home() {
        assert_eq!(
            private_path(Path::new("/etc/salahshield.toml")),
            "/etc/salahshield.toml"
        );
    }
}
