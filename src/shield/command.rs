//! Shield that runs user-supplied shell commands.
//!
//! The blocklist and the current prayer are exported to the commands as
//! environment variables so one script can drive a firewall, a hosts file or
//! a process killer.

use anyhow::{Context, Result, bail};
use std::process::Command;

use super::{Blocklist, Shield};
use crate::common::constants::*;
use crate::prayer::PrayerKind;

pub struct CommandShield {
    start_command: String,
    stop_command: Option<String>,
    blocklist: Blocklist,
}

impl CommandShield {
    pub fn new(start_command: String, stop_command: Option<String>, blocklist: Blocklist) -> Self {
        Self {
            start_command,
            stop_command,
            blocklist,
        }
    }

    fn build(&self, command_line: &str, prayer: Option<PrayerKind>) -> Command {
        let (apps, websites, categories) = self.blocklist.env_values();
        let mut command = Command::new("sh");
        command
            .arg("-c")
            .arg(command_line)
            .env(ENV_BLOCKED_APPS, apps)
            .env(ENV_BLOCKED_WEBSITES, websites)
            .env(ENV_BLOCKED_CATEGORIES, categories)
            .env(ENV_PRAYER, prayer.map(|p| p.name()).unwrap_or_default());
        command
    }

    fn run(&self, command_line: &str, prayer: Option<PrayerKind>) -> Result<()> {
        let status = self
            .build(command_line, prayer)
            .status()
            .with_context(|| format!("Failed to run shield command '{command_line}'"))?;
        if !status.success() {
            bail!("Shield command '{command_line}' exited with {status}");
        }
        Ok(())
    }
}

impl Shield for CommandShield {
    fn start_blocking(&mut self, prayer: PrayerKind) -> Result<()> {
        self.run(&self.start_command, Some(prayer))
    }

    fn stop_blocking(&mut self) -> Result<()> {
        match &self.stop_command {
            Some(command_line) => self.run(command_line, None),
            None => Ok(()),
        }
    }

    fn shield_name(&self) -> &'static str {
        "command"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_commands_receive_environment() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("env.txt");
        let start = format!(
            "printf '%s|%s|%s' \"$SALAHSHIELD_PRAYER\" \"$SALAHSHIELD_BLOCKED_APPS\" \"$SALAHSHIELD_BLOCKED_CATEGORIES\" > {}",
            out.display()
        );
        let mut shield = CommandShield::new(
            start,
            None,
            Blocklist {
                apps: vec!["discord".into()],
                websites: vec![],
                categories: vec![super::super::AppCategory::SocialMedia],
            },
        );

        shield.start_blocking(PrayerKind::Maghrib).unwrap();
        let written = std::fs::read_to_string(&out).unwrap();
        assert_eq!(written, "Maghrib|discord|social_media");

        // No stop command configured is not an error
        shield.stop_blocking().unwrap();
    }

    #[test]
    fn test_failing_command_reports_error() {
        let mut shield = CommandShield::new("exit 3".into(), Some("exit 0".into()), Blocklist::default());
        assert!(shield.start_blocking(PrayerKind::Fajr).is_err());
        assert!(shield.stop_blocking().is_ok());
    }
}
