//! App-shielding collaborators driven by the scheduler.
//!
//! A [`Shield`] only knows how to start and stop blocking. The
//! [`ShieldController`] sits in front of it, remembers what was last applied
//! and forwards transitions only, so the main loop can report its blocking
//! intent on every tick without spamming the shield.
//!
//! ## Implementations
//!
//! - [`LogShield`]: records intent in the log; the default.
//! - [`CommandShield`]: runs `start_command` / `stop_command` through `sh -c`.

use anyhow::{Result, bail};

use crate::config::{Config, ShieldBackend};
use crate::prayer::PrayerKind;

pub mod blocklist;
pub mod command;

pub use blocklist::{AppCategory, Blocklist};
pub use command::CommandShield;

/// Something that can block distractions. Implementations must tolerate
/// repeated calls in the same state.
#[cfg_attr(test, mockall::automock)]
pub trait Shield: Send {
    fn start_blocking(&mut self, prayer: PrayerKind) -> Result<()>;

    fn stop_blocking(&mut self) -> Result<()>;

    fn shield_name(&self) -> &'static str;
}

/// Logs what it would block.
pub struct LogShield {
    blocklist: Blocklist,
}

impl LogShield {
    pub fn new(blocklist: Blocklist) -> Self {
        Self { blocklist }
    }
}

impl Shield for LogShield {
    fn start_blocking(&mut self, prayer: PrayerKind) -> Result<()> {
        log_block_start!("Shield up for {prayer}");
        if self.blocklist.is_empty() {
            log_indented!("Blocklist is empty");
        } else {
            log_indented!("Blocking {} item(s)", self.blocklist.item_count());
        }
        Ok(())
    }

    fn stop_blocking(&mut self) -> Result<()> {
        log_block_start!("Shield down");
        Ok(())
    }

    fn shield_name(&self) -> &'static str {
        "log"
    }
}

/// Build the shield selected in the configuration.
pub fn create_shield(config: &Config) -> Result<Box<dyn Shield>> {
    let blocklist = config.blocklist()?;
    match config.shield.unwrap_or_default() {
        ShieldBackend::Log => Ok(Box::new(LogShield::new(blocklist))),
        ShieldBackend::Command => {
            let Some(start) = config.start_command.clone() else {
                bail!("shield = \"command\" requires start_command to be set");
            };
            Ok(Box::new(CommandShield::new(
                start,
                config.stop_command.clone(),
                blocklist,
            )))
        }
    }
}

/// Forwards blocking transitions to a [`Shield`].
pub struct ShieldController {
    shield: Box<dyn Shield>,
    active: Option<PrayerKind>,
}

impl ShieldController {
    pub fn new(shield: Box<dyn Shield>) -> Self {
        Self {
            shield,
            active: None,
        }
    }

    /// Prayer currently being shielded, if blocking is active.
    pub fn active(&self) -> Option<PrayerKind> {
        self.active
    }

    pub fn shield_name(&self) -> &'static str {
        self.shield.shield_name()
    }

    /// Apply the current intent: `Some(prayer)` to block, `None` to allow.
    ///
    /// A failed start leaves the controller inactive and a failed stop leaves
    /// it active, so the next tick retries either one.
    pub fn apply(&mut self, intent: Option<PrayerKind>) -> Result<()> {
        match (self.active, intent) {
            (None, Some(prayer)) => {
                self.shield.start_blocking(prayer)?;
                self.active = Some(prayer);
            }
            (Some(current), Some(prayer)) if current != prayer => {
                // Overlapping windows: still blocking, only the label changes
                self.active = Some(prayer);
            }
            (Some(_), None) => {
                self.shield.stop_blocking()?;
                self.active = None;
            }
            _ => {}
        }
        Ok(())
    }

    /// Replace the shield, e.g. after a config reload. Stops the old one first
    /// when it was blocking; the next [`apply`](Self::apply) restarts.
    pub fn replace(&mut self, shield: Box<dyn Shield>) -> Result<()> {
        let result = if self.active.take().is_some() {
            self.shield.stop_blocking()
        } else {
            Ok(())
        };
        self.shield = shield;
        result
    }

    /// Stop blocking unconditionally.
    pub fn shutdown(&mut self) -> Result<()> {
        self.active = None;
        self.shield.stop_blocking()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transitions_are_forwarded() {
        let mut mock = MockShield::new();
        mock.expect_start_blocking()
            .withf(|prayer| *prayer == PrayerKind::Dhuhr)
            .times(1)
            .returning(|_| Ok(()));
        mock.expect_stop_blocking().times(1).returning(|| Ok(()));

        let mut controller = ShieldController::new(Box::new(mock));
        controller.apply(None).unwrap();
        controller.apply(Some(PrayerKind::Dhuhr)).unwrap();
        controller.apply(Some(PrayerKind::Dhuhr)).unwrap();
        assert_eq!(controller.active(), Some(PrayerKind::Dhuhr));
        controller.apply(None).unwrap();
        controller.apply(None).unwrap();
        assert_eq!(controller.active(), None);
    }

    #[test]
    fn test_failed_start_is_retried() {
        let mut mock = MockShield::new();
        let mut calls = 0;
        mock.expect_start_blocking().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                anyhow::bail!("not yet")
            } else {
                Ok(())
            }
        });

        let mut controller = ShieldController::new(Box::new(mock));
        assert!(controller.apply(Some(PrayerKind::Isha)).is_err());
        assert_eq!(controller.active(), None);
        controller.apply(Some(PrayerKind::Isha)).unwrap();
        assert_eq!(controller.active(), Some(PrayerKind::Isha));
    }

    #[test]
    fn test_failed_stop_is_retried() {
        let mut mock = MockShield::new();
        mock.expect_start_blocking().times(1).returning(|_| Ok(()));
        let mut calls = 0;
        mock.expect_stop_blocking().times(2).returning(move || {
            calls += 1;
            if calls == 1 {
                anyhow::bail!("stop command failed")
            } else {
                Ok(())
            }
        });

        let mut controller = ShieldController::new(Box::new(mock));
        controller.apply(Some(PrayerKind::Dhuhr)).unwrap();
        assert!(controller.apply(None).is_err());
        assert_eq!(controller.active(), Some(PrayerKind::Dhuhr));

        controller.apply(None).unwrap();
        assert_eq!(controller.active(), None);
        // Nothing left to stop
        controller.apply(None).unwrap();
    }

    #[test]
    fn test_shutdown_always_stops() {
        let mut mock = MockShield::new();
        mock.expect_stop_blocking().times(1).returning(|| Ok(()));
        let mut controller = ShieldController::new(Box::new(mock));
        controller.shutdown().unwrap();
    }

    #[test]
    fn test_replace_stops_active_shield() {
        let mut old = MockShield::new();
        old.expect_start_blocking().times(1).returning(|_| Ok(()));
        old.expect_stop_blocking().times(1).returning(|| Ok(()));

        let mut new = MockShield::new();
        new.expect_start_blocking().times(1).returning(|_| Ok(()));

        let mut controller = ShieldController::new(Box::new(old));
        controller.apply(Some(PrayerKind::Asr)).unwrap();
        controller.replace(Box::new(new)).unwrap();
        assert_eq!(controller.active(), None);
        controller.apply(Some(PrayerKind::Asr)).unwrap();
    }
}
