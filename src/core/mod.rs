//! The blocking coordinator.
//!
//! [`Core`] owns the daemon's runtime state and runs its main loop:
//!
//! - Prayer sets are calculated on a worker thread and arrive back as
//!   [`CoreEvent::PrayerSetReady`], tagged with the generation of the request
//!   that started them.
//! - Every tick compares the clock against the published set and forwards the
//!   resulting intent to the [`ShieldController`].
//! - A calendar-date check recalculates after midnight in the set's zone.
//! - Signals and the config watcher post [`CoreEvent::Reload`] and
//!   [`CoreEvent::Shutdown`] on the same channel, so the loop waits in one place.

pub mod snapshot;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use crate::common::logger::Log;
use crate::common::utils::{format_duration, private_path, to_std_duration};
use crate::config::{self, Config, builder::toml_string, update_config_value};
use crate::io::lock::InstanceLock;
use crate::prayer::{
    CalculationError, DailyPrayerSet, MethodSource, PrayerKind, method::recommended_for_timezone,
};
use crate::schedule::{self, PrayerWindowScheduler, ScheduleState};
use crate::shield::{Shield, ShieldController, create_shield};
use crate::time_source;

pub use snapshot::PrayerSetCell;

/// Messages delivered to the coordinator's main loop.
#[derive(Debug)]
pub enum CoreEvent {
    /// Re-read the configuration file (SIGUSR2 or a file change).
    Reload,
    /// Stop blocking and exit (SIGINT, SIGTERM, SIGHUP).
    Shutdown,
    /// A worker finished calculating a day's prayers.
    PrayerSetReady {
        generation: u64,
        result: Result<DailyPrayerSet, CalculationError>,
    },
}

/// Everything needed to construct a [`Core`].
pub struct CoreParams {
    pub config: Config,
    pub config_path: PathBuf,
    pub shield: Box<dyn Shield>,
    pub debug_enabled: bool,
    /// Held until the core is dropped; `None` for simulations.
    pub lock: Option<InstanceLock>,
}

pub struct Core {
    config: Config,
    config_path: PathBuf,
    controller: ShieldController,
    debug_enabled: bool,
    _lock: Option<InstanceLock>,
    sender: Sender<CoreEvent>,
    receiver: Receiver<CoreEvent>,
    running: Arc<AtomicBool>,
    prayer_set: Arc<PrayerSetCell>,
    scheduler: PrayerWindowScheduler,
    // Generation of the newest calculation request
    generation: u64,
    calculation_pending: bool,
    // Date the newest request was made for, to avoid re-requesting a failed day
    requested_date: Option<NaiveDate>,
    last_state: Option<ScheduleState>,
    last_rollover_check: Option<DateTime<Utc>>,
    setup_prompted: bool,
}

impl Core {
    pub fn new(params: CoreParams) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            config: params.config,
            config_path: params.config_path,
            controller: ShieldController::new(params.shield),
            debug_enabled: params.debug_enabled,
            _lock: params.lock,
            sender,
            receiver,
            running: Arc::new(AtomicBool::new(true)),
            prayer_set: Arc::new(PrayerSetCell::new()),
            scheduler: PrayerWindowScheduler::default(),
            generation: 0,
            calculation_pending: false,
            requested_date: None,
            last_state: None,
            last_rollover_check: None,
            setup_prompted: false,
        }
    }

    /// Channel for signal and watcher threads.
    pub fn sender(&self) -> Sender<CoreEvent> {
        self.sender.clone()
    }

    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn prayer_set(&self) -> Arc<PrayerSetCell> {
        Arc::clone(&self.prayer_set)
    }

    /// Run until shutdown or the end of a simulation, then release the shield.
    pub fn execute(mut self) -> Result<()> {
        if let Some(custom_dir) = config::get_custom_config_dir() {
            log_block_start!("Base directory: {}", private_path(&custom_dir));
        }
        log_block_start!("Using {} shield", self.controller.shield_name());

        self.auto_apply_method();
        self.request_calculation(time_source::now());
        self.main_loop();

        log_block_start!("Shutting down salahshield...");
        if let Err(e) = self.controller.shutdown() {
            log_warning!("Failed to stop the shield: {e:#}");
        }
        log_end!();

        Ok(())
    }

    fn main_loop(&mut self) {
        while self.running.load(Ordering::SeqCst) {
            let now = time_source::now();
            self.check_rollover(now);
            self.update_blocking(now);

            if time_source::simulation_ended() {
                log_block_start!("Simulation complete");
                break;
            }

            let current = self.prayer_set.current();
            let timeout = next_wake(current.as_deref(), &now, self.poll_interval());

            match self.wait_for_event(timeout) {
                Ok(event) => self.handle_event(event),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    log_pipe!();
                    log_error!("Event channel disconnected unexpectedly");
                    break;
                }
            }
        }
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_secs(
            self.config
                .check_interval()
                .min(self.config.rollover_interval()),
        )
    }

    /// Block until an event arrives or `timeout` of clock time passes.
    ///
    /// Under simulation the wait goes through the time source and events are
    /// picked up after it, except while a calculation is outstanding.
    fn wait_for_event(&self, timeout: Duration) -> Result<CoreEvent, RecvTimeoutError> {
        if !time_source::is_simulated() {
            return self.receiver.recv_timeout(timeout);
        }

        match self.receiver.try_recv() {
            Ok(event) => return Ok(event),
            Err(TryRecvError::Disconnected) => return Err(RecvTimeoutError::Disconnected),
            Err(TryRecvError::Empty) => {}
        }
        if self.calculation_pending {
            return self.receiver.recv_timeout(Duration::from_secs(1));
        }

        time_source::sleep(timeout);
        self.receiver.try_recv().map_err(|e| match e {
            TryRecvError::Empty => RecvTimeoutError::Timeout,
            TryRecvError::Disconnected => RecvTimeoutError::Disconnected,
        })
    }

    pub(crate) fn handle_event(&mut self, event: CoreEvent) {
        match event {
            CoreEvent::Reload => self.reload_config(),
            CoreEvent::Shutdown => self.running.store(false, Ordering::SeqCst),
            CoreEvent::PrayerSetReady { generation, result } => {
                self.handle_prayer_set(generation, result)
            }
        }
    }

    /// Start calculating the set for `now`'s date under the current configuration.
    fn request_calculation(&mut self, now: DateTime<Utc>) {
        let request = match self.config.calculation_request() {
            Ok(Some(request)) => request,
            Ok(None) => {
                self.prayer_set.clear();
                self.requested_date = None;
                self.calculation_pending = false;
                if !self.setup_prompted {
                    log_pipe!();
                    log_warning!("No location configured, blocking is inactive");
                    log_indented!("Set one with: salahshield set latitude <lat> longitude <lon>");
                    self.setup_prompted = true;
                }
                return;
            }
            Err(e) => {
                log_pipe!();
                log_error!("Cannot calculate prayer times: {e:#}");
                return;
            }
        };
        self.setup_prompted = false;

        let date = now.with_timezone(&request.timezone).date_naive();
        Log::set_prayer_timezone(Some(request.timezone));
        self.scheduler.set_request(request.clone());

        self.generation += 1;
        self.calculation_pending = true;
        self.requested_date = Some(date);

        let generation = self.generation;
        let sender = self.sender.clone();
        if self.debug_enabled {
            log_debug!("Calculating prayer times for {date} (generation {generation})");
        }
        thread::spawn(move || {
            let result = request.calculate_for(date);
            let _ = sender.send(CoreEvent::PrayerSetReady { generation, result });
        });
    }

    fn handle_prayer_set(
        &mut self,
        generation: u64,
        result: Result<DailyPrayerSet, CalculationError>,
    ) {
        if generation < self.generation {
            if self.debug_enabled {
                log_debug!("Discarding prayer times from outdated generation {generation}");
            }
            return;
        }
        self.calculation_pending = false;

        match result {
            Ok(set) => {
                let set = Arc::new(set);
                if self.prayer_set.publish(generation, Arc::clone(&set)) {
                    log_prayer_set(&set);
                    // Force the next tick to report where we are
                    self.last_state = None;
                }
            }
            Err(e) => {
                self.prayer_set.clear();
                log_pipe!();
                log_error!("Failed to calculate prayer times: {e}");
                log_indented!("Blocking stays inactive until the next successful calculation");
            }
        }
    }

    /// Recalculate once the published set's date has passed.
    ///
    /// The outgoing set stays published while one of its windows is still
    /// open, so an Isha that falls after midnight is blocked in full.
    fn check_rollover(&mut self, now: DateTime<Utc>) {
        let interval = chrono::Duration::seconds(self.config.rollover_interval() as i64);
        if self
            .last_rollover_check
            .is_some_and(|last| now >= last && now - last < interval)
        {
            return;
        }
        self.last_rollover_check = Some(now);

        let Some(request) = self.scheduler.request() else {
            return;
        };
        let today = now.with_timezone(&request.timezone).date_naive();
        if self.requested_date == Some(today) {
            return;
        }
        if let Some(current) = self.prayer_set.current()
            && !schedule::is_stale(&current, &now)
        {
            return;
        }

        log_block_start!("Date changed to {today}, recalculating prayer times");
        self.request_calculation(now);
    }

    fn update_blocking(&mut self, now: DateTime<Utc>) {
        let set = self.prayer_set.current();
        let state = set.as_deref().map(|set| schedule::state(set, &now));

        if state != self.last_state {
            if let (Some(set), Some(state)) = (set.as_deref(), state) {
                self.log_state(set, state, now);
            }
            self.last_state = state;
        }

        let intent = blocking_intent(set.as_deref(), self.config.is_paused(), &now);
        if let Err(e) = self.controller.apply(intent) {
            log_pipe!();
            log_error!("{} shield failed: {e:#}", self.controller.shield_name());
            log_indented!("Retrying on the next check");
        }
    }

    fn log_state(&mut self, set: &DailyPrayerSet, state: ScheduleState, now: DateTime<Utc>) {
        match state {
            ScheduleState::InsideWindow(kind) => {
                let end = set.get(kind).window_end();
                log_block_start!("{kind} window open until {}", end.format("%H:%M:%S"));
                if self.config.is_paused() {
                    log_indented!("Paused, not blocking");
                }
            }
            ScheduleState::Stale => {
                log_block_start!("Prayer times are out of date, blocking is inactive");
            }
            other => {
                log_block_start!("Now {}", other.describe());
                if let Some((kind, wait)) = schedule::time_until_next_window(set, &now) {
                    log_indented!(
                        "Next: {kind} window in {}",
                        format_duration(to_std_duration(wait))
                    );
                } else if let Some(next) = self.scheduler.next_prayer(set, &now) {
                    log_indented!(
                        "Next: {} at {}",
                        next.kind,
                        next.time.format("%Y-%m-%d %H:%M")
                    );
                }
            }
        }
    }

    fn reload_config(&mut self) {
        let new_config = match Config::load_from_path(&self.config_path) {
            Ok(config) => config,
            Err(e) => {
                log_pipe!();
                log_warning!("Failed to reload configuration: {e:#}");
                log_indented!("Keeping the previous configuration");
                return;
            }
        };

        if new_config == self.config {
            if self.debug_enabled {
                log_debug!("Configuration unchanged");
            }
            return;
        }

        let shield_changed = shield_inputs_differ(&self.config, &new_config);
        self.config = new_config;
        self.config.log_config();

        if shield_changed {
            match create_shield(&self.config) {
                Ok(shield) => {
                    if let Err(e) = self.controller.replace(shield) {
                        log_warning!("Failed to stop the previous shield: {e:#}");
                    }
                    log_decorated!("Switched to {} shield", self.controller.shield_name());
                }
                Err(e) => {
                    log_pipe!();
                    log_error!("Failed to create shield: {e:#}");
                    log_indented!("Keeping the {} shield", self.controller.shield_name());
                }
            }
        }

        self.auto_apply_method();
        self.request_calculation(time_source::now());
    }

    /// Pick a regional method while the user has not chosen one.
    ///
    /// Writes `method` and `method_source = "auto"` back to the file so the
    /// choice is visible and the user can override it.
    fn auto_apply_method(&mut self) {
        let Ok(source) = self.config.method_source() else {
            return;
        };
        if !source.allows_auto_apply() || self.config.coordinate().is_none() {
            return;
        }
        let Ok((tz, _)) = self.config.resolve_timezone() else {
            return;
        };
        let Some(method) = recommended_for_timezone(tz.name()) else {
            return;
        };

        log_block_start!("Using {} for {tz}", method.full_name());
        log_indented!("Override with: salahshield set method <name>");

        let written = update_config_value(&self.config_path, "method", &toml_string(method.as_str()))
            .and_then(|()| {
                update_config_value(
                    &self.config_path,
                    "method_source",
                    &toml_string(MethodSource::Auto.as_str()),
                )
            });
        if let Err(e) = written {
            log_warning!("Could not save the method to the config file: {e:#}");
        }

        self.config.method = Some(method.as_str().to_string());
        self.config.method_source = Some(MethodSource::Auto.as_str().to_string());
    }
}

/// Prayer to shield for at `now`, or `None` to allow everything.
pub fn blocking_intent(
    set: Option<&DailyPrayerSet>,
    paused: bool,
    now: &DateTime<Utc>,
) -> Option<PrayerKind> {
    if paused {
        return None;
    }
    schedule::active_window(set?, now).map(|instant| instant.kind)
}

/// How long to wait before the next tick.
///
/// Never longer than `interval`, and short enough to wake at the next
/// window boundary so blocking starts and ends on time.
pub fn next_wake(set: Option<&DailyPrayerSet>, now: &DateTime<Utc>, interval: Duration) -> Duration {
    let boundary = set.and_then(|set| {
        // Windows are closed intervals: wake just past the end
        schedule::time_until_window_end(set, now)
            .map(|left| to_std_duration(left) + Duration::from_secs(1))
            .or_else(|| {
                schedule::time_until_next_window(set, now).map(|(_, wait)| to_std_duration(wait))
            })
    });

    boundary
        .map_or(interval, |wait| wait.min(interval))
        .max(Duration::from_millis(500))
}

fn shield_inputs_differ(old: &Config, new: &Config) -> bool {
    old.shield != new.shield
        || old.start_command != new.start_command
        || old.stop_command != new.stop_command
        || old.blocked_apps != new.blocked_apps
        || old.blocked_websites != new.blocked_websites
        || old.blocked_categories != new.blocked_categories
}

/// Print a day's prayer times and windows.
pub fn log_prayer_set(set: &DailyPrayerSet) {
    log_block_start!(
        "Prayer times for {} ({}, {})",
        set.date(),
        set.method().short_name(),
        set.timezone()
    );
    for instant in set.iter() {
        if instant.enabled {
            log_indented!(
                "{:<8} {}  blocked {}-{}",
                instant.kind.name(),
                instant.time.format("%H:%M:%S"),
                instant.window_start().format("%H:%M"),
                instant.window_end().format("%H:%M")
            );
        } else {
            log_indented!(
                "{:<8} {}  not blocked",
                instant.kind.name(),
                instant.time.format("%H:%M:%S")
            );
        }
    }
}

#[cfg(test)]
mod tests;
