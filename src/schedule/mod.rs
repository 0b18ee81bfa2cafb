//! Prayer-window blocking decisions.
//!
//! The free functions are pure queries over one [`DailyPrayerSet`] and a
//! moment in time. [`PrayerWindowScheduler`] adds the one stateful concern:
//! remembering how the set was calculated so that "next prayer" can roll
//! over to tomorrow's Fajr after Isha.
//!
//! A set is stale once `now` falls on a later date in the set's own zone
//! and every window of the set has closed. Isha can fall after local
//! midnight in high-latitude summers, so the date alone is not enough. Every
//! query treats a stale set as "nothing to block" until the coordinator
//! publishes a fresh one.

use chrono::{DateTime, Duration, NaiveDate, TimeZone};
use std::sync::Arc;

use crate::prayer::{CalculationError, CalculationRequest, DailyPrayerSet, PrayerInstant, PrayerKind};

#[cfg(test)]
mod tests;

/// Where `now` sits relative to the day's enabled windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleState {
    /// No enabled window has started yet today.
    BeforeAnyWindow,
    InsideWindow(PrayerKind),
    /// At least one enabled window has ended and another is still ahead.
    BetweenWindows,
    /// Every enabled window has ended (also when none are enabled).
    AllPrayersPassed,
    /// The set belongs to an earlier date and all its windows have closed.
    Stale,
}

impl ScheduleState {
    pub fn is_blocking(&self) -> bool {
        matches!(self, ScheduleState::InsideWindow(_))
    }

    pub fn describe(&self) -> String {
        match self {
            ScheduleState::BeforeAnyWindow => "before the first prayer window".to_string(),
            ScheduleState::InsideWindow(kind) => format!("inside the {kind} window"),
            ScheduleState::BetweenWindows => "between prayer windows".to_string(),
            ScheduleState::AllPrayersPassed => "all prayer windows have passed".to_string(),
            ScheduleState::Stale => "prayer times are out of date".to_string(),
        }
    }
}

/// Whether the set belongs to an earlier date and owns no window still open.
pub fn is_stale<Z: TimeZone>(set: &DailyPrayerSet, now: &DateTime<Z>) -> bool {
    if local_date(set, now) <= set.date() {
        return false;
    }
    let now = now.with_timezone(&set.timezone());
    set.iter().all(|instant| instant.window_end() < now)
}

fn local_date<Z: TimeZone>(set: &DailyPrayerSet, now: &DateTime<Z>) -> NaiveDate {
    now.with_timezone(&set.timezone()).date_naive()
}

/// The enabled instant whose window contains `now`, if any.
pub fn active_window<'a, Z: TimeZone>(
    set: &'a DailyPrayerSet,
    now: &DateTime<Z>,
) -> Option<&'a PrayerInstant> {
    if is_stale(set, now) {
        return None;
    }
    set.iter()
        .find(|instant| instant.enabled && instant.window_contains(now))
}

/// True iff `now` lies inside an enabled prayer's closed window.
pub fn should_block<Z: TimeZone>(set: &DailyPrayerSet, now: &DateTime<Z>) -> bool {
    active_window(set, now).is_some()
}

/// First prayer of the set strictly after `now`, enabled or not.
pub fn next_prayer_today<Z: TimeZone>(
    set: &DailyPrayerSet,
    now: &DateTime<Z>,
) -> Option<PrayerInstant> {
    if is_stale(set, now) {
        return None;
    }
    let now = now.with_timezone(&set.timezone());
    set.iter().find(|instant| instant.time > now).cloned()
}

pub fn state<Z: TimeZone>(set: &DailyPrayerSet, now: &DateTime<Z>) -> ScheduleState {
    if is_stale(set, now) {
        return ScheduleState::Stale;
    }
    if let Some(active) = active_window(set, now) {
        return ScheduleState::InsideWindow(active.kind);
    }

    let now = now.with_timezone(&set.timezone());
    let enabled: Vec<&PrayerInstant> = set.iter().filter(|instant| instant.enabled).collect();

    let any_started = enabled.iter().any(|instant| instant.window_start() <= now);
    let any_ahead = enabled.iter().any(|instant| instant.window_start() > now);

    match (any_started, any_ahead) {
        (false, true) => ScheduleState::BeforeAnyWindow,
        (true, true) => ScheduleState::BetweenWindows,
        _ => ScheduleState::AllPrayersPassed,
    }
}

/// Time left in the window currently blocking, if any.
pub fn time_until_window_end<Z: TimeZone>(set: &DailyPrayerSet, now: &DateTime<Z>) -> Option<Duration> {
    let active = active_window(set, now)?;
    Some(active.window_end() - now.with_timezone(&set.timezone()))
}

/// Time until the next enabled window opens today, with its prayer.
pub fn time_until_next_window<Z: TimeZone>(
    set: &DailyPrayerSet,
    now: &DateTime<Z>,
) -> Option<(PrayerKind, Duration)> {
    if is_stale(set, now) {
        return None;
    }
    let now = now.with_timezone(&set.timezone());
    set.iter()
        .filter(|instant| instant.enabled && instant.window_start() > now)
        .map(|instant| (instant.kind, instant.window_start() - now))
        .next()
}

/// Stateful wrapper that can look into tomorrow.
///
/// Holds the request the current set was produced from and caches the next
/// day's set once it has been needed.
#[derive(Debug, Default)]
pub struct PrayerWindowScheduler {
    request: Option<CalculationRequest>,
    tomorrow: Option<Arc<DailyPrayerSet>>,
}

impl PrayerWindowScheduler {
    pub fn new(request: CalculationRequest) -> Self {
        Self {
            request: Some(request),
            tomorrow: None,
        }
    }

    /// Replace the calculation inputs, e.g. after a config reload.
    pub fn set_request(&mut self, request: CalculationRequest) {
        if self.request.as_ref() != Some(&request) {
            self.tomorrow = None;
        }
        self.request = Some(request);
    }

    pub fn request(&self) -> Option<&CalculationRequest> {
        self.request.as_ref()
    }

    /// Next prayer after `now`: today's if any remain, otherwise tomorrow's Fajr.
    ///
    /// `None` when the set is stale, no request is known, or tomorrow cannot
    /// be calculated.
    pub fn next_prayer<Z: TimeZone>(
        &mut self,
        set: &DailyPrayerSet,
        now: &DateTime<Z>,
    ) -> Option<PrayerInstant> {
        if is_stale(set, now) {
            return None;
        }
        if let Some(next) = next_prayer_today(set, now) {
            return Some(next);
        }

        let tomorrow = self.tomorrow_of(set).ok()?;
        Some(tomorrow.get(PrayerKind::Fajr).clone())
    }

    /// The set for the day after `set`, calculated on first use.
    pub fn tomorrow_of(&mut self, set: &DailyPrayerSet) -> Result<Arc<DailyPrayerSet>, TomorrowError> {
        let date = set.date().succ_opt().ok_or(TomorrowError::DateOutOfRange)?;

        if let Some(cached) = &self.tomorrow
            && cached.date() == date
        {
            return Ok(Arc::clone(cached));
        }

        let request = self.request.as_ref().ok_or(TomorrowError::NoRequest)?;
        let next = Arc::new(request.calculate_for(date).map_err(TomorrowError::Calculation)?);
        self.tomorrow = Some(Arc::clone(&next));
        Ok(next)
    }
}

/// Why tomorrow's set is unavailable.
#[derive(Debug, Clone, PartialEq)]
pub enum TomorrowError {
    NoRequest,
    DateOutOfRange,
    Calculation(CalculationError),
}

impl std::fmt::Display for TomorrowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TomorrowError::NoRequest => f.write_str("no calculation inputs are known yet"),
            TomorrowError::DateOutOfRange => f.write_str("date out of range"),
            TomorrowError::Calculation(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for TomorrowError {}
