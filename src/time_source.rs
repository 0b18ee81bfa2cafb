//! Clock abstraction so the scheduler can run on real or simulated time.
//!
//! Everything that asks "what time is it" or waits goes through the global
//! source installed here. `salahshield simulate` installs a
//! [`SimulatedTimeSource`] that either accelerates time by a multiplier or
//! jumps through every wait instantly (multiplier `0`).

use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::OnceCell;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration as StdDuration, Instant};

static TIME_SOURCE: OnceCell<Arc<dyn TimeSource>> = OnceCell::new();

pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Wait for `duration` of this source's time.
    fn sleep(&self, duration: StdDuration);

    fn is_simulated(&self) -> bool;

    /// Whether a simulation has reached its end. Always false for real time.
    fn is_ended(&self) -> bool {
        false
    }
}

pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: StdDuration) {
        std::thread::sleep(duration);
    }

    fn is_simulated(&self) -> bool {
        false
    }
}

/// Progress of a simulation: elapsed simulated time plus any wait in flight.
#[derive(Debug, Default)]
struct SimulationClock {
    elapsed: ChronoDuration,
    // Real start of the current wait and the simulated span it covers
    in_flight: Option<(Instant, ChronoDuration)>,
}

/// Simulated clock running from `start` to `end`.
pub struct SimulatedTimeSource {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    // Simulated seconds per real second; 0 means fast-forward
    multiplier: f64,
    clock: Mutex<SimulationClock>,
}

impl SimulatedTimeSource {
    /// Negative multipliers fall back to one simulated hour per real second.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, multiplier: f64) -> Self {
        let multiplier = if multiplier < 0.0 || !multiplier.is_finite() {
            3600.0
        } else {
            multiplier
        };
        Self {
            start,
            end,
            multiplier,
            clock: Mutex::new(SimulationClock::default()),
        }
    }

    pub fn is_fast_forward(&self) -> bool {
        self.multiplier == 0.0
    }

    fn clock(&self) -> MutexGuard<'_, SimulationClock> {
        self.clock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn current_time(&self) -> DateTime<Utc> {
        let clock = self.clock();
        let mut elapsed = clock.elapsed;

        // Accelerated waits advance smoothly so log timestamps move during them
        if let Some((started, span)) = clock.in_flight {
            let real = started.elapsed().as_secs_f64();
            let simulated = ChronoDuration::milliseconds((real * self.multiplier * 1000.0) as i64);
            elapsed += simulated.min(span);
        }

        (self.start + elapsed).min(self.end)
    }

    fn remaining(&self) -> ChronoDuration {
        let now = self.start + self.clock().elapsed;
        (self.end - now).max(ChronoDuration::zero())
    }
}

impl TimeSource for SimulatedTimeSource {
    fn now(&self) -> DateTime<Utc> {
        self.current_time()
    }

    fn sleep(&self, duration: StdDuration) {
        let requested = ChronoDuration::from_std(duration).unwrap_or(ChronoDuration::MAX);
        let span = requested.min(self.remaining());
        if span <= ChronoDuration::zero() {
            // Yield so a finished simulation doesn't spin
            std::thread::sleep(StdDuration::from_millis(1));
            return;
        }

        if self.is_fast_forward() {
            self.clock().elapsed += span;
            std::thread::sleep(StdDuration::from_millis(1));
            return;
        }

        self.clock().in_flight = Some((Instant::now(), span));
        let real = span.num_milliseconds() as f64 / 1000.0 / self.multiplier;
        std::thread::sleep(StdDuration::from_secs_f64(real.max(0.0)));

        let mut clock = self.clock();
        clock.in_flight = None;
        clock.elapsed += span;
    }

    fn is_simulated(&self) -> bool {
        true
    }

    fn is_ended(&self) -> bool {
        self.current_time() >= self.end
    }
}

/// Install the global time source. Only the first call has an effect.
pub fn init_time_source(source: Arc<dyn TimeSource>) {
    let _ = TIME_SOURCE.set(source);
}

pub fn is_initialized() -> bool {
    TIME_SOURCE.get().is_some()
}

fn source() -> &'static Arc<dyn TimeSource> {
    TIME_SOURCE.get_or_init(|| Arc::new(RealTimeSource))
}

pub fn now() -> DateTime<Utc> {
    source().now()
}

/// Current time in the system zone, for display.
pub fn now_local() -> DateTime<Local> {
    now().with_timezone(&Local)
}

pub fn sleep(duration: StdDuration) {
    source().sleep(duration)
}

pub fn is_simulated() -> bool {
    source().is_simulated()
}

pub fn simulation_ended() -> bool {
    source().is_ended()
}

/// Parse `YYYY-MM-DD HH:MM:SS` as wall-clock time in `tz`.
pub fn parse_datetime_in<Z: TimeZone>(text: &str, tz: &Z) -> anyhow::Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(text.trim(), "%Y-%m-%d %H:%M:%S").map_err(|e| {
        anyhow::anyhow!("Invalid datetime '{text}': {e}. Use YYYY-MM-DD HH:MM:SS")
    })?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| anyhow::anyhow!("'{text}' does not exist in the selected time zone"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(text: &str) -> DateTime<Utc> {
        parse_datetime_in(text, &Utc).unwrap()
    }

    #[test]
    fn test_fast_forward_advances_exactly() {
        let source = SimulatedTimeSource::new(
            utc("2025-11-01 10:00:00"),
            utc("2025-11-01 12:00:00"),
            0.0,
        );
        source.sleep(StdDuration::from_secs(30 * 60));
        assert_eq!(source.now(), utc("2025-11-01 10:30:00"));
        assert!(!source.is_ended());
    }

    #[test]
    fn test_fast_forward_stops_at_end() {
        let source = SimulatedTimeSource::new(
            utc("2025-11-01 10:00:00"),
            utc("2025-11-01 10:05:00"),
            0.0,
        );
        source.sleep(StdDuration::from_secs(3600));
        assert_eq!(source.now(), utc("2025-11-01 10:05:00"));
        assert!(source.is_ended());
    }

    #[test]
    fn test_accelerated_sleep() {
        let source = SimulatedTimeSource::new(
            utc("2025-11-01 10:00:00"),
            utc("2025-11-01 11:00:00"),
            6000.0,
        );
        // Ten simulated minutes at 6000x is 100ms of real time
        source.sleep(StdDuration::from_secs(600));
        assert_eq!(source.now(), utc("2025-11-01 10:10:00"));
    }

    #[test]
    fn test_parse_datetime_in_zone() {
        let parsed = parse_datetime_in("2025-11-01 12:00:00", &chrono_tz::America::Toronto).unwrap();
        assert_eq!(parsed, utc("2025-11-01 16:00:00"));
        assert!(parse_datetime_in("2025-11-01 12:00", &Utc).is_err());
    }

    #[test]
    fn test_parse_skipped_local_time() {
        // 02:30 does not exist on the spring-forward day
        assert!(parse_datetime_in("2025-03-09 02:30:00", &chrono_tz::America::Toronto).is_err());
    }
}
