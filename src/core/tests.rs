use super::*;
use crate::common::constants::test_constants::*;
use crate::config::{create_default_config, update_coordinates};
use crate::prayer::{AsrMadhab, CalculationMethod, GeoCoordinate, calculate};
use crate::shield::MockShield;
use chrono::Duration as ChronoDuration;
use tempfile::{TempDir, tempdir};

fn makkah_set() -> DailyPrayerSet {
    calculate(
        GeoCoordinate::new(MAKKAH_LAT, MAKKAH_LON),
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        chrono_tz::Asia::Riyadh,
        CalculationMethod::UmmAlQura,
        AsrMadhab::Shafi,
    )
    .unwrap()
}

fn quiet_mock() -> MockShield {
    let mut mock = MockShield::new();
    mock.expect_shield_name().return_const("mock");
    mock
}

/// A core over a fresh default config file in a temp dir.
fn core_with(shield: MockShield) -> (Core, TempDir) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("salahshield.toml");
    create_default_config(&path).unwrap();
    let config = Config::load_from_path(&path).unwrap();

    let core = Core::new(CoreParams {
        config,
        config_path: path,
        shield: Box::new(shield),
        debug_enabled: false,
        lock: None,
    });
    (core, dir)
}

/// A core with a location, zone and user-chosen method already configured.
fn located_core(
    shield: MockShield,
    (lat, lon): (f64, f64),
    zone: &str,
    method: CalculationMethod,
) -> (Core, TempDir) {
    let (mut core, dir) = core_with(shield);
    let path = core.config_path.clone();
    update_coordinates(&path, lat, lon, None).unwrap();
    update_config_value(&path, "timezone", &toml_string(zone)).unwrap();
    update_config_value(&path, "method", &toml_string(method.as_str())).unwrap();
    update_config_value(&path, "method_source", "\"user\"").unwrap();
    core.config = Config::load_from_path(&path).unwrap();
    (core, dir)
}

/// Wait for the worker and hand its result to the core.
fn receive_set(core: &mut Core) {
    let event = core.receiver.recv_timeout(Duration::from_secs(10)).unwrap();
    core.handle_event(event);
}

fn local(tz: chrono_tz::Tz, date: NaiveDate, hour: u32, minute: u32) -> DateTime<Utc> {
    use chrono::TimeZone;
    tz.from_local_datetime(&date.and_hms_opt(hour, minute, 0).unwrap())
        .single()
        .unwrap()
        .with_timezone(&Utc)
}

fn dhuhr_utc(set: &DailyPrayerSet) -> DateTime<Utc> {
    set.get(PrayerKind::Dhuhr).time.with_timezone(&Utc)
}

#[test]
fn test_blocking_follows_published_set() {
    let mut mock = quiet_mock();
    mock.expect_start_blocking()
        .withf(|prayer| *prayer == PrayerKind::Dhuhr)
        .times(1)
        .returning(|_| Ok(()));
    mock.expect_stop_blocking().times(1).returning(|| Ok(()));

    let (mut core, _dir) = core_with(mock);
    let set = makkah_set();
    let dhuhr = dhuhr_utc(&set);
    let window_end = set.get(PrayerKind::Dhuhr).window_end().with_timezone(&Utc);

    core.generation = 1;
    core.handle_event(CoreEvent::PrayerSetReady {
        generation: 1,
        result: Ok(set),
    });
    assert!(core.prayer_set().current().is_some());

    core.update_blocking(dhuhr);
    core.update_blocking(dhuhr + ChronoDuration::minutes(1));
    core.update_blocking(window_end + ChronoDuration::minutes(1));
    assert_eq!(core.controller.active(), None);
}

#[test]
fn test_outdated_generation_is_discarded() {
    let (mut core, _dir) = core_with(quiet_mock());
    core.generation = 2;
    core.calculation_pending = true;

    core.handle_event(CoreEvent::PrayerSetReady {
        generation: 1,
        result: Ok(makkah_set()),
    });

    assert!(core.prayer_set().current().is_none());
    assert!(core.calculation_pending);
}

#[test]
fn test_failed_calculation_clears_the_set() {
    let (mut core, _dir) = core_with(quiet_mock());
    core.generation = 1;
    core.handle_event(CoreEvent::PrayerSetReady {
        generation: 1,
        result: Ok(makkah_set()),
    });

    core.generation = 2;
    core.handle_event(CoreEvent::PrayerSetReady {
        generation: 2,
        result: Err(CalculationError::InvalidCoordinate {
            latitude: 95.0,
            longitude: 0.0,
        }),
    });
    assert!(core.prayer_set().current().is_none());
    assert!(!core.calculation_pending);
}

#[test]
fn test_shutdown_event_stops_loop() {
    let (mut core, _dir) = core_with(quiet_mock());
    let running = core.running();
    core.handle_event(CoreEvent::Shutdown);
    assert!(!running.load(Ordering::SeqCst));
}

#[test]
fn test_paused_never_blocks() {
    let set = makkah_set();
    let dhuhr = dhuhr_utc(&set);
    assert_eq!(blocking_intent(Some(&set), false, &dhuhr), Some(PrayerKind::Dhuhr));
    assert_eq!(blocking_intent(Some(&set), true, &dhuhr), None);
    assert_eq!(blocking_intent(None, false, &dhuhr), None);
}

#[test]
fn test_next_wake_hits_window_boundaries() {
    let set = makkah_set();
    let interval = Duration::from_secs(30);
    let dhuhr = set.get(PrayerKind::Dhuhr);
    let start = dhuhr.window_start().with_timezone(&Utc);
    let end = dhuhr.window_end().with_timezone(&Utc);

    let before = start - ChronoDuration::seconds(10);
    assert_eq!(next_wake(Some(&set), &before, interval), Duration::from_secs(10));

    let inside = end - ChronoDuration::seconds(20);
    assert_eq!(next_wake(Some(&set), &inside, interval), Duration::from_secs(21));

    let far = start - ChronoDuration::hours(2);
    assert_eq!(next_wake(Some(&set), &far, interval), interval);
    assert_eq!(next_wake(None, &far, interval), interval);
}

#[test]
fn test_reload_applies_new_settings() {
    let (mut core, _dir) = core_with(quiet_mock());
    assert!(!core.config.is_paused());

    update_config_value(&core.config_path, "paused", "true").unwrap();
    core.handle_event(CoreEvent::Reload);
    assert!(core.config.is_paused());
}

#[test]
fn test_invalid_reload_keeps_previous_config() {
    let (mut core, _dir) = core_with(quiet_mock());
    update_config_value(&core.config_path, "check_interval", "1").unwrap();
    core.handle_event(CoreEvent::Reload);
    assert_eq!(
        core.config.check_interval(),
        crate::common::constants::DEFAULT_CHECK_INTERVAL
    );
}

#[test]
fn test_auto_method_is_written_once() {
    let (mut core, _dir) = core_with(quiet_mock());
    let path = core.config_path.clone();
    update_coordinates(&path, MAKKAH_LAT, MAKKAH_LON, Some("Makkah")).unwrap();
    update_config_value(&path, "timezone", "\"Asia/Riyadh\"").unwrap();
    core.config = Config::load_from_path(&path).unwrap();

    core.auto_apply_method();

    let saved = Config::load_from_path(&path).unwrap();
    assert_eq!(saved.calculation_method().unwrap(), CalculationMethod::UmmAlQura);
    assert_eq!(saved.method_source().unwrap(), MethodSource::Auto);
    assert_eq!(core.config, saved);
}

#[test]
fn test_user_method_is_not_replaced() {
    let (mut core, _dir) = core_with(quiet_mock());
    let path = core.config_path.clone();
    update_coordinates(&path, MAKKAH_LAT, MAKKAH_LON, None).unwrap();
    update_config_value(&path, "timezone", "\"Asia/Riyadh\"").unwrap();
    update_config_value(&path, "method", "\"isna\"").unwrap();
    update_config_value(&path, "method_source", "\"user\"").unwrap();
    core.config = Config::load_from_path(&path).unwrap();

    core.auto_apply_method();

    let saved = Config::load_from_path(&path).unwrap();
    assert_eq!(saved.calculation_method().unwrap(), CalculationMethod::Isna);
    assert_eq!(saved.method_source().unwrap(), MethodSource::User);
}

#[test]
fn test_rollover_recalculates_for_the_new_date() {
    let (mut core, _dir) = located_core(
        quiet_mock(),
        (MAKKAH_LAT, MAKKAH_LON),
        "Asia/Riyadh",
        CalculationMethod::UmmAlQura,
    );
    let riyadh = chrono_tz::Asia::Riyadh;
    let day = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    let next_day = day.succ_opt().unwrap();

    let noon = local(riyadh, day, 12, 0);
    core.request_calculation(noon);
    receive_set(&mut core);
    assert_eq!(core.generation, 1);
    assert_eq!(core.prayer_set().current().unwrap().date(), day);

    core.check_rollover(noon);
    assert_eq!(core.generation, 1);

    let after_midnight = local(riyadh, next_day, 0, 30);
    core.check_rollover(after_midnight);
    assert_eq!(core.generation, 2);
    assert_eq!(core.requested_date, Some(next_day));

    // Until the new set arrives the old one stays published and blocks nothing
    let outgoing = core.prayer_set().current().unwrap();
    assert_eq!(outgoing.date(), day);
    assert_eq!(blocking_intent(Some(&outgoing), false, &after_midnight), None);
    core.update_blocking(after_midnight);
    assert_eq!(core.controller.active(), None);

    core.check_rollover(after_midnight + ChronoDuration::seconds(5));
    assert_eq!(core.generation, 2);

    receive_set(&mut core);
    assert_eq!(core.prayer_set().current().unwrap().date(), next_day);
}

#[test]
fn test_failed_day_is_not_requested_again() {
    let (mut core, _dir) = located_core(
        quiet_mock(),
        (MAKKAH_LAT, MAKKAH_LON),
        "Asia/Riyadh",
        CalculationMethod::UmmAlQura,
    );
    let riyadh = chrono_tz::Asia::Riyadh;
    let day = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    let next_day = day.succ_opt().unwrap();

    core.request_calculation(local(riyadh, day, 12, 0));
    receive_set(&mut core);

    let after_midnight = local(riyadh, next_day, 0, 30);
    core.check_rollover(after_midnight);
    assert_eq!(core.generation, 2);
    core.handle_event(CoreEvent::PrayerSetReady {
        generation: 2,
        result: Err(CalculationError::InvalidSolarGeometry {
            kind: PrayerKind::Isha,
            latitude: MAKKAH_LAT,
            date: next_day,
        }),
    });
    assert!(core.prayer_set().current().is_none());

    let interval = ChronoDuration::seconds(core.config.rollover_interval() as i64);
    core.check_rollover(after_midnight + interval * 3);
    assert_eq!(core.generation, 2);
}

#[test]
fn test_rollover_waits_for_isha_after_midnight() {
    let mut mock = quiet_mock();
    mock.expect_start_blocking()
        .withf(|prayer| *prayer == PrayerKind::Isha)
        .times(1)
        .returning(|_| Ok(()));
    mock.expect_stop_blocking().times(1).returning(|| Ok(()));

    let (mut core, _dir) = located_core(
        mock,
        (LONDON_LAT, LONDON_LON),
        "Europe/London",
        CalculationMethod::Isna,
    );
    let day = NaiveDate::from_ymd_opt(2025, 6, 21).unwrap();
    core.request_calculation(local(chrono_tz::Europe::London, day, 20, 0));
    receive_set(&mut core);

    let isha = core.prayer_set().current().unwrap().get(PrayerKind::Isha).clone();
    let isha_time = isha.time.with_timezone(&Utc);
    assert!(isha.time.date_naive() > day);

    // Past midnight, but Isha still belongs to the published set
    core.check_rollover(isha_time);
    assert_eq!(core.generation, 1);
    core.update_blocking(isha_time);
    assert_eq!(core.controller.active(), Some(PrayerKind::Isha));

    let interval = ChronoDuration::seconds(core.config.rollover_interval() as i64);
    let closed = isha.window_end().with_timezone(&Utc) + interval + ChronoDuration::seconds(1);
    core.check_rollover(closed);
    assert_eq!(core.generation, 2);
    assert_eq!(core.requested_date, day.succ_opt());
    core.update_blocking(closed);
    assert_eq!(core.controller.active(), None);
}
