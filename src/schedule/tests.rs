use super::*;
use crate::common::constants::test_constants::*;
use crate::prayer::{
    AsrMadhab, CalculationMethod, GeoCoordinate, PrayerSettings, PrayerSettingsTable, calculate,
};
use chrono::{NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

fn at(tz: Tz, date: NaiveDate, hour: u32, minute: u32) -> DateTime<Tz> {
    tz.from_local_datetime(&date.and_hms_opt(hour, minute, 0).unwrap())
        .single()
        .unwrap()
}

fn june_first() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}

/// Hand-built day in UTC: 04:00, 12:00, 15:30, 19:00, 20:30.
fn synthetic_set() -> DailyPrayerSet {
    let tz = chrono_tz::UTC;
    let date = june_first();
    let times = [(4, 0), (12, 0), (15, 30), (19, 0), (20, 30)];
    let instants = std::array::from_fn(|i| {
        let (h, m) = times[i];
        PrayerInstant::new(PrayerKind::ALL[i], at(tz, date, h, m))
    });
    DailyPrayerSet::new(
        date,
        tz,
        GeoCoordinate::new(0.0, 0.0),
        CalculationMethod::MuslimWorldLeague,
        AsrMadhab::Shafi,
        instants,
    )
}

fn with_asr(settings: PrayerSettings) -> DailyPrayerSet {
    let mut table = PrayerSettingsTable::default();
    table.set(PrayerKind::Asr, settings);
    synthetic_set().with_settings(&table)
}

#[test]
fn test_window_edges_are_inclusive() {
    let set = synthetic_set();
    let asr = set.get(PrayerKind::Asr).clone();

    assert!(should_block(&set, &asr.window_start()));
    assert!(should_block(&set, &asr.window_end()));
    assert!(!should_block(&set, &(asr.window_start() - Duration::minutes(1))));
    assert!(!should_block(&set, &(asr.window_end() + Duration::minutes(1))));
}

#[test]
fn test_disabled_prayer_never_blocks() {
    let set = with_asr(PrayerSettings {
        buffer_before: 5,
        buffer_after: 15,
        enabled: false,
    });
    let asr = set.get(PrayerKind::Asr);
    assert!(!should_block(&set, &asr.time));
    assert!(!should_block(&set, &asr.window_start()));
    assert_eq!(state(&set, &asr.time), ScheduleState::BetweenWindows);
}

#[test]
fn test_zero_buffers_block_only_at_exact_instant() {
    let set = with_asr(PrayerSettings {
        buffer_before: 0,
        buffer_after: 0,
        enabled: true,
    });
    let asr_time = set.get(PrayerKind::Asr).time;
    assert!(should_block(&set, &asr_time));
    assert!(!should_block(&set, &(asr_time - Duration::seconds(1))));
    assert!(!should_block(&set, &(asr_time + Duration::seconds(1))));
}

#[test]
fn test_should_block_accepts_other_zones() {
    let set = synthetic_set();
    // 12:00 UTC is 08:00 in Toronto during summer time
    let toronto_noon_utc = at(chrono_tz::America::Toronto, june_first(), 8, 0);
    assert!(should_block(&set, &toronto_noon_utc));
    assert!(should_block(&set, &Utc.with_ymd_and_hms(2025, 6, 1, 12, 10, 0).unwrap()));
}

#[test]
fn test_state_progression() {
    let set = synthetic_set();
    let date = june_first();
    let tz = chrono_tz::UTC;

    assert_eq!(state(&set, &at(tz, date, 1, 0)), ScheduleState::BeforeAnyWindow);
    assert_eq!(
        state(&set, &at(tz, date, 4, 10)),
        ScheduleState::InsideWindow(PrayerKind::Fajr)
    );
    assert_eq!(state(&set, &at(tz, date, 9, 0)), ScheduleState::BetweenWindows);
    assert_eq!(state(&set, &at(tz, date, 23, 0)), ScheduleState::AllPrayersPassed);
    assert_eq!(
        state(&set, &at(tz, date.succ_opt().unwrap(), 0, 30)),
        ScheduleState::Stale
    );
}

#[test]
fn test_stale_set_fails_open() {
    let set = synthetic_set();
    let next_day_fajr = at(chrono_tz::UTC, june_first().succ_opt().unwrap(), 4, 0);

    assert!(is_stale(&set, &next_day_fajr));
    assert!(!should_block(&set, &next_day_fajr));
    assert!(next_prayer_today(&set, &next_day_fajr).is_none());

    let mut scheduler = PrayerWindowScheduler::default();
    assert!(scheduler.next_prayer(&set, &next_day_fajr).is_none());
}

#[test]
fn test_staleness_uses_the_sets_zone() {
    let set = synthetic_set();
    // 23:30 in Toronto is already the next day in UTC
    let late_evening = at(chrono_tz::America::Toronto, june_first(), 23, 30);
    assert!(is_stale(&set, &late_evening));
}

#[test]
fn test_remaining_time_helpers() {
    let set = synthetic_set();
    let date = june_first();
    let tz = chrono_tz::UTC;

    assert_eq!(
        time_until_window_end(&set, &at(tz, date, 12, 5)),
        Some(Duration::minutes(10))
    );
    assert_eq!(time_until_window_end(&set, &at(tz, date, 13, 0)), None);
    assert_eq!(
        time_until_next_window(&set, &at(tz, date, 13, 0)),
        Some((PrayerKind::Asr, Duration::minutes(145)))
    );
    assert_eq!(time_until_next_window(&set, &at(tz, date, 22, 0)), None);
}

#[test]
fn test_next_prayer_within_day() {
    let set = synthetic_set();
    let next = next_prayer_today(&set, &at(chrono_tz::UTC, june_first(), 12, 0)).unwrap();
    // Strictly after now: Dhuhr at exactly 12:00 is not "next"
    assert_eq!(next.kind, PrayerKind::Asr);
}

#[test]
fn test_next_prayer_rolls_over_to_tomorrow_fajr() {
    let request = CalculationRequest {
        coordinate: GeoCoordinate::new(OTTAWA_LAT, OTTAWA_LON),
        timezone: chrono_tz::America::Toronto,
        method: CalculationMethod::Isna,
        madhab: AsrMadhab::Shafi,
        settings: PrayerSettingsTable::default(),
    };
    let date = NaiveDate::from_ymd_opt(2025, 11, 1).unwrap();
    let today = request.calculate_for(date).unwrap();
    let after_isha = today.get(PrayerKind::Isha).time + Duration::minutes(30);

    let mut scheduler = PrayerWindowScheduler::new(request.clone());
    let next = scheduler.next_prayer(&today, &after_isha).unwrap();

    let expected = calculate(
        request.coordinate,
        date.succ_opt().unwrap(),
        request.timezone,
        request.method,
        request.madhab,
    )
    .unwrap();
    assert_eq!(next.kind, PrayerKind::Fajr);
    assert_eq!(next.time, expected.get(PrayerKind::Fajr).time);
    assert!(next.time > after_isha);
}

#[test]
fn test_tomorrow_cache_invalidated_by_new_request() {
    let mut request = CalculationRequest {
        coordinate: GeoCoordinate::new(LONDON_LAT, LONDON_LON),
        timezone: chrono_tz::Europe::London,
        method: CalculationMethod::MuslimWorldLeague,
        madhab: AsrMadhab::Shafi,
        settings: PrayerSettingsTable::default(),
    };
    let today = request.calculate_for(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()).unwrap();

    let mut scheduler = PrayerWindowScheduler::new(request.clone());
    let first = scheduler.tomorrow_of(&today).unwrap();

    request.method = CalculationMethod::Egyptian;
    scheduler.set_request(request);
    let second = scheduler.tomorrow_of(&today).unwrap();

    assert!(second.get(PrayerKind::Fajr).time < first.get(PrayerKind::Fajr).time);
}

#[test]
fn test_scheduler_without_request() {
    let set = synthetic_set();
    let mut scheduler = PrayerWindowScheduler::default();
    assert_eq!(scheduler.tomorrow_of(&set).unwrap_err(), TomorrowError::NoRequest);
    assert!(
        scheduler
            .next_prayer(&set, &at(chrono_tz::UTC, june_first(), 23, 0))
            .is_none()
    );
}

#[test]
fn test_isha_after_midnight_still_blocks() {
    // Midsummer in London: ISNA's Isha lands after local midnight
    let set = calculate(
        GeoCoordinate::new(LONDON_LAT, LONDON_LON),
        NaiveDate::from_ymd_opt(2025, 6, 21).unwrap(),
        chrono_tz::Europe::London,
        CalculationMethod::Isna,
        AsrMadhab::Shafi,
    )
    .unwrap();
    let isha = set.get(PrayerKind::Isha).clone();
    assert!(isha.time.date_naive() > set.date());

    assert!(!is_stale(&set, &isha.time));
    assert!(should_block(&set, &isha.time));
    assert!(should_block(&set, &isha.window_end()));
    assert_eq!(state(&set, &isha.time), ScheduleState::InsideWindow(PrayerKind::Isha));

    let after = isha.window_end() + Duration::seconds(1);
    assert!(is_stale(&set, &after));
    assert!(!should_block(&set, &after));
}
