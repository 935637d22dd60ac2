use chrono::{FixedOffset, TimeZone, Utc};
use chrono_tz::America::{New_York, Sao_Paulo};
use tally_core::{
    period_anchor, previous_anchor, EngineError, HabitConfigError, PeriodGrid, Recurrence, DAY_MS,
};

fn east8() -> FixedOffset {
    FixedOffset::east_opt(8 * 3600).unwrap()
}

fn at<Tz: TimeZone>(tz: &Tz, y: i32, m: u32, d: u32, h: u32, mi: u32) -> i64 {
    tz.with_ymd_and_hms(y, m, d, h, mi, 0)
        .single()
        .unwrap()
        .timestamp_millis()
}

fn all_policies() -> Vec<Recurrence> {
    vec![
        Recurrence::Daily,
        Recurrence::Weekly,
        Recurrence::Monthly,
        Recurrence::custom(1).unwrap(),
        Recurrence::custom(3).unwrap(),
        Recurrence::custom(10).unwrap(),
    ]
}

#[test]
fn daily_anchor_is_local_midnight_for_any_time_of_day() {
    let tz = east8();
    let midnight = at(&tz, 2024, 5, 15, 0, 0);
    for (h, mi) in [(0, 0), (0, 1), (8, 30), (12, 0), (23, 59)] {
        let instant = at(&tz, 2024, 5, 15, h, mi);
        assert_eq!(
            period_anchor(instant, Recurrence::Daily, None, &tz).unwrap(),
            midnight,
            "time {h:02}:{mi:02}"
        );
    }
}

#[test]
fn daily_anchor_follows_local_zone_not_utc() {
    let tz = east8();
    // 2024-05-15 01:00 in UTC+8 is still 2024-05-14 in UTC.
    let instant = at(&tz, 2024, 5, 15, 1, 0);
    assert_eq!(
        period_anchor(instant, Recurrence::Daily, None, &tz).unwrap(),
        at(&tz, 2024, 5, 15, 0, 0)
    );
    assert_eq!(
        period_anchor(instant, Recurrence::Daily, None, &Utc).unwrap(),
        at(&Utc, 2024, 5, 14, 0, 0)
    );
}

#[test]
fn weekly_anchor_starts_on_monday() {
    let tz = east8();
    let monday = at(&tz, 2024, 5, 13, 0, 0);

    let wednesday = at(&tz, 2024, 5, 15, 18, 45);
    assert_eq!(
        period_anchor(wednesday, Recurrence::Weekly, None, &tz).unwrap(),
        wednesday - 2 * DAY_MS - (18 * 60 + 45) * 60_000
    );
    assert_eq!(
        period_anchor(wednesday, Recurrence::Weekly, None, &tz).unwrap(),
        monday
    );

    let sunday = at(&tz, 2024, 5, 19, 23, 0);
    assert_eq!(
        period_anchor(sunday, Recurrence::Weekly, None, &tz).unwrap(),
        monday,
        "sunday maps back six days, not forward"
    );

    let monday_morning = at(&tz, 2024, 5, 13, 7, 0);
    assert_eq!(
        period_anchor(monday_morning, Recurrence::Weekly, None, &tz).unwrap(),
        monday
    );
}

#[test]
fn monthly_anchor_is_first_of_month() {
    let tz = east8();
    let instant = at(&tz, 2024, 2, 29, 22, 10);
    assert_eq!(
        period_anchor(instant, Recurrence::Monthly, None, &tz).unwrap(),
        at(&tz, 2024, 2, 1, 0, 0)
    );
}

#[test]
fn monthly_previous_rolls_back_over_year_boundary() {
    let tz = east8();
    let january = at(&tz, 2024, 1, 1, 0, 0);
    assert_eq!(
        previous_anchor(january, Recurrence::Monthly, &tz).unwrap(),
        at(&tz, 2023, 12, 1, 0, 0)
    );

    let march = at(&tz, 2024, 3, 1, 0, 0);
    assert_eq!(
        previous_anchor(march, Recurrence::Monthly, &tz).unwrap(),
        at(&tz, 2024, 2, 1, 0, 0)
    );
}

#[test]
fn previous_anchor_steps_by_fixed_days_without_offset_changes() {
    let tz = east8();
    let anchor = at(&tz, 2024, 5, 13, 0, 0);
    assert_eq!(
        previous_anchor(anchor, Recurrence::Daily, &tz).unwrap(),
        anchor - DAY_MS
    );
    assert_eq!(
        previous_anchor(anchor, Recurrence::Weekly, &tz).unwrap(),
        anchor - 7 * DAY_MS
    );
    assert_eq!(
        previous_anchor(anchor, Recurrence::custom(4).unwrap(), &tz).unwrap(),
        anchor - 4 * DAY_MS
    );
}

#[test]
fn custom_cycles_align_to_creation_day() {
    let tz = east8();
    let created_at = at(&tz, 2024, 5, 10, 15, 30);
    let day0 = at(&tz, 2024, 5, 10, 0, 0);
    let recurrence = Recurrence::custom(3).unwrap();
    let grid = PeriodGrid::new(recurrence, Some(created_at), &tz).unwrap();

    for day in 0..3 {
        let instant = day0 + day * DAY_MS + 9 * 3_600_000;
        assert_eq!(grid.anchor(instant).unwrap(), day0, "day {day}");
    }
    for day in 3..6 {
        let instant = day0 + day * DAY_MS + 20 * 3_600_000;
        assert_eq!(grid.anchor(instant).unwrap(), day0 + 3 * DAY_MS, "day {day}");
    }
}

#[test]
fn custom_cycles_of_different_habits_are_not_aligned() {
    let tz = east8();
    let recurrence = Recurrence::custom(3).unwrap();
    let instant = at(&tz, 2024, 5, 20, 12, 0);

    let first = period_anchor(instant, recurrence, Some(at(&tz, 2024, 5, 10, 9, 0)), &tz).unwrap();
    let second = period_anchor(instant, recurrence, Some(at(&tz, 2024, 5, 11, 9, 0)), &tz).unwrap();

    assert_eq!(first, at(&tz, 2024, 5, 19, 0, 0));
    assert_eq!(second, at(&tz, 2024, 5, 20, 0, 0));
}

#[test]
fn custom_instant_before_creation_gets_earlier_anchor() {
    let tz = east8();
    let created_at = at(&tz, 2024, 5, 10, 15, 30);
    let instant = at(&tz, 2024, 5, 9, 23, 0);
    assert_eq!(
        period_anchor(instant, Recurrence::custom(3).unwrap(), Some(created_at), &tz).unwrap(),
        at(&tz, 2024, 5, 7, 0, 0)
    );
}

#[test]
fn custom_without_created_at_is_a_configuration_error() {
    let err = period_anchor(0, Recurrence::custom(2).unwrap(), None, &Utc).unwrap_err();
    assert_eq!(
        err,
        EngineError::Configuration(HabitConfigError::MissingCreatedAt)
    );
}

#[test]
fn calendar_policies_do_not_need_created_at() {
    for recurrence in [Recurrence::Daily, Recurrence::Weekly, Recurrence::Monthly] {
        assert!(period_anchor(1_700_000_000_000, recurrence, None, &Utc).is_ok());
    }
}

#[test]
fn unknown_period_never_falls_back_to_daily() {
    let err = Recurrence::from_parts("yearly", None).unwrap_err();
    assert_eq!(err, HabitConfigError::UnknownPeriod("yearly".to_string()));

    let err = Recurrence::from_parts("custom", None).unwrap_err();
    assert_eq!(err, HabitConfigError::MissingCustomInterval);

    let err = Recurrence::from_parts("custom", Some(0)).unwrap_err();
    assert_eq!(err, HabitConfigError::InvalidCustomInterval(0));
}

#[test]
fn anchor_is_idempotent_and_monotonic() {
    let tz = east8();
    let created_at = at(&tz, 2023, 12, 30, 21, 0);
    let start = at(&tz, 2023, 12, 25, 0, 0);
    // Sweep ~80 days in uneven 7h13m steps.
    let step = (7 * 60 + 13) * 60_000;
    let instants: Vec<i64> = (0..270).map(|i| start + i * step).collect();

    for recurrence in all_policies() {
        let grid = PeriodGrid::new(recurrence, Some(created_at), &tz).unwrap();
        let mut last = i64::MIN;
        for &instant in &instants {
            let anchor = grid.anchor(instant).unwrap();
            assert!(anchor <= instant, "{recurrence}: anchor after instant");
            assert_eq!(grid.anchor(anchor).unwrap(), anchor, "{recurrence}: not idempotent");
            assert!(anchor >= last, "{recurrence}: not monotonic");
            last = anchor;
        }
    }
}

#[test]
fn previous_of_anchor_is_on_grid_and_adjacent() {
    let tz = east8();
    let created_at = at(&tz, 2024, 2, 27, 6, 0);
    let instant = at(&tz, 2024, 3, 10, 13, 0);

    for recurrence in all_policies() {
        let grid = PeriodGrid::new(recurrence, Some(created_at), &tz).unwrap();
        let anchor = grid.anchor(instant).unwrap();
        let previous = grid.previous(anchor).unwrap();
        assert!(previous < anchor, "{recurrence}");
        assert_eq!(grid.anchor(previous).unwrap(), previous, "{recurrence}");
        assert_eq!(grid.anchor(anchor - 1).unwrap(), previous, "{recurrence}");
    }
}

#[test]
fn out_of_range_instant_is_reported() {
    let err = period_anchor(i64::MAX, Recurrence::Daily, None, &Utc).unwrap_err();
    assert_eq!(err, EngineError::TimestampOutOfRange(i64::MAX));
}

#[test]
fn skipped_midnight_anchors_at_first_existing_hour() {
    // Sao Paulo jumped from 00:00 -03 to 01:00 -02 on 2018-11-04.
    let tz = Sao_Paulo;
    let first_hour = 1_541_300_400_000;
    assert_eq!(at(&tz, 2018, 11, 4, 1, 0), first_hour);

    let late_morning = at(&tz, 2018, 11, 4, 10, 0);
    let anchor = period_anchor(late_morning, Recurrence::Daily, None, &tz).unwrap();
    assert_eq!(anchor, first_hour);
    assert_eq!(period_anchor(anchor, Recurrence::Daily, None, &tz).unwrap(), anchor);

    // Both neighbours step onto and off the shortened day.
    let next_day = at(&tz, 2018, 11, 5, 0, 0);
    assert_eq!(previous_anchor(next_day, Recurrence::Daily, &tz).unwrap(), anchor);
    assert_eq!(
        previous_anchor(anchor, Recurrence::Daily, &tz).unwrap(),
        at(&tz, 2018, 11, 3, 0, 0)
    );
}

#[test]
fn previous_anchor_stays_on_local_midnight_across_offset_change() {
    // New York moved from -05 to -04 on 2024-03-10.
    let tz = New_York;
    let after = at(&tz, 2024, 3, 11, 0, 0);
    let daily = previous_anchor(after, Recurrence::Daily, &tz).unwrap();
    assert_eq!(daily, at(&tz, 2024, 3, 10, 0, 0));
    assert_eq!(after - daily, DAY_MS - 3_600_000);

    let weekly = previous_anchor(after, Recurrence::Weekly, &tz).unwrap();
    assert_eq!(weekly, at(&tz, 2024, 3, 4, 0, 0));
    assert_eq!(
        period_anchor(at(&tz, 2024, 3, 17, 23, 0), Recurrence::Weekly, None, &tz).unwrap(),
        after
    );
}
