//! Period anchors for every recurrence policy.
//!
//! # Responsibility
//! - Map an instant to the start of the period containing it.
//! - Step from one anchor to the anchor of the preceding period.
//!
//! # Invariants
//! - Anchors are idempotent: `anchor(anchor(t)) == anchor(t)`.
//! - Anchors are monotonic in the instant.
//! - Calendar policies use local midnight in the caller-supplied zone.
//! - Custom cycles are fixed windows counted from the creation day, not
//!   aligned to calendar boundaries.

use crate::model::habit::{Habit, HabitConfigError, Recurrence};
use chrono::{DateTime, Datelike, Days, Months, NaiveDate, TimeDelta, TimeZone, Utc};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::num::NonZeroU32;

/// Milliseconds in one nominal day.
pub const DAY_MS: i64 = 86_400_000;

// Local midnight may be skipped by a DST jump; try this many hours forward.
const MAX_MIDNIGHT_GAP_HOURS: i64 = 3;

pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised by anchor and statistics computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    Configuration(HabitConfigError),
    /// Instant cannot be placed on the calendar or the grid step overflowed.
    TimestampOutOfRange(i64),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(err) => write!(f, "habit configuration error: {err}"),
            Self::TimestampOutOfRange(value) => {
                write!(f, "timestamp out of supported range: {value}")
            }
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Configuration(err) => Some(err),
            Self::TimestampOutOfRange(_) => None,
        }
    }
}

impl From<HabitConfigError> for EngineError {
    fn from(value: HabitConfigError) -> Self {
        Self::Configuration(value)
    }
}

/// Anchor grid of one recurrence policy in one time zone.
///
/// Build once per habit evaluation and query per instant; custom cycles
/// resolve their origin day only once here.
#[derive(Debug, Clone)]
pub struct PeriodGrid<'tz, Tz: TimeZone> {
    recurrence: Recurrence,
    /// Local midnight of the creation day. Set only for custom cycles.
    cycle_origin: Option<i64>,
    tz: &'tz Tz,
}

impl<'tz, Tz: TimeZone> PeriodGrid<'tz, Tz> {
    /// Creates a grid for `recurrence`.
    ///
    /// # Errors
    /// - `MissingCreatedAt` when `recurrence` is custom and `created_at` is `None`.
    /// - `TimestampOutOfRange` when `created_at` cannot be placed on the calendar.
    pub fn new(recurrence: Recurrence, created_at: Option<i64>, tz: &'tz Tz) -> EngineResult<Self> {
        let cycle_origin = match recurrence {
            Recurrence::Custom { .. } => {
                let created_at = created_at.ok_or(HabitConfigError::MissingCreatedAt)?;
                Some(start_of_local_day(created_at, tz)?)
            }
            Recurrence::Daily | Recurrence::Weekly | Recurrence::Monthly => None,
        };

        Ok(Self {
            recurrence,
            cycle_origin,
            tz,
        })
    }

    /// Creates the grid a habit's logs are bucketed on.
    pub fn for_habit(habit: &Habit, tz: &'tz Tz) -> EngineResult<Self> {
        Self::new(habit.recurrence, Some(habit.created_at), tz)
    }

    pub fn recurrence(&self) -> Recurrence {
        self.recurrence
    }

    /// Returns the anchor of the period containing `instant`.
    pub fn anchor(&self, instant: i64) -> EngineResult<i64> {
        match self.recurrence {
            Recurrence::Daily => start_of_local_day(instant, self.tz),
            Recurrence::Weekly => {
                let date = local_date(instant, self.tz)?;
                let back = u64::from(date.weekday().num_days_from_monday());
                let monday = date
                    .checked_sub_days(Days::new(back))
                    .ok_or(EngineError::TimestampOutOfRange(instant))?;
                local_midnight(monday, self.tz, instant)
            }
            Recurrence::Monthly => {
                let first = first_of_month(local_date(instant, self.tz)?);
                local_midnight(first, self.tz, instant)
            }
            Recurrence::Custom { interval_days } => {
                let origin = self
                    .cycle_origin
                    .ok_or(HabitConfigError::MissingCreatedAt)?;
                cycle_anchor(instant, origin, interval_days)
            }
        }
    }

    /// Returns the anchor of the period immediately before `anchor`.
    ///
    /// `anchor` must already lie on this grid.
    pub fn previous(&self, anchor: i64) -> EngineResult<i64> {
        previous_anchor(anchor, self.recurrence, self.tz)
    }
}

/// Maps `instant` to the start of its period under `recurrence`.
///
/// `created_at` is only read for custom cycles, where it is required.
pub fn period_anchor<Tz: TimeZone>(
    instant: i64,
    recurrence: Recurrence,
    created_at: Option<i64>,
    tz: &Tz,
) -> EngineResult<i64> {
    PeriodGrid::new(recurrence, created_at, tz)?.anchor(instant)
}

/// Returns the anchor of the period preceding `anchor`.
///
/// Daily and weekly steps move by calendar days rather than subtracting a
/// fixed `DAY_MS` (or `7 * DAY_MS`). The two agree except across a
/// UTC-offset change, where the fixed step would land off the local-midnight
/// grid and split one day between two buckets. Custom cycles step by exactly
/// `interval * DAY_MS`.
pub fn previous_anchor<Tz: TimeZone>(
    anchor: i64,
    recurrence: Recurrence,
    tz: &Tz,
) -> EngineResult<i64> {
    let out_of_range = EngineError::TimestampOutOfRange(anchor);
    match recurrence {
        Recurrence::Daily => {
            let day = local_date(anchor, tz)?.pred_opt().ok_or(out_of_range)?;
            local_midnight(day, tz, anchor)
        }
        Recurrence::Weekly => {
            let day = local_date(anchor, tz)?
                .checked_sub_days(Days::new(7))
                .ok_or(out_of_range)?;
            local_midnight(day, tz, anchor)
        }
        Recurrence::Monthly => {
            let day = first_of_month(local_date(anchor, tz)?)
                .checked_sub_months(Months::new(1))
                .ok_or(out_of_range)?;
            local_midnight(day, tz, anchor)
        }
        Recurrence::Custom { interval_days } => anchor
            .checked_sub(interval_ms(interval_days))
            .ok_or(out_of_range),
    }
}

fn interval_ms(interval_days: NonZeroU32) -> i64 {
    i64::from(interval_days.get()) * DAY_MS
}

fn cycle_anchor(instant: i64, origin: i64, interval_days: NonZeroU32) -> EngineResult<i64> {
    let step = interval_ms(interval_days);
    let offset = instant
        .checked_sub(origin)
        .ok_or(EngineError::TimestampOutOfRange(instant))?;
    // Floor division: instants before the origin land in negative cycles.
    let index = offset.div_euclid(step);
    index
        .checked_mul(step)
        .and_then(|delta| origin.checked_add(delta))
        .ok_or(EngineError::TimestampOutOfRange(instant))
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn local_date<Tz: TimeZone>(instant: i64, tz: &Tz) -> EngineResult<NaiveDate> {
    DateTime::<Utc>::from_timestamp_millis(instant)
        .map(|utc| utc.with_timezone(tz).date_naive())
        .ok_or(EngineError::TimestampOutOfRange(instant))
}

fn start_of_local_day<Tz: TimeZone>(instant: i64, tz: &Tz) -> EngineResult<i64> {
    local_midnight(local_date(instant, tz)?, tz, instant)
}

/// Earliest instant of `date` in `tz`.
///
/// Ambiguous midnights resolve to the earlier instant; a skipped midnight
/// resolves to the first whole hour that exists.
fn local_midnight<Tz: TimeZone>(date: NaiveDate, tz: &Tz, source: i64) -> EngineResult<i64> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or(EngineError::TimestampOutOfRange(source))?;
    (0..=MAX_MIDNIGHT_GAP_HOURS)
        .find_map(|hours| {
            let candidate = midnight.checked_add_signed(TimeDelta::hours(hours))?;
            tz.from_local_datetime(&candidate).earliest()
        })
        .map(|local| local.timestamp_millis())
        .ok_or(EngineError::TimestampOutOfRange(source))
}
