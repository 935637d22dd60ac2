//! Habit domain model.
//!
//! # Responsibility
//! - Define the canonical habit record read by the progress engine.
//! - Own the closed recurrence policy and its configuration errors.
//! - Map the app backup JSON shape onto validated domain values.
//!
//! # Invariants
//! - `id` is stable and never blank.
//! - `name` is never blank.
//! - `target_count >= 1`.
//! - `Recurrence::Custom` always carries an interval of at least one day.
//! - `logs` keeps append order; it is not guaranteed to be sorted.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::num::NonZeroU32;
use uuid::Uuid;

/// Stable identifier for one habit.
///
/// Opaque on the wire: restored records keep whatever non-blank string they
/// were exported with. New habits get a UUID v4.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HabitId(String);

impl HabitId {
    /// Generates a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<String> for HabitId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for HabitId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Display for HabitId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire value for daily recurrence.
pub const PERIOD_DAILY: &str = "daily";
/// Wire value for weekly (Monday-start) recurrence.
pub const PERIOD_WEEKLY: &str = "weekly";
/// Wire value for calendar-month recurrence.
pub const PERIOD_MONTHLY: &str = "monthly";
/// Wire value for fixed N-day cycles anchored at creation.
pub const PERIOD_CUSTOM: &str = "custom";

/// Recurrence policy deciding how log instants are bucketed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recurrence {
    /// One period per local calendar day.
    Daily,
    /// One period per ISO week, starting Monday 00:00 local time.
    Weekly,
    /// One period per calendar month.
    Monthly,
    /// Fixed-length windows counted from the creation day.
    Custom { interval_days: NonZeroU32 },
}

impl Recurrence {
    /// Builds a custom recurrence, rejecting non-positive intervals.
    pub fn custom(interval_days: i64) -> Result<Self, HabitConfigError> {
        u32::try_from(interval_days)
            .ok()
            .and_then(NonZeroU32::new)
            .map(|interval_days| Self::Custom { interval_days })
            .ok_or(HabitConfigError::InvalidCustomInterval(interval_days))
    }

    /// Parses the `period` / `customInterval` pair used by stored records.
    ///
    /// `custom_interval` is ignored unless `period == "custom"`.
    pub fn from_parts(period: &str, custom_interval: Option<i64>) -> Result<Self, HabitConfigError> {
        match period {
            PERIOD_DAILY => Ok(Self::Daily),
            PERIOD_WEEKLY => Ok(Self::Weekly),
            PERIOD_MONTHLY => Ok(Self::Monthly),
            PERIOD_CUSTOM => {
                let interval = custom_interval.ok_or(HabitConfigError::MissingCustomInterval)?;
                Self::custom(interval)
            }
            other => Err(HabitConfigError::UnknownPeriod(other.to_string())),
        }
    }

    /// Stable wire value for the `period` field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => PERIOD_DAILY,
            Self::Weekly => PERIOD_WEEKLY,
            Self::Monthly => PERIOD_MONTHLY,
            Self::Custom { .. } => PERIOD_CUSTOM,
        }
    }

    /// Interval in days for custom cycles, `None` for calendar policies.
    pub fn custom_interval(self) -> Option<u32> {
        match self {
            Self::Custom { interval_days } => Some(interval_days.get()),
            _ => None,
        }
    }
}

impl Display for Recurrence {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Custom { interval_days } => write!(f, "custom/{interval_days}d"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Configuration errors for habit records.
///
/// None of these are recoverable inside core; they mean the record was
/// built or restored without the creation-side validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HabitConfigError {
    UnknownPeriod(String),
    MissingCustomInterval,
    InvalidCustomInterval(i64),
    MissingCreatedAt,
    InvalidTargetCount(i64),
    EmptyId,
    EmptyName,
}

impl Display for HabitConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownPeriod(value) => write!(
                f,
                "unknown habit period `{value}`; expected daily|weekly|monthly|custom"
            ),
            Self::MissingCustomInterval => {
                write!(f, "custom period requires customInterval")
            }
            Self::InvalidCustomInterval(value) => {
                write!(f, "customInterval ({value}) must be >= 1")
            }
            Self::MissingCreatedAt => write!(f, "habit requires createdAt"),
            Self::InvalidTargetCount(value) => write!(f, "targetCount ({value}) must be >= 1"),
            Self::EmptyId => write!(f, "habit id must not be empty"),
            Self::EmptyName => write!(f, "habit name must not be empty"),
        }
    }
}

impl Error for HabitConfigError {}

/// Canonical habit record.
///
/// Serialized in the camelCase backup shape through [`HabitRecord`], so
/// decoding an invalid record fails instead of producing a `Habit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "HabitRecord", into = "HabitRecord")]
pub struct Habit {
    pub id: HabitId,
    pub name: String,
    pub icon: String,
    pub color: String,
    /// Log entries required within one period for it to count as successful.
    pub target_count: u32,
    pub recurrence: Recurrence,
    /// When false, the service rejects logging once target is reached.
    pub allow_exceed: bool,
    /// Unix epoch milliseconds, append order.
    pub logs: Vec<i64>,
    /// Unix epoch milliseconds. Origin for custom cycles.
    pub created_at: i64,
    /// Soft delete flag; ignored by the engine.
    pub archived: bool,
}

impl Habit {
    /// Creates a habit with a generated id and no logs.
    pub fn new(
        name: impl Into<String>,
        target_count: u32,
        recurrence: Recurrence,
        created_at: i64,
    ) -> Self {
        Self {
            id: HabitId::generate(),
            name: name.into(),
            icon: String::new(),
            color: String::new(),
            target_count,
            recurrence,
            allow_exceed: false,
            logs: Vec::new(),
            created_at,
            archived: false,
        }
    }

    /// Validates invariants the type system does not already guarantee.
    pub fn validate(&self) -> Result<(), HabitConfigError> {
        if self.id.is_blank() {
            return Err(HabitConfigError::EmptyId);
        }
        if self.name.trim().is_empty() {
            return Err(HabitConfigError::EmptyName);
        }
        if self.target_count == 0 {
            return Err(HabitConfigError::InvalidTargetCount(0));
        }
        Ok(())
    }

    /// Returns whether the habit takes part in active computation.
    pub fn is_active(&self) -> bool {
        !self.archived
    }
}

/// Backup/restore wire shape for [`Habit`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitRecord {
    pub id: HabitId,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: String,
    pub target_count: i64,
    pub period: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_interval: Option<i64>,
    #[serde(default)]
    pub allow_exceed: bool,
    #[serde(default)]
    pub logs: Vec<i64>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub archived: bool,
}

impl TryFrom<HabitRecord> for Habit {
    type Error = HabitConfigError;

    fn try_from(record: HabitRecord) -> Result<Self, Self::Error> {
        let recurrence = Recurrence::from_parts(record.period.as_str(), record.custom_interval)?;
        let target_count = u32::try_from(record.target_count)
            .ok()
            .filter(|count| *count >= 1)
            .ok_or(HabitConfigError::InvalidTargetCount(record.target_count))?;
        let created_at = record.created_at.ok_or(HabitConfigError::MissingCreatedAt)?;

        let habit = Self {
            id: record.id,
            name: record.name,
            icon: record.icon,
            color: record.color,
            target_count,
            recurrence,
            allow_exceed: record.allow_exceed,
            logs: record.logs,
            created_at,
            archived: record.archived,
        };
        habit.validate()?;
        Ok(habit)
    }
}

impl From<Habit> for HabitRecord {
    fn from(habit: Habit) -> Self {
        Self {
            id: habit.id,
            name: habit.name,
            icon: habit.icon,
            color: habit.color,
            target_count: i64::from(habit.target_count),
            period: habit.recurrence.as_str().to_string(),
            custom_interval: habit.recurrence.custom_interval().map(i64::from),
            allow_exceed: habit.allow_exceed,
            logs: habit.logs,
            created_at: Some(habit.created_at),
            archived: habit.archived,
        }
    }
}
