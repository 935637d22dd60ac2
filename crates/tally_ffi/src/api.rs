//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level habit functions to Dart via FRB.
//! - Resolve the evaluation time zone for core computations.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Failures are returned as envelopes with `ok=false` and a message.
//! - `now` is always supplied by the caller; nothing here reads the clock.

use chrono::{FixedOffset, Local};
use log::warn;
use tally_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, period_anchor,
    ping as ping_inner, Habit, HabitProgress, Recurrence,
};

const UTC_OFFSET_ENV: &str = "TALLY_UTC_OFFSET_MINUTES";
const MAX_UTC_OFFSET_MINUTES: i32 = 18 * 60;

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Progress ring and badge data for one habit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitProgressResponse {
    /// Whether evaluation succeeded.
    pub ok: bool,
    /// Logs in the period containing `now`.
    pub progress: u32,
    pub target_count: u32,
    /// Ring fill in `0..=100`.
    pub percentage: u8,
    pub completed: bool,
    /// When true the UI must refuse further increments.
    pub locked: bool,
    pub streak: u32,
    pub total_accumulated: u32,
    /// Human-readable diagnostics; empty on success.
    pub message: String,
}

impl HabitProgressResponse {
    fn success(progress: HabitProgress) -> Self {
        Self {
            ok: true,
            progress: progress.progress,
            target_count: progress.target_count,
            percentage: progress.percentage,
            completed: progress.completed,
            locked: progress.locked,
            streak: progress.stats.streak,
            total_accumulated: progress.stats.total_accumulated,
            message: String::new(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            progress: 0,
            target_count: 0,
            percentage: 0,
            completed: false,
            locked: false,
            streak: 0,
            total_accumulated: 0,
            message: message.into(),
        }
    }
}

/// Period anchor lookup result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodAnchorResponse {
    pub ok: bool,
    /// Start of the period in epoch milliseconds.
    pub anchor_ms: Option<i64>,
    pub message: String,
}

/// Evaluates progress, lock state and streak for a habit backup record.
///
/// Input semantics:
/// - `habit_json`: one habit in the camelCase backup shape.
/// - `now_epoch_ms`: evaluation instant.
/// - `utc_offset_minutes`: zone override; falls back to
///   `TALLY_UTC_OFFSET_MINUTES`, then to the device local zone.
///
/// # FFI contract
/// - Sync call, pure computation.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn habit_progress(
    habit_json: String,
    now_epoch_ms: i64,
    utc_offset_minutes: Option<i32>,
) -> HabitProgressResponse {
    match evaluate_habit_json(habit_json.as_str(), now_epoch_ms, utc_offset_minutes) {
        Ok(progress) => HabitProgressResponse::success(progress),
        Err(err) => {
            warn!("event=habit_progress module=ffi status=error");
            HabitProgressResponse::failure(format!("habit_progress failed: {err}"))
        }
    }
}

/// Maps an instant to the start of its period.
///
/// `period` is `daily|weekly|monthly|custom`; `custom_interval` and
/// `created_at_ms` are required for `custom` only.
///
/// # FFI contract
/// - Sync call, pure computation.
/// - Never panics; unknown periods return `ok=false`.
#[flutter_rust_bridge::frb(sync)]
pub fn habit_period_anchor(
    period: String,
    custom_interval: Option<i64>,
    created_at_ms: Option<i64>,
    instant_ms: i64,
    utc_offset_minutes: Option<i32>,
) -> PeriodAnchorResponse {
    let result = Recurrence::from_parts(period.trim(), custom_interval)
        .map_err(|err| err.to_string())
        .and_then(|recurrence| {
            let anchor = match resolve_zone(utc_offset_minutes)? {
                EvalZone::Local => period_anchor(instant_ms, recurrence, created_at_ms, &Local),
                EvalZone::Fixed(offset) => {
                    period_anchor(instant_ms, recurrence, created_at_ms, &offset)
                }
            };
            anchor.map_err(|err| err.to_string())
        });

    match result {
        Ok(anchor) => PeriodAnchorResponse {
            ok: true,
            anchor_ms: Some(anchor),
            message: String::new(),
        },
        Err(err) => {
            warn!("event=habit_period_anchor module=ffi status=error");
            PeriodAnchorResponse {
                ok: false,
                anchor_ms: None,
                message: format!("habit_period_anchor failed: {err}"),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EvalZone {
    Local,
    Fixed(FixedOffset),
}

fn evaluate_habit_json(
    habit_json: &str,
    now_epoch_ms: i64,
    utc_offset_minutes: Option<i32>,
) -> Result<HabitProgress, String> {
    let habit: Habit =
        serde_json::from_str(habit_json).map_err(|err| format!("invalid habit record: {err}"))?;
    let progress = match resolve_zone(utc_offset_minutes)? {
        EvalZone::Local => HabitProgress::evaluate(&habit, now_epoch_ms, &Local),
        EvalZone::Fixed(offset) => HabitProgress::evaluate(&habit, now_epoch_ms, &offset),
    };
    progress.map_err(|err| err.to_string())
}

fn resolve_zone(utc_offset_minutes: Option<i32>) -> Result<EvalZone, String> {
    let minutes = match utc_offset_minutes {
        Some(minutes) => Some(minutes),
        None => env_offset_minutes()?,
    };
    match minutes {
        Some(minutes) => fixed_offset(minutes).map(EvalZone::Fixed),
        None => Ok(EvalZone::Local),
    }
}

fn env_offset_minutes() -> Result<Option<i32>, String> {
    let Ok(raw) = std::env::var(UTC_OFFSET_ENV) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<i32>()
        .map(Some)
        .map_err(|err| format!("{UTC_OFFSET_ENV} must be whole minutes, got `{trimmed}`: {err}"))
}

fn fixed_offset(minutes: i32) -> Result<FixedOffset, String> {
    if !(-MAX_UTC_OFFSET_MINUTES..=MAX_UTC_OFFSET_MINUTES).contains(&minutes) {
        return Err(format!(
            "utc offset {minutes} minutes is outside +/-{MAX_UTC_OFFSET_MINUTES}"
        ));
    }
    FixedOffset::east_opt(minutes * 60)
        .ok_or_else(|| format!("utc offset {minutes} minutes is invalid"))
}
