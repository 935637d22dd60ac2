//! Period-bucketed progress and streak statistics.
//!
//! # Responsibility
//! - Count logs in the period containing `now`.
//! - Derive successful periods, the running streak and the total.
//!
//! # Invariants
//! - `now` is always an explicit input; nothing here reads the clock.
//! - `logs` is treated as an unordered multiset of instants.
//! - An incomplete current period never breaks a streak; only past
//!   unsuccessful periods do.
//! - A period counts once toward the total no matter how far it exceeds
//!   the target.

use crate::engine::anchor::{EngineResult, PeriodGrid};
use crate::model::habit::Habit;
use chrono::TimeZone;
use std::collections::{HashMap, HashSet};

/// Streak and cumulative counters for one habit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HabitStats {
    /// Consecutive successful periods ending at the current (or previous) one.
    pub streak: u32,
    /// Number of distinct successful periods.
    pub total_accumulated: u32,
}

/// Number of logs at or after the anchor of the period containing `now`.
///
/// There is no upper bound: logs later than `now` still count.
pub fn current_progress<Tz: TimeZone>(habit: &Habit, now: i64, tz: &Tz) -> EngineResult<u32> {
    let grid = PeriodGrid::for_habit(habit, tz)?;
    let anchor = grid.anchor(now)?;
    Ok(count_at_or_after(&habit.logs, anchor))
}

/// Computes streak and total successful periods as of `now`.
pub fn compute_stats<Tz: TimeZone>(habit: &Habit, now: i64, tz: &Tz) -> EngineResult<HabitStats> {
    if habit.logs.is_empty() {
        return Ok(HabitStats::default());
    }

    let grid = PeriodGrid::for_habit(habit, tz)?;
    let successful = successful_periods(habit, &grid)?;
    let total_accumulated = saturating_u32(successful.len());

    // An unfinished current period adds nothing but does not end the walk.
    let current = grid.anchor(now)?;
    let mut streak = u32::from(successful.contains(&current));
    let mut cursor = grid.previous(current)?;
    // The set is finite, so the walk stops at the first missing anchor.
    while successful.contains(&cursor) {
        streak = streak.saturating_add(1);
        cursor = grid.previous(cursor)?;
    }

    Ok(HabitStats {
        streak,
        total_accumulated,
    })
}

/// Anchors of every period whose log count reaches the target.
pub fn successful_periods<Tz: TimeZone>(
    habit: &Habit,
    grid: &PeriodGrid<'_, Tz>,
) -> EngineResult<HashSet<i64>> {
    let mut buckets: HashMap<i64, u32> = HashMap::new();
    for &instant in &habit.logs {
        let count = buckets.entry(grid.anchor(instant)?).or_insert(0);
        *count = count.saturating_add(1);
    }

    Ok(buckets
        .into_iter()
        .filter(|(_, count)| *count >= habit.target_count)
        .map(|(anchor, _)| anchor)
        .collect())
}

/// Progress summary rendered by progress rings and streak badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HabitProgress {
    pub progress: u32,
    pub target_count: u32,
    /// Ring fill, capped at 100.
    pub percentage: u8,
    pub completed: bool,
    /// Target reached and exceeding is not allowed; further logging is refused.
    pub locked: bool,
    pub stats: HabitStats,
}

impl HabitProgress {
    /// Evaluates progress and statistics of `habit` at `now`.
    pub fn evaluate<Tz: TimeZone>(habit: &Habit, now: i64, tz: &Tz) -> EngineResult<Self> {
        let progress = current_progress(habit, now, tz)?;
        let stats = compute_stats(habit, now, tz)?;
        let completed = progress >= habit.target_count;

        Ok(Self {
            progress,
            target_count: habit.target_count,
            percentage: percentage(progress, habit.target_count),
            completed,
            locked: completed && !habit.allow_exceed,
            stats,
        })
    }
}

fn count_at_or_after(logs: &[i64], anchor: i64) -> u32 {
    saturating_u32(logs.iter().filter(|&&instant| instant >= anchor).count())
}

/// `target_count` is at least 1 for every validated habit.
fn percentage(progress: u32, target_count: u32) -> u8 {
    let ratio = (u64::from(progress) * 100)
        .checked_div(u64::from(target_count))
        .unwrap_or(100);
    u8::try_from(ratio.min(100)).unwrap_or(100)
}

fn saturating_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
