//! Habit progress engine.
//!
//! # Responsibility
//! - Bucket completion logs into periods under each recurrence policy.
//! - Derive current progress, streak and cumulative totals.
//!
//! # Invariants
//! - Every function is pure over its `(habit, now, tz)` inputs.
//! - The engine never mutates a habit.
//! - Configuration problems fail fast; no default period is guessed.

pub mod anchor;
pub mod stats;
