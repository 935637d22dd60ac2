//! Domain model for habit tracking.
//!
//! # Responsibility
//! - Define canonical data structures read by the progress engine.
//! - Keep recurrence policy a closed sum type instead of free-form strings.
//!
//! # Invariants
//! - Every habit is identified by a stable `HabitId`.
//! - Archiving is a soft flag, not a hard delete.

pub mod habit;
