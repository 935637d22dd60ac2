//! Core domain logic for Tally.
//! This crate is the single source of truth for habit invariants.

pub mod engine;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use engine::anchor::{
    period_anchor, previous_anchor, EngineError, EngineResult, PeriodGrid, DAY_MS,
};
pub use engine::stats::{compute_stats, current_progress, HabitProgress, HabitStats};
pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig};
pub use model::habit::{Habit, HabitConfigError, HabitId, HabitRecord, Recurrence};
pub use repo::habit_repo::{HabitRepository, InMemoryHabitRepository, RepoError, RepoResult};
pub use service::habit_service::{
    HabitDraft, HabitService, HabitServiceError, HabitServiceResult,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
