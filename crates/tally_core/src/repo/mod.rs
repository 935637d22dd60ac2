//! Repository layer abstractions.
//!
//! # Responsibility
//! - Define the storage contract the habit service depends on.
//! - Keep storage details out of service and engine code.
//!
//! # Invariants
//! - Repository writes must enforce `Habit::validate()` before mutating.
//! - Repository APIs return semantic errors (`NotFound`, `Duplicate`).

pub mod habit_repo;
