//! Habit use-case service.
//!
//! # Responsibility
//! - Provide create/edit/archive/delete entry points for habits.
//! - Own the log append (increment) and pop-last (undo) policy.
//! - Evaluate progress snapshots for presentation callers.
//!
//! # Invariants
//! - Log mutations run under one write gate, so each read-modify-write of
//!   `logs` sees a consistent snapshot.
//! - Undo removes the most recently appended entry, which is not always the
//!   chronologically latest instant.
//! - Logging never includes habit names (user text).

use crate::engine::anchor::EngineError;
use crate::engine::stats::{current_progress, HabitProgress};
use crate::model::habit::{Habit, HabitId, Recurrence};
use crate::repo::habit_repo::{HabitRepository, RepoError};
use chrono::TimeZone;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard};

/// Service error for habit use-cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HabitServiceError {
    /// Target habit does not exist.
    HabitNotFound(HabitId),
    /// Current period reached target and the habit does not allow exceeding.
    TargetReached { habit_id: HabitId, target_count: u32 },
    /// No log falls in the current period, so there is nothing to undo.
    NothingToUndo(HabitId),
    Repo(RepoError),
    Engine(EngineError),
}

impl Display for HabitServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HabitNotFound(id) => write!(f, "habit not found: {id}"),
            Self::TargetReached {
                habit_id,
                target_count,
            } => write!(
                f,
                "habit {habit_id} already reached target {target_count} for this period"
            ),
            Self::NothingToUndo(id) => write!(f, "habit {id} has no log in this period"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Engine(err) => write!(f, "{err}"),
        }
    }
}

impl Error for HabitServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Engine(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for HabitServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::HabitNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<EngineError> for HabitServiceError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

pub type HabitServiceResult<T> = Result<T, HabitServiceError>;

/// Editable habit fields supplied by the create/edit form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitDraft {
    pub name: String,
    pub icon: String,
    pub color: String,
    pub target_count: u32,
    pub recurrence: Recurrence,
    pub allow_exceed: bool,
}

impl HabitDraft {
    fn apply_to(&self, habit: &mut Habit) {
        habit.name = self.name.trim().to_string();
        habit.icon = self.icon.clone();
        habit.color = self.color.clone();
        habit.target_count = self.target_count;
        habit.recurrence = self.recurrence;
        habit.allow_exceed = self.allow_exceed;
    }
}

/// Habit service facade over repository implementations.
///
/// `tz` decides local midnight for every period computation.
pub struct HabitService<R: HabitRepository, Tz: TimeZone> {
    repo: R,
    tz: Tz,
    write_gate: Mutex<()>,
}

impl<R: HabitRepository, Tz: TimeZone> HabitService<R, Tz> {
    /// Creates a service using the provided repository and time zone.
    pub fn new(repo: R, tz: Tz) -> Self {
        Self {
            repo,
            tz,
            write_gate: Mutex::new(()),
        }
    }

    /// Creates a habit with a generated ID, `created_at = now` and no logs.
    ///
    /// The name is trimmed; a blank name is rejected with `EmptyName`.
    pub fn create_habit(&self, draft: &HabitDraft, now: i64) -> HabitServiceResult<Habit> {
        let mut habit = Habit::new(String::new(), draft.target_count, draft.recurrence, now);
        draft.apply_to(&mut habit);
        self.repo.insert_habit(&habit)?;
        info!(
            "event=habit_create module=habit status=ok habit_id={} period={}",
            habit.id, habit.recurrence
        );
        Ok(habit)
    }

    /// Replaces editable fields, keeping `id`, `logs`, `created_at` and
    /// `archived` untouched.
    ///
    /// Switching to a custom cycle anchors it at the original creation day.
    pub fn update_habit(&self, id: &HabitId, draft: &HabitDraft) -> HabitServiceResult<Habit> {
        let _gate = self.gate()?;
        let mut habit = self.require(id)?;
        draft.apply_to(&mut habit);
        self.repo.update_habit(&habit)?;
        info!(
            "event=habit_update module=habit status=ok habit_id={} period={}",
            habit.id, habit.recurrence
        );
        Ok(habit)
    }

    /// Soft-deletes a habit; its logs are kept.
    pub fn archive_habit(&self, id: &HabitId) -> HabitServiceResult<()> {
        self.set_archived(id, true)
    }

    /// Clears the archive flag.
    pub fn restore_habit(&self, id: &HabitId) -> HabitServiceResult<()> {
        self.set_archived(id, false)
    }

    /// Removes a habit and all of its logs.
    pub fn delete_habit(&self, id: &HabitId) -> HabitServiceResult<()> {
        let _gate = self.gate()?;
        self.repo.delete_habit(id)?;
        info!("event=habit_delete module=habit status=ok habit_id={id}");
        Ok(())
    }

    pub fn get_habit(&self, id: &HabitId) -> HabitServiceResult<Option<Habit>> {
        Ok(self.repo.get_habit(id)?)
    }

    /// Lists non-archived habits in creation order.
    pub fn list_active_habits(&self) -> HabitServiceResult<Vec<Habit>> {
        Ok(self.repo.list_habits(false)?)
    }

    /// Appends one completion at `now`.
    ///
    /// # Contract
    /// - Rejects with `TargetReached` when progress already meets target and
    ///   `allow_exceed` is false.
    /// - Returns the new current-period progress.
    pub fn increment(&self, id: &HabitId, now: i64) -> HabitServiceResult<u32> {
        let _gate = self.gate()?;
        let mut habit = self.require(id)?;

        let progress = current_progress(&habit, now, &self.tz)?;
        if progress >= habit.target_count && !habit.allow_exceed {
            warn!(
                "event=habit_log_append module=habit status=rejected habit_id={} progress={} target={}",
                id, progress, habit.target_count
            );
            return Err(HabitServiceError::TargetReached {
                habit_id: id.clone(),
                target_count: habit.target_count,
            });
        }

        habit.logs.push(now);
        self.repo.update_habit(&habit)?;
        let progress = current_progress(&habit, now, &self.tz)?;
        info!(
            "event=habit_log_append module=habit status=ok habit_id={} progress={} target={}",
            id, progress, habit.target_count
        );
        Ok(progress)
    }

    /// Undoes the most recently appended completion.
    ///
    /// # Contract
    /// - Rejects with `NothingToUndo` when the current period has no logs.
    /// - Pops the last appended entry, whatever period it belongs to.
    /// - Returns the new current-period progress.
    pub fn decrement(&self, id: &HabitId, now: i64) -> HabitServiceResult<u32> {
        let _gate = self.gate()?;
        let mut habit = self.require(id)?;

        if current_progress(&habit, now, &self.tz)? == 0 {
            warn!("event=habit_log_undo module=habit status=rejected habit_id={id} progress=0");
            return Err(HabitServiceError::NothingToUndo(id.clone()));
        }

        habit.logs.pop();
        self.repo.update_habit(&habit)?;
        let progress = current_progress(&habit, now, &self.tz)?;
        info!(
            "event=habit_log_undo module=habit status=ok habit_id={} progress={}",
            id, progress
        );
        Ok(progress)
    }

    /// Evaluates progress, lock state and statistics at `now`.
    pub fn evaluate(&self, id: &HabitId, now: i64) -> HabitServiceResult<HabitProgress> {
        let habit = self.require(id)?;
        Ok(HabitProgress::evaluate(&habit, now, &self.tz)?)
    }

    fn set_archived(&self, id: &HabitId, archived: bool) -> HabitServiceResult<()> {
        let _gate = self.gate()?;
        let mut habit = self.require(id)?;
        habit.archived = archived;
        self.repo.update_habit(&habit)?;
        info!("event=habit_archive module=habit status=ok habit_id={id} archived={archived}");
        Ok(())
    }

    fn require(&self, id: &HabitId) -> HabitServiceResult<Habit> {
        self.repo
            .get_habit(id)?
            .ok_or_else(|| HabitServiceError::HabitNotFound(id.clone()))
    }

    fn gate(&self) -> HabitServiceResult<MutexGuard<'_, ()>> {
        self.write_gate
            .lock()
            .map_err(|_| HabitServiceError::Repo(RepoError::Poisoned))
    }
}

impl Default for HabitDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            icon: "check".to_string(),
            color: String::new(),
            target_count: 1,
            recurrence: Recurrence::Daily,
            allow_exceed: false,
        }
    }
}

