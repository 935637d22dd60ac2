//! Habit repository contract and in-memory implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over habit records.
//! - Serialize concurrent mutations so readers always see a consistent
//!   snapshot of `logs`.
//!
//! # Invariants
//! - Write paths must call `Habit::validate()` before mutating state.
//! - Reads return owned clones; callers never alias stored records.
//! - Listing keeps insertion order.

use crate::model::habit::{Habit, HabitConfigError, HabitId};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for habit persistence and query operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoError {
    Validation(HabitConfigError),
    NotFound(HabitId),
    Duplicate(HabitId),
    /// A writer panicked while holding the store lock.
    Poisoned,
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "habit not found: {id}"),
            Self::Duplicate(id) => write!(f, "habit already exists: {id}"),
            Self::Poisoned => write!(f, "habit store lock poisoned"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) | Self::Duplicate(_) | Self::Poisoned => None,
        }
    }
}

impl From<HabitConfigError> for RepoError {
    fn from(value: HabitConfigError) -> Self {
        Self::Validation(value)
    }
}

/// Repository interface for habit CRUD operations.
pub trait HabitRepository {
    fn insert_habit(&self, habit: &Habit) -> RepoResult<HabitId>;
    fn update_habit(&self, habit: &Habit) -> RepoResult<()>;
    fn get_habit(&self, id: &HabitId) -> RepoResult<Option<Habit>>;
    fn list_habits(&self, include_archived: bool) -> RepoResult<Vec<Habit>>;
    fn delete_habit(&self, id: &HabitId) -> RepoResult<()>;
}

/// Process-local habit store.
#[derive(Debug, Default)]
pub struct InMemoryHabitRepository {
    habits: Mutex<Vec<Habit>>,
}

impl InMemoryHabitRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with restored records, validating each one.
    pub fn with_habits(habits: Vec<Habit>) -> RepoResult<Self> {
        let repo = Self::new();
        for habit in &habits {
            repo.insert_habit(habit)?;
        }
        Ok(repo)
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, Vec<Habit>>> {
        self.habits.lock().map_err(|_| RepoError::Poisoned)
    }
}

impl HabitRepository for InMemoryHabitRepository {
    fn insert_habit(&self, habit: &Habit) -> RepoResult<HabitId> {
        habit.validate()?;

        let mut habits = self.lock()?;
        if habits.iter().any(|stored| stored.id == habit.id) {
            return Err(RepoError::Duplicate(habit.id.clone()));
        }
        habits.push(habit.clone());
        Ok(habit.id.clone())
    }

    fn update_habit(&self, habit: &Habit) -> RepoResult<()> {
        habit.validate()?;

        let mut habits = self.lock()?;
        let stored = habits
            .iter_mut()
            .find(|stored| stored.id == habit.id)
            .ok_or_else(|| RepoError::NotFound(habit.id.clone()))?;
        *stored = habit.clone();
        Ok(())
    }

    fn get_habit(&self, id: &HabitId) -> RepoResult<Option<Habit>> {
        let habits = self.lock()?;
        Ok(habits.iter().find(|stored| &stored.id == id).cloned())
    }

    fn list_habits(&self, include_archived: bool) -> RepoResult<Vec<Habit>> {
        let habits = self.lock()?;
        Ok(habits
            .iter()
            .filter(|habit| include_archived || habit.is_active())
            .cloned()
            .collect())
    }

    fn delete_habit(&self, id: &HabitId) -> RepoResult<()> {
        let mut habits = self.lock()?;
        let before = habits.len();
        habits.retain(|stored| &stored.id != id);
        if habits.len() == before {
            return Err(RepoError::NotFound(id.clone()));
        }
        Ok(())
    }
}
