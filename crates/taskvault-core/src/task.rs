//! Task entity and recurrence configuration.
//!
//! A task carries a set of gate flags (`has_due_date`, `is_repeating`, ...)
//! that decide whether the matching timestamp fields are meaningful. The
//! store only ever persists tasks in normalized form: a cleared gate zeroes
//! its timestamp, a set gate requires a positive instant, and the repeat
//! interval is always at least one.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Sentinel `category_id` for tasks that belong to no category.
pub const NO_CATEGORY: i64 = 0;

/// Task priority.
///
/// Ordinal-compatible with the stored integer column: `Low` = 0,
/// `Normal` = 1, `High` = 2.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Normal,
    High,
}

impl Priority {
    pub fn as_i64(self) -> i64 {
        match self {
            Priority::Low => 0,
            Priority::Normal => 1,
            Priority::High => 2,
        }
    }

    /// Decode a stored priority ordinal, falling back to `Normal` for
    /// values outside the known range.
    pub fn from_i64(value: i64) -> Self {
        match value {
            0 => Priority::Low,
            2 => Priority::High,
            _ => Priority::Normal,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

/// Unit of the repeat interval for repeating tasks.
///
/// Ordinal-compatible with the stored integer column: `Days` = 0 through
/// `Years` = 3. Only meaningful while `is_repeating` is set; the store
/// keeps the configuration but never computes next occurrences itself.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RepeatUnit {
    Days,
    Weeks,
    Months,
    Years,
}

impl RepeatUnit {
    pub fn as_i64(self) -> i64 {
        match self {
            RepeatUnit::Days => 0,
            RepeatUnit::Weeks => 1,
            RepeatUnit::Months => 2,
            RepeatUnit::Years => 3,
        }
    }

    /// Decode a stored repeat unit ordinal, falling back to `Days` for
    /// values outside the known range.
    pub fn from_i64(value: i64) -> Self {
        match value {
            1 => RepeatUnit::Weeks,
            2 => RepeatUnit::Months,
            3 => RepeatUnit::Years,
            _ => RepeatUnit::Days,
        }
    }
}

impl Default for RepeatUnit {
    fn default() -> Self {
        RepeatUnit::Days
    }
}

/// One task row.
///
/// All timestamps are epoch milliseconds. The gated timestamps
/// (`date_due`, `final_date_due`, `stop_repeating_date`) are zero whenever
/// their gate flag is false; use the [`Task::due_date`] family of accessors
/// to read them as `Option<DateTime<Utc>>` without consulting the flags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    /// Unique identifier, assigned by the store on insert
    pub id: i64,
    /// Task name, non-empty
    pub name: String,
    /// Whether the task is completed
    pub completed: bool,
    /// Task priority
    pub priority: Priority,
    /// Soft reference to a category id, [`NO_CATEGORY`] when unset.
    /// The referenced category may have been deleted; callers decide how
    /// to display orphaned references.
    pub category_id: i64,
    /// Gate for `date_due`
    pub has_due_date: bool,
    /// Gate for `final_date_due`
    pub has_final_due_date: bool,
    /// Whether the task repeats
    pub is_repeating: bool,
    /// Gate for `stop_repeating_date`
    pub has_stop_repeating_date: bool,
    /// Unit between occurrences, meaningful only while repeating
    pub repeat_unit: RepeatUnit,
    /// Multiple of `repeat_unit` between occurrences, always >= 1
    pub repeat_interval: i64,
    /// Creation timestamp (epoch ms), filled by the store when zero
    pub date_created: i64,
    /// Last-modification timestamp (epoch ms), stamped by the caller on
    /// every edit (see [`Task::touch`])
    pub date_modified: i64,
    /// Due timestamp (epoch ms), zero unless `has_due_date`
    pub date_due: i64,
    /// Final due timestamp (epoch ms), zero unless `has_final_due_date`
    pub final_date_due: i64,
    /// Stop-repeating timestamp (epoch ms), zero unless
    /// `has_stop_repeating_date`
    pub stop_repeating_date: i64,
    /// Free-form notes, may be empty
    pub notes: String,
}

impl Task {
    /// Create a task with default field values.
    ///
    /// The id is left at zero; the store assigns the real one on insert.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now().timestamp_millis();
        Task {
            id: 0,
            name: name.into(),
            completed: false,
            priority: Priority::Normal,
            category_id: NO_CATEGORY,
            has_due_date: false,
            has_final_due_date: false,
            is_repeating: false,
            has_stop_repeating_date: false,
            repeat_unit: RepeatUnit::Days,
            repeat_interval: 1,
            date_created: now,
            date_modified: now,
            date_due: 0,
            final_date_due: 0,
            stop_repeating_date: 0,
            notes: String::new(),
        }
    }

    /// Due date as an instant, `None` while `has_due_date` is cleared.
    pub fn due_date(&self) -> Option<DateTime<Utc>> {
        if self.has_due_date {
            millis_to_datetime(self.date_due)
        } else {
            None
        }
    }

    /// Final due date as an instant, `None` while `has_final_due_date`
    /// is cleared.
    pub fn final_due_date(&self) -> Option<DateTime<Utc>> {
        if self.has_final_due_date {
            millis_to_datetime(self.final_date_due)
        } else {
            None
        }
    }

    /// Stop-repeating date as an instant, `None` while
    /// `has_stop_repeating_date` is cleared.
    pub fn stop_repeating(&self) -> Option<DateTime<Utc>> {
        if self.has_stop_repeating_date {
            millis_to_datetime(self.stop_repeating_date)
        } else {
            None
        }
    }

    /// Stamp `date_modified` with the current time.
    pub fn touch(&mut self) {
        self.date_modified = Utc::now().timestamp_millis();
    }

    /// Validate the task and return it in normalized form.
    ///
    /// - the name must contain at least one non-whitespace character
    /// - a repeat interval of zero becomes one; negative is rejected
    /// - a cleared gate flag zeroes its timestamp
    /// - a set gate flag requires a positive timestamp
    ///
    /// The store applies this to every task it writes, so persisted rows
    /// always satisfy the invariants.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] describing the first violated rule.
    pub fn normalized(mut self) -> Result<Self, ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName { entity: "task" });
        }

        if self.repeat_interval < 0 {
            return Err(ValidationError::NegativeRepeatInterval(
                self.repeat_interval,
            ));
        }
        if self.repeat_interval == 0 {
            self.repeat_interval = 1;
        }

        check_gate(
            self.has_due_date,
            &mut self.date_due,
            "has_due_date",
            "date_due",
        )?;
        check_gate(
            self.has_final_due_date,
            &mut self.final_date_due,
            "has_final_due_date",
            "final_date_due",
        )?;
        check_gate(
            self.has_stop_repeating_date,
            &mut self.stop_repeating_date,
            "has_stop_repeating_date",
            "stop_repeating_date",
        )?;

        Ok(self)
    }
}

/// Zero the timestamp when the gate is cleared, require a positive instant
/// when it is set.
fn check_gate(
    gate: bool,
    timestamp: &mut i64,
    gate_name: &'static str,
    field_name: &'static str,
) -> Result<(), ValidationError> {
    if !gate {
        *timestamp = 0;
        return Ok(());
    }
    if *timestamp <= 0 {
        return Err(ValidationError::MissingTimestamp {
            gate: gate_name,
            field: field_name,
            value: *timestamp,
        });
    }
    Ok(())
}

fn millis_to_datetime(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn priority_ordinals_round_trip() {
        for priority in [Priority::Low, Priority::Normal, Priority::High] {
            assert_eq!(Priority::from_i64(priority.as_i64()), priority);
        }
        assert_eq!(Priority::default(), Priority::Normal);
        // Unknown ordinals decode to the default
        assert_eq!(Priority::from_i64(99), Priority::Normal);
        assert_eq!(Priority::from_i64(-1), Priority::Normal);
    }

    #[test]
    fn priority_ordering_matches_ordinals() {
        assert!(Priority::Low < Priority::Normal);
        assert!(Priority::Normal < Priority::High);
    }

    #[test]
    fn repeat_unit_ordinals_round_trip() {
        for unit in [
            RepeatUnit::Days,
            RepeatUnit::Weeks,
            RepeatUnit::Months,
            RepeatUnit::Years,
        ] {
            assert_eq!(RepeatUnit::from_i64(unit.as_i64()), unit);
        }
        assert_eq!(RepeatUnit::from_i64(42), RepeatUnit::Days);
    }

    #[test]
    fn new_task_defaults() {
        let task = Task::new("Water the plants");
        assert_eq!(task.id, 0);
        assert_eq!(task.name, "Water the plants");
        assert!(!task.completed);
        assert_eq!(task.priority, Priority::Normal);
        assert_eq!(task.category_id, NO_CATEGORY);
        assert_eq!(task.repeat_interval, 1);
        assert!(task.date_created > 0);
        assert_eq!(task.date_modified, task.date_created);
        assert!(task.due_date().is_none());
    }

    #[test]
    fn normalized_rejects_empty_name() {
        let result = Task::new("   ").normalized();
        assert_eq!(
            result.unwrap_err(),
            ValidationError::EmptyName { entity: "task" }
        );
    }

    #[test]
    fn normalized_coerces_zero_repeat_interval() {
        let mut task = Task::new("Laundry");
        task.is_repeating = true;
        task.repeat_unit = RepeatUnit::Weeks;
        task.repeat_interval = 0;
        let task = task.normalized().unwrap();
        assert_eq!(task.repeat_interval, 1);
    }

    #[test]
    fn normalized_rejects_negative_repeat_interval() {
        let mut task = Task::new("Laundry");
        task.repeat_interval = -3;
        assert_eq!(
            task.normalized().unwrap_err(),
            ValidationError::NegativeRepeatInterval(-3)
        );
    }

    #[test]
    fn normalized_zeroes_timestamp_behind_cleared_gate() {
        let mut task = Task::new("Dentist");
        task.has_due_date = false;
        task.date_due = 1_700_000_000_000;
        let task = task.normalized().unwrap();
        assert_eq!(task.date_due, 0);
        assert!(task.due_date().is_none());
    }

    #[test]
    fn normalized_rejects_set_gate_without_timestamp() {
        let mut task = Task::new("Dentist");
        task.has_due_date = true;
        task.date_due = 0;
        let err = task.normalized().unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingTimestamp {
                gate: "has_due_date",
                field: "date_due",
                value: 0,
            }
        );
    }

    #[test]
    fn due_date_accessor_honors_gate() {
        let mut task = Task::new("Dentist");
        task.has_due_date = true;
        task.date_due = 1_700_000_000_000;
        let due = task.due_date().unwrap();
        assert_eq!(due.timestamp_millis(), 1_700_000_000_000);

        task.has_due_date = false;
        assert!(task.due_date().is_none());
    }

    #[test]
    fn touch_advances_date_modified() {
        let mut task = Task::new("Dentist");
        task.date_modified = 1;
        task.touch();
        assert!(task.date_modified > 1);
    }

    #[test]
    fn task_serialization() {
        let mut task = Task::new("Renew passport");
        task.priority = Priority::High;
        task.is_repeating = true;
        task.repeat_unit = RepeatUnit::Years;
        task.repeat_interval = 10;
        task.notes = "bring photos".to_string();

        let json = serde_json::to_string(&task).unwrap();
        let decoded: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, task);
    }

    proptest! {
        #[test]
        fn normalized_tasks_uphold_invariants(
            has_due_date in any::<bool>(),
            has_final_due_date in any::<bool>(),
            is_repeating in any::<bool>(),
            has_stop_repeating_date in any::<bool>(),
            repeat_interval in 0i64..100,
            date_due in 1i64..4_102_444_800_000,
            final_date_due in 1i64..4_102_444_800_000,
            stop_repeating_date in 1i64..4_102_444_800_000,
        ) {
            let mut task = Task::new("errands");
            task.has_due_date = has_due_date;
            task.has_final_due_date = has_final_due_date;
            task.is_repeating = is_repeating;
            task.has_stop_repeating_date = has_stop_repeating_date;
            task.repeat_interval = repeat_interval;
            task.date_due = date_due;
            task.final_date_due = final_date_due;
            task.stop_repeating_date = stop_repeating_date;

            let task = task.normalized().unwrap();

            prop_assert!(task.repeat_interval >= 1);
            // A cleared gate means a zero timestamp, a set gate a positive one
            prop_assert_eq!(task.date_due > 0, task.has_due_date);
            prop_assert_eq!(task.final_date_due > 0, task.has_final_due_date);
            prop_assert_eq!(task.stop_repeating_date > 0, task.has_stop_repeating_date);
            prop_assert_eq!(task.due_date().is_some(), task.has_due_date);
        }
    }
}
