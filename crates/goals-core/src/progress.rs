// progress.rs: Tracking state of a goal.
//
// A goal is either inactive (not tracked at all) or active with a count of
// completions in the current interval. Zero is a real count: an active goal
// nobody has worked on yet is still active.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::goal::Goal;

/// Whether a goal is tracked, and if so how often it was completed.
///
/// Serializes as `{"state": "inactive"}` or `{"state": "active", "count": 3}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Progress {
    #[default]
    Inactive,
    Active { count: u32 },
}

impl Progress {
    pub fn is_active(&self) -> bool {
        matches!(self, Progress::Active { .. })
    }

    /// The completion count, or `None` when inactive.
    pub fn count(&self) -> Option<u32> {
        match self {
            Progress::Inactive => None,
            Progress::Active { count } => Some(*count),
        }
    }

    /// "active" or "inactive", as shown next to a goal in a list.
    pub fn status_label(&self) -> &'static str {
        match self {
            Progress::Inactive => "inactive",
            Progress::Active { .. } => "active",
        }
    }
}

impl From<Option<u32>> for Progress {
    fn from(count: Option<u32>) -> Self {
        match count {
            Some(count) => Progress::Active { count },
            None => Progress::Inactive,
        }
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Progress::Inactive => write!(f, "inactive"),
            Progress::Active { count } => write!(f, "active ({})", count),
        }
    }
}

/// A goal together with its tracking state. Identified by the goal's id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GoalProgress {
    pub goal: Goal,
    pub progress: Progress,
}

impl GoalProgress {
    pub fn new(goal: Goal, progress: impl Into<Progress>) -> Self {
        Self {
            goal,
            progress: progress.into(),
        }
    }

    /// An inactive record for `goal`.
    pub fn inactive(goal: Goal) -> Self {
        Self::new(goal, Progress::Inactive)
    }

    pub fn id(&self) -> Uuid {
        self.goal.id()
    }

    /// Percentage of the goal reached so far; an inactive goal counts as zero.
    pub fn percentage(&self) -> f64 {
        self.goal.percentage(self.progress.count().unwrap_or(0))
    }

    /// [`GoalProgress::percentage`] as a whole-percent label.
    pub fn percent_label(&self) -> String {
        self.goal.percent_label(self.progress.count().unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goal::Interval;

    #[test]
    fn zero_count_is_active() {
        let progress = Progress::from(Some(0));
        assert!(progress.is_active());
        assert_eq!(progress.count(), Some(0));
        assert_eq!(progress.status_label(), "active");
    }

    #[test]
    fn none_is_inactive() {
        let progress = Progress::from(None);
        assert!(!progress.is_active());
        assert_eq!(progress.count(), None);
        assert_eq!(progress.status_label(), "inactive");
        assert_eq!(progress, Progress::default());
    }

    #[test]
    fn record_identity_comes_from_goal() {
        let goal = Goal::new("orange", "Walks", Interval::Weekly, 3);
        let id = goal.id();
        let record = GoalProgress::new(goal, Some(1));
        assert_eq!(record.id(), id);
    }

    #[test]
    fn inactive_record_reports_zero_percent() {
        let record = GoalProgress::inactive(Goal::new("orange", "Walks", Interval::Weekly, 3));
        assert_eq!(record.percentage(), 0.0);
        assert_eq!(record.percent_label(), "0%");
    }

    #[test]
    fn progress_json_is_tagged() {
        let json = serde_json::to_string(&Progress::Active { count: 3 }).unwrap();
        assert_eq!(json, r#"{"state":"active","count":3}"#);
        let json = serde_json::to_string(&Progress::Inactive).unwrap();
        assert_eq!(json, r#"{"state":"inactive"}"#);
    }

    #[test]
    fn display_format() {
        assert_eq!(Progress::Inactive.to_string(), "inactive");
        assert_eq!(Progress::Active { count: 2 }.to_string(), "active (2)");
    }
}
