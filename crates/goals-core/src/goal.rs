// goal.rs: what the user wants to do, and how often.
//
// A Goal is a value: a stable id plus a title, a display colour, and a
// target frequency over a recurring interval. Everything derived from it
// (percentages, the "3 times per week" text) is a pure function of those
// fields.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GoalError;

/// The recurrence window over which a goal's frequency is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interval {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Interval {
    /// All intervals, in the order a picker shows them.
    pub const ALL: [Interval; 3] = [Interval::Daily, Interval::Weekly, Interval::Monthly];

    /// Human text for `number` occurrences within this interval
    /// ("once per day", "twice per week", "5 times per month").
    ///
    /// Intended for `number >= 1`; other values are rendered literally.
    pub fn frequency(&self, number: u32) -> String {
        let count = match number {
            1 => "once".to_string(),
            2 => "twice".to_string(),
            n => format!("{} times", n),
        };
        let per = match self {
            Interval::Daily => "per day",
            Interval::Weekly => "per week",
            Interval::Monthly => "per month",
        };
        format!("{} {}", count, per)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interval::Daily => write!(f, "daily"),
            Interval::Weekly => write!(f, "weekly"),
            Interval::Monthly => write!(f, "monthly"),
        }
    }
}

impl FromStr for Interval {
    type Err = GoalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Interval::Daily),
            "weekly" => Ok(Interval::Weekly),
            "monthly" => Ok(Interval::Monthly),
            _ => Err(GoalError::InvalidInterval(s.to_string())),
        }
    }
}

/// Display colour of a goal.
///
/// The core never interprets it: it is a name or hex string that only
/// takes part in equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Colour(String);

impl Colour {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Colour {
    fn default() -> Self {
        Self::new("green")
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Colour {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A single goal: do something `frequency` times per `interval`.
///
/// The id is assigned once at creation and cannot be changed; all other
/// attributes are freely editable. Two goals are equal only if every field,
/// the id included, matches.
///
/// `frequency` is not validated. A frequency of zero is accepted and makes
/// [`Goal::percentage`] return infinity (or NaN for a zero count); keeping
/// it positive is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Goal {
    id: Uuid,

    /// Display name (e.g., "Yoga").
    pub title: String,

    /// Display colour.
    pub colour: Colour,

    /// Recurrence window.
    pub interval: Interval,

    /// How often the activity ought to happen during one interval.
    pub frequency: u32,
}

impl Goal {
    /// Create a goal with a fresh id.
    pub fn new(
        colour: impl Into<Colour>,
        title: impl Into<String>,
        interval: Interval,
        frequency: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            colour: colour.into(),
            interval,
            frequency,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// "once per day", "3 times per week", ...
    pub fn frequency_per_interval(&self) -> String {
        self.interval.frequency(self.frequency)
    }

    /// Fraction of the target reached after `count` completions in the
    /// current interval. Not clamped: overachieving gives values above 1.0.
    pub fn percentage(&self, count: u32) -> f64 {
        f64::from(count) / f64::from(self.frequency)
    }

    /// [`Goal::percentage`] rendered as a whole percent, e.g. "60%".
    pub fn percent_label(&self, count: u32) -> String {
        format!("{:.0}%", self.percentage(count) * 100.0)
    }

    /// Whether switching from `self` to `other` changes what a completion
    /// count means (a different interval or frequency). Title and colour
    /// edits do not.
    pub fn changes_counting(&self, other: &Goal) -> bool {
        self.interval != other.interval || self.frequency != other.frequency
    }
}

impl Default for Goal {
    /// The goal a user gets from "add new goal": green, "New Goal", once a day.
    fn default() -> Self {
        Goal::new(Colour::default(), "New Goal", Interval::Daily, 1)
    }
}
