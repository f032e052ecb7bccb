//! # goals-core
//!
//! Goal and progress tracking for the `goals` habit tracker.
//!
//! A [`Goal`] says how often something should happen per [`Interval`]
//! ("Yoga, 5 times per month"). A [`GoalProgress`] pairs a goal with its
//! [`Progress`]: either inactive, or active with a count of completions in
//! the current interval. The [`GoalStore`] owns the ordered collection of
//! records and is the only place they are mutated.
//!
//! ## Key components
//!
//! - [`Goal`], [`Interval`], [`Colour`]: the goal value model
//! - [`Progress`], [`GoalProgress`]: tracking state (inactive / active(n))
//! - [`GoalStore`]: ordered, id-keyed store with the mutation rules for
//!   activation, edits, removal, reordering and recording progress
//! - [`GoalEvent`]: published after every state change
//! - [`EventDispatcher`] / [`NotificationSink`]: fan-out to observers
//! - [`GoalsConfig`]: `.goals/goals.toml` (seed goals, event log)

pub mod config;
pub mod error;
pub mod events;
pub mod goal;
pub mod progress;
pub mod store;

pub use config::{GoalsConfig, SeedGoal};
pub use error::GoalError;
pub use events::{ChannelSink, EventDispatcher, GoalEvent, LogSink, NotificationSink, TracingSink};
pub use goal::{Colour, Goal, Interval};
pub use progress::{GoalProgress, Progress};
pub use store::GoalStore;
