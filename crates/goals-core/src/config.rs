// config.rs: Configuration from .goals/goals.toml
//
// The config decides how a store starts out (seed goals), where change
// events are logged, and whether deactivating a goal with progress needs an
// explicit confirmation. A missing file means defaults; a malformed file is
// an error so typos don't silently drop seed goals.

use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::GoalError;
use crate::events::{LogSink, TracingSink};
use crate::goal::{Colour, Goal, Interval};
use crate::progress::GoalProgress;
use crate::store::GoalStore;

/// Directory under the project root holding goals configuration.
pub const CONFIG_DIR: &str = ".goals";

/// Config file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "goals.toml";

/// Frequencies a seed goal may ask for, the same range `add` and `edit` take.
pub const SEED_FREQUENCY: RangeInclusive<u32> = 1..=9;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalsConfig {
    /// Append every change event as JSONL to this file. Relative paths
    /// resolve against the project root.
    #[serde(default)]
    pub events_log: Option<PathBuf>,

    /// Refuse to deactivate a goal with recorded progress unless forced.
    #[serde(default = "default_confirm_discard")]
    pub confirm_discard: bool,

    /// Goals the store starts with, in display order.
    #[serde(default)]
    pub goals: Vec<SeedGoal>,
}

impl Default for GoalsConfig {
    fn default() -> Self {
        Self {
            events_log: None,
            confirm_discard: default_confirm_discard(),
            goals: Vec::new(),
        }
    }
}

/// One `[[goals]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedGoal {
    pub title: String,

    #[serde(default)]
    pub colour: Colour,

    #[serde(default)]
    pub interval: Interval,

    #[serde(default = "default_frequency")]
    pub frequency: u32,

    /// Completions so far; absent means the goal starts inactive.
    #[serde(default)]
    pub progress: Option<u32>,
}

impl SeedGoal {
    /// A fresh record (new id) for this seed.
    pub fn to_record(&self) -> GoalProgress {
        let goal = Goal::new(
            self.colour.clone(),
            self.title.clone(),
            self.interval,
            self.frequency,
        );
        GoalProgress::new(goal, self.progress)
    }
}

fn default_confirm_discard() -> bool {
    true
}

fn default_frequency() -> u32 {
    1
}

impl GoalsConfig {
    /// Standard config location for a project: `<root>/.goals/goals.toml`.
    pub fn path_for_project(project_root: impl AsRef<Path>) -> PathBuf {
        project_root.as_ref().join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Load config from a TOML file.
    ///
    /// Seeds with a frequency outside [`SEED_FREQUENCY`] are rejected.
    pub fn load(path: &Path) -> Result<Self, GoalError> {
        let content = fs::read_to_string(path).map_err(|source| GoalError::IoError {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| GoalError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(seed) = config
            .goals
            .iter()
            .find(|seed| !SEED_FREQUENCY.contains(&seed.frequency))
        {
            return Err(GoalError::InvalidSeed {
                path: path.to_path_buf(),
                title: seed.title.clone(),
                frequency: seed.frequency,
            });
        }
        Ok(config)
    }

    /// Load config, returning defaults if the file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self, GoalError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// The events log path, resolved against `project_root`.
    pub fn events_log_path(&self, project_root: &Path) -> Option<PathBuf> {
        self.events_log.as_ref().map(|p| {
            if p.is_absolute() {
                p.clone()
            } else {
                project_root.join(p)
            }
        })
    }

    /// Seed records, each with a fresh goal id.
    pub fn seed_records(&self) -> Vec<GoalProgress> {
        self.goals.iter().map(SeedGoal::to_record).collect()
    }

    /// Build a seeded store with the configured sinks subscribed.
    pub fn build_store(&self, project_root: &Path) -> GoalStore {
        let mut store = GoalStore::with_records(self.seed_records());
        store.subscribe(Box::new(TracingSink));
        if let Some(path) = self.events_log_path(project_root) {
            let sink = LogSink::new(path);
            tracing::debug!(events_log = %sink.path().display(), "logging goal events");
            store.subscribe(Box::new(sink));
        }
        store
    }
}
