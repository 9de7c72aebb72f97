// config.rs — Settings and on-disk layout.
//
// Settings live in `.motiv/settings.toml`:
//
//   max_active_goals = 3
//   review_intervals = [1, 2, 4, 7, 14, 30, 60]
//
// Both keys are optional. Callers re-read settings per operation rather than
// holding them for the life of the process.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::GoalError;
use crate::review::{ReviewIntervals, DEFAULT_REVIEW_INTERVALS};

/// User-tunable settings consumed by the lifecycle engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Cap on auto-activated goals. Zero or negative disables auto-activation.
    #[serde(default = "default_max_active_goals")]
    pub max_active_goals: i64,

    /// Review cadence in days. Sorted and deduplicated on use.
    #[serde(default = "default_review_intervals")]
    pub review_intervals: Vec<u32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_active_goals: default_max_active_goals(),
            review_intervals: default_review_intervals(),
        }
    }
}

fn default_max_active_goals() -> i64 {
    3
}

fn default_review_intervals() -> Vec<u32> {
    DEFAULT_REVIEW_INTERVALS.to_vec()
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self, GoalError> {
        let content = std::fs::read_to_string(path).map_err(|source| GoalError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let settings: Settings =
            toml::from_str(&content).map_err(|e| GoalError::Config(e.to_string()))?;
        settings.intervals()?;
        Ok(settings)
    }

    /// Load settings, falling back to defaults when the file is missing.
    ///
    /// A file that exists but doesn't parse is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self, GoalError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Write settings as TOML.
    pub fn save(&self, path: &Path) -> Result<(), GoalError> {
        let content = toml::to_string_pretty(self).map_err(|e| GoalError::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| GoalError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }
        std::fs::write(path, content).map_err(|source| GoalError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// The validated interval sequence.
    pub fn intervals(&self) -> Result<ReviewIntervals, GoalError> {
        ReviewIntervals::new(self.review_intervals.clone())
    }
}

/// Where a project's goal data lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotivPaths {
    /// Root directory of the project.
    pub root: PathBuf,

    /// Directory for GoalFileStore (one JSON file per goal).
    pub goals_dir: PathBuf,

    /// Path to the lifecycle event log.
    pub events_log: PathBuf,

    /// Path to the settings file.
    pub settings_file: PathBuf,
}

impl MotivPaths {
    /// Standard `.motiv/` layout for a project.
    pub fn for_project(project_root: impl AsRef<Path>) -> Self {
        let root = project_root.as_ref().to_path_buf();
        let motiv_dir = root.join(".motiv");
        Self {
            root,
            goals_dir: motiv_dir.join("goals"),
            events_log: motiv_dir.join("events.jsonl"),
            settings_file: motiv_dir.join("settings.toml"),
        }
    }
}
