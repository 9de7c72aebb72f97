// store.rs — GoalFileStore: JSON persistence for the goal set.
//
// Each goal is stored as a JSON file: `<store_dir>/<goal_id>.json`.
// This keeps goals isolated and makes the store easy to inspect manually.
//
// The manager hands over the full goal set after every operation;
// `save_all` writes every goal and removes files of goals that are gone.
// Files that don't read back as a goal are never removed.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::GoalError;
use crate::goal::{Goal, GoalId};

/// Persistent store for goals.
pub struct GoalFileStore {
    store_dir: PathBuf,
}

impl GoalFileStore {
    /// Create a new store backed by the given directory.
    /// Creates the directory if it doesn't exist.
    pub fn new(store_dir: impl AsRef<Path>) -> Result<Self, GoalError> {
        let store_dir = store_dir.as_ref().to_path_buf();
        fs::create_dir_all(&store_dir).map_err(|source| GoalError::Io {
            path: store_dir.display().to_string(),
            source,
        })?;
        Ok(Self { store_dir })
    }

    /// Save a single goal (creates or overwrites).
    pub fn save(&self, goal: &Goal) -> Result<(), GoalError> {
        let path = self.goal_file(goal.id);
        let json = serde_json::to_string_pretty(goal)?;
        fs::write(&path, json).map_err(|source| GoalError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(())
    }

    /// Persist the full goal set, deleting files of goals not in `goals`.
    ///
    /// Only files holding a readable goal are candidates for removal; a file
    /// that fails to parse is left for the user to repair.
    pub fn save_all(&self, goals: &[Goal]) -> Result<(), GoalError> {
        for goal in goals {
            self.save(goal)?;
        }

        let keep: HashSet<GoalId> = goals.iter().map(|g| g.id).collect();
        for path in self.json_files()? {
            let named_id = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<GoalId>().ok());
            let Some(id) = named_id else { continue };
            if keep.contains(&id) {
                continue;
            }
            let stale = match self.read_goal(&path) {
                Ok(stored) => stored.id == id,
                Err(e) => {
                    tracing::warn!(path = %path.display(), "leaving unreadable goal file in place: {}", e);
                    false
                }
            };
            if stale {
                fs::remove_file(&path).map_err(|source| GoalError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                tracing::debug!(path = %path.display(), "removed stale goal file");
            }
        }
        Ok(())
    }

    /// Get a specific goal by ID.
    pub fn get(&self, goal_id: GoalId) -> Result<Option<Goal>, GoalError> {
        let path = self.goal_file(goal_id);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(self.read_goal(&path)?))
    }

    /// Load every goal, in creation order. Fails on the first unreadable file.
    pub fn load_all(&self) -> Result<Vec<Goal>, GoalError> {
        let mut goals = Vec::new();
        for path in self.json_files()? {
            goals.push(self.read_goal(&path)?);
        }
        goals.sort_by_key(|g| g.seq);
        Ok(goals)
    }

    /// Delete a goal file. Returns whether it existed.
    pub fn delete(&self, goal_id: GoalId) -> Result<bool, GoalError> {
        let path = self.goal_file(goal_id);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).map_err(|source| GoalError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(true)
    }

    fn read_goal(&self, path: &Path) -> Result<Goal, GoalError> {
        let json = fs::read_to_string(path).map_err(|source| GoalError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    fn json_files(&self) -> Result<Vec<PathBuf>, GoalError> {
        let entries = fs::read_dir(&self.store_dir).map_err(|source| GoalError::Io {
            path: self.store_dir.display().to_string(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| GoalError::Io {
                path: self.store_dir.display().to_string(),
                source,
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        Ok(files)
    }

    /// Path to the JSON file for a given goal.
    fn goal_file(&self, goal_id: GoalId) -> PathBuf {
        self.store_dir.join(format!("{}.json", goal_id))
    }
}
