//! Desktop position store with file-based persistence
//!
//! Stores the last known exploration position in a JSON file at:
//! - Linux: ~/.config/argonvale/position.json
//! - macOS: ~/Library/Application Support/io.argonvale.player/position.json
//! - Windows: C:\Users\<User>\AppData\Roaming\argonvale\player\config\position.json

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use directories::ProjectDirs;

use crate::ports::outbound::{PositionStorePort, StoredPosition};

pub struct DesktopPositionStore {
    path: PathBuf,
    cache: RwLock<Option<StoredPosition>>,
}

impl Default for DesktopPositionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DesktopPositionStore {
    /// Store under the platform config directory.
    pub fn new() -> Self {
        let path = if let Some(dirs) = ProjectDirs::from("io", "argonvale", "player") {
            dirs.config_dir().join("position.json")
        } else {
            // Fallback to current directory if project dirs unavailable
            PathBuf::from("argonvale_position.json")
        };
        Self::at_path(path)
    }

    /// Store at an explicit file path, loading whatever is already there.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cache = load_file(&path);
        tracing::debug!(path = %path.display(), restored = cache.is_some(), "position store initialized");
        Self {
            path,
            cache: RwLock::new(cache),
        }
    }

    fn persist(&self, position: &StoredPosition) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::error!(error = %e, "failed to create position store directory");
                return;
            }
        }

        match serde_json::to_string_pretty(position) {
            Ok(data) => {
                if let Err(e) = fs::write(&self.path, data) {
                    tracing::error!(error = %e, "failed to write position store");
                }
            }
            Err(e) => tracing::error!(error = %e, "failed to serialize position"),
        }
    }
}

fn load_file(path: &Path) -> Option<StoredPosition> {
    if !path.exists() {
        return None;
    }
    match fs::read_to_string(path) {
        Ok(data) => match serde_json::from_str(&data) {
            Ok(position) => Some(position),
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse position store");
                None
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "failed to read position store");
            None
        }
    }
}

impl PositionStorePort for DesktopPositionStore {
    fn save_position(&self, position: &StoredPosition) {
        match self.cache.write() {
            Ok(mut guard) => {
                *guard = Some(position.clone());
                drop(guard); // Release lock before I/O
                self.persist(position);
            }
            Err(e) => tracing::error!(error = %e, "failed to acquire write lock for position store"),
        }
    }

    fn load_position(&self) -> Option<StoredPosition> {
        match self.cache.read() {
            Ok(guard) => guard.clone(),
            Err(e) => {
                tracing::error!(error = %e, "failed to acquire read lock for position store");
                None
            }
        }
    }
}
