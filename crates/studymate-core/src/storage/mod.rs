mod config;
mod prefs;

pub use config::{AiConfig, Config, NotificationsConfig, RemoteConfig, TimerConfig};
pub use prefs::{MemoryPrefs, PreferenceStore, SqlitePrefs};

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::{Result, StoreError};

/// Preference keys. Every value is a JSON string.
pub mod keys {
    pub const PROFILE: &str = "@user_data";
    pub const SUBJECTS: &str = "@materias_data";
    pub const STREAK: &str = "@racha_data";
    pub const TASKS: &str = "@tasks_data";
    pub const SESSION: &str = "@study_session";
}

/// Returns `~/.config/studymate[-dev]/` based on STUDYMATE_ENV.
///
/// Set STUDYMATE_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, StoreError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("STUDYMATE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("studymate-dev")
    } else {
        base_dir.join("studymate")
    };

    std::fs::create_dir_all(&dir).map_err(|e| StoreError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// Read and decode a JSON value. A value that no longer parses is logged and
/// treated as absent.
pub fn load_json<T: DeserializeOwned>(store: &dyn PreferenceStore, key: &str) -> Result<Option<T>> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(key, error = %e, "ignoring unreadable stored value");
            Ok(None)
        }
    }
}

pub fn save_json<T: Serialize + ?Sized>(store: &dyn PreferenceStore, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_helpers_round_trip() {
        let store = MemoryPrefs::new();
        save_json(&store, "k", &vec![1, 2, 3]).unwrap();
        let back: Option<Vec<u32>> = load_json(&store, "k").unwrap();
        assert_eq!(back, Some(vec![1, 2, 3]));
    }

    #[test]
    fn corrupt_values_read_as_absent() {
        let store = MemoryPrefs::new();
        store.set(keys::STREAK, "{not json").unwrap();
        let back: Option<crate::streak::StreakRecord> = load_json(&store, keys::STREAK).unwrap();
        assert!(back.is_none());
    }
}
