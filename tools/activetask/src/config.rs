use std::path::PathBuf;

use crate::reminder::DEFAULT_REMINDER_INTERVAL_MS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    pub state_dir: PathBuf,
    pub reminder_interval_ms: i64,
}

impl TrackerConfig {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
            reminder_interval_ms: DEFAULT_REMINDER_INTERVAL_MS,
        }
    }

    /// `ACTIVETASK_STATE_DIR`, else `$XDG_DATA_HOME/activetask`, else
    /// `$HOME/.local/share/activetask`, else `./activetask`.
    pub fn from_env() -> Self {
        if let Some(explicit) = std::env::var_os("ACTIVETASK_STATE_DIR") {
            return Self::new(PathBuf::from(explicit));
        }

        let base = std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var_os("HOME").map(|home| {
                    let mut p = PathBuf::from(home);
                    p.push(".local");
                    p.push("share");
                    p
                })
            })
            .unwrap_or_else(|| PathBuf::from("."));

        Self::new(base.join("activetask"))
    }
}
