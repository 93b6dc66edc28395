//! Client-side session state persisted between invocations.
//!
//! The file is a flat JSON object with fixed keys so other clients of the
//! same backend can share it: `userLocation`, `userLocationName`,
//! `authToken`, `userProfile`.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use vidmap_core::Coordinate;

const STATE_DIR: &str = ".vidmap";
const STATE_FILE: &str = "state.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    #[serde(rename = "userLocation", default, skip_serializing_if = "Option::is_none")]
    pub user_location: Option<Coordinate>,
    #[serde(rename = "userLocationName", default, skip_serializing_if = "Option::is_none")]
    pub user_location_name: Option<String>,
    #[serde(rename = "authToken", default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    #[serde(rename = "userProfile", default, skip_serializing_if = "Option::is_none")]
    pub user_profile: Option<serde_json::Value>,
}

impl StoredSession {
    /// Reads the session file. A missing file is an empty session.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("session file {} is not valid JSON", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => {
                Err(e).with_context(|| format!("failed to read session file {}", path.display()))
            }
        }
    }

    /// # Errors
    ///
    /// Returns an error if the parent directory or file cannot be written.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let body = serde_json::to_string_pretty(self)?;
        std::fs::write(path, body)
            .with_context(|| format!("failed to write session file {}", path.display()))
    }

    /// Drops the credential keys; the remembered location survives.
    pub fn logout(&mut self) {
        self.auth_token = None;
        self.user_profile = None;
    }

    /// The logged-in user's id, read from the stored profile.
    #[must_use]
    pub fn user_id(&self) -> Option<i64> {
        self.user_profile
            .as_ref()
            .and_then(|profile| profile.get("id"))
            .and_then(serde_json::Value::as_i64)
    }
}

/// `$HOME/.vidmap/state.json`, or `./.vidmap/state.json` without a home dir.
#[must_use]
pub fn default_state_path() -> PathBuf {
    std::env::var_os("HOME")
        .map_or_else(|| PathBuf::from("."), PathBuf::from)
        .join(STATE_DIR)
        .join(STATE_FILE)
}
