//! User profile — read-only data from the account backend.
//!
//! The profile is written to `profile.json` by the (out-of-scope) sign-in
//! flow and only read here.  Its `assistant_name` doubles as the wake word:
//! a transcript is acted on only when it contains the assistant's name.
//!
//! Absence of a profile is not an error — it simply disables wake-word
//! gating and the startup greeting.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::config::AppPaths;

// ---------------------------------------------------------------------------
// UserProfile
// ---------------------------------------------------------------------------

/// The signed-in user as the account backend serialises it (camelCase wire
/// names).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Display name of the user.
    pub name: String,
    /// The assistant's configured name — also the wake word.
    pub assistant_name: String,
    /// URL of the assistant's avatar image (unused here; kept for parity
    /// with the backend schema so round trips are lossless).
    #[serde(default)]
    pub assistant_image: String,
    /// Previously handled transcripts, oldest first.  Persisted by the
    /// backend, read-only in this client.
    #[serde(default)]
    pub history: Vec<String>,
}

impl UserProfile {
    /// Case-insensitive wake-word check: does `transcript` mention the
    /// assistant by name?
    pub fn contains_wake_word(&self, transcript: &str) -> bool {
        transcript
            .to_lowercase()
            .contains(&self.assistant_name.to_lowercase())
    }

    /// Load the cached profile from the platform config directory.
    ///
    /// Returns `Ok(None)` when no profile has been cached yet (signed-out
    /// state) so callers never need to special-case a missing file.
    pub fn load() -> Result<Option<Self>> {
        Self::load_from(&AppPaths::new().profile_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        let profile: Self = serde_json::from_str(&content)?;
        Ok(Some(profile))
    }
}

// ---------------------------------------------------------------------------
// ProfileStore
// ---------------------------------------------------------------------------

/// Storage seam for the cached profile.  Logout clears the cache through
/// this trait so a test double can absorb the effect instead of the real
/// config directory.
pub trait ProfileStore: Send + Sync {
    /// Remove the cached profile, ignoring a cache that is already gone.
    fn clear(&self);
}

/// Production store over the profile cache file.
pub struct DiskProfileStore {
    path: std::path::PathBuf,
}

impl DiskProfileStore {
    /// Store over the platform config directory.
    pub fn new() -> Self {
        Self {
            path: AppPaths::new().profile_file,
        }
    }

    /// Store over an explicit path (useful for tests).
    pub fn at(path: &std::path::Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl Default for DiskProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileStore for DiskProfileStore {
    fn clear(&self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!(
                    "could not remove profile cache {}: {e}",
                    self.path.display()
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn jarvis() -> UserProfile {
        UserProfile {
            name: "Asha".into(),
            assistant_name: "Jarvis".into(),
            assistant_image: String::new(),
            history: vec![],
        }
    }

    #[test]
    fn wake_word_is_case_insensitive_substring() {
        let p = jarvis();
        assert!(p.contains_wake_word("hey Jarvis what's the time"));
        assert!(p.contains_wake_word("HEY JARVIS"));
        assert!(p.contains_wake_word("jarvisplease"));
        assert!(!p.contains_wake_word("what's the time"));
        assert!(!p.contains_wake_word(""));
    }

    #[test]
    fn parses_backend_camel_case_json() {
        let json = r#"{
            "name": "Asha",
            "assistantName": "Jarvis",
            "assistantImage": "https://cdn.example.com/ai.gif",
            "history": ["jarvis open youtube"]
        }"#;
        let p: UserProfile = serde_json::from_str(json).expect("parse");
        assert_eq!(p.assistant_name, "Jarvis");
        assert_eq!(p.history.len(), 1);
    }

    #[test]
    fn missing_optional_fields_default() {
        let json = r#"{ "name": "Asha", "assistantName": "Nova" }"#;
        let p: UserProfile = serde_json::from_str(json).expect("parse");
        assert!(p.assistant_image.is_empty());
        assert!(p.history.is_empty());
    }

    #[test]
    fn load_missing_returns_none() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("profile.json");
        let loaded = UserProfile::load_from(&path).expect("load");
        assert!(loaded.is_none());
    }

    #[test]
    fn disk_store_clears_cache_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("profile.json");
        std::fs::write(&path, "{}").unwrap();

        let store = DiskProfileStore::at(&path);
        store.clear();
        assert!(!path.exists());

        // Already gone: clearing again is a quiet no-op.
        store.clear();
    }

    #[test]
    fn load_round_trip() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("profile.json");
        let p = jarvis();
        std::fs::write(&path, serde_json::to_string(&p).unwrap()).unwrap();
        let loaded = UserProfile::load_from(&path).expect("load");
        assert_eq!(loaded, Some(p));
    }
}
