//! Profile settings persisted on the device.

use std::sync::Arc;

use farmacia_client::storage::{load_json, save_json};
use farmacia_client::{KeyValueStore, StorageError};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Storage key for the preferences JSON.
pub const PREFERENCES_KEY: &str = "profile-preferences";

/// Toggles on the profile screen; both start enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfilePreferences {
    pub biometric_enabled: bool,
    pub notifications_enabled: bool,
}

impl Default for ProfilePreferences {
    fn default() -> Self {
        Self {
            biometric_enabled: true,
            notifications_enabled: true,
        }
    }
}

/// Preferences backed by a key-value store; every change is written
/// through.
#[derive(Clone)]
pub struct ProfileSettings {
    store: Arc<dyn KeyValueStore>,
    preferences: ProfilePreferences,
}

impl std::fmt::Debug for ProfileSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileSettings")
            .field("preferences", &self.preferences)
            .finish_non_exhaustive()
    }
}

impl ProfileSettings {
    /// Load stored preferences, defaults when nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read or holds malformed
    /// JSON.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Result<Self, StorageError> {
        let preferences: ProfilePreferences =
            load_json(store.as_ref(), PREFERENCES_KEY)?.unwrap_or_default();
        debug!(?preferences, "Profile preferences loaded");
        Ok(Self { store, preferences })
    }

    #[must_use]
    pub const fn preferences(&self) -> ProfilePreferences {
        self.preferences
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the change cannot be persisted; the
    /// in-memory value is left unchanged.
    #[instrument(skip(self))]
    pub fn set_biometric_enabled(&mut self, enabled: bool) -> Result<(), StorageError> {
        self.update(ProfilePreferences {
            biometric_enabled: enabled,
            ..self.preferences
        })
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the change cannot be persisted; the
    /// in-memory value is left unchanged.
    #[instrument(skip(self))]
    pub fn set_notifications_enabled(&mut self, enabled: bool) -> Result<(), StorageError> {
        self.update(ProfilePreferences {
            notifications_enabled: enabled,
            ..self.preferences
        })
    }

    fn update(&mut self, next: ProfilePreferences) -> Result<(), StorageError> {
        save_json(self.store.as_ref(), PREFERENCES_KEY, &next)?;
        self.preferences = next;
        Ok(())
    }
}
