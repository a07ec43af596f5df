//! Secure credential storage.
//!
//! Tokens, the tenant ID and the signed-in user's profile live in the
//! platform keystore under fixed keys. [`SecureStore`] is the seam to that
//! keystore; [`CredentialStore`] is the typed facade the apps use.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use farmacia_core::{Module, Role, RoleParseError, TenantId, UserId};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::storage::StorageError;

/// Keystore key for the access token.
pub const AUTH_TOKEN_KEY: &str = "auth_token";
/// Keystore key for the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
/// Keystore key for the tenant ID.
pub const TENANT_ID_KEY: &str = "tenant_id";
/// Keystore key for the serialized user profile.
pub const USER_DATA_KEY: &str = "user_data";

/// Platform secure keystore.
pub trait SecureStore: Send + Sync {
    /// Read a secret, `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the keystore is unavailable.
    fn get_item(&self, key: &str) -> Result<Option<SecretString>, StorageError>;

    /// Write a secret.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the keystore is unavailable.
    fn set_item(&self, key: &str, value: SecretString) -> Result<(), StorageError>;

    /// Delete a secret. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the keystore is unavailable.
    fn delete_item(&self, key: &str) -> Result<(), StorageError>;
}

/// Process-local keystore for tests and platforms without one.
#[derive(Default)]
pub struct MemorySecureStore {
    items: RwLock<HashMap<String, SecretString>>,
}

impl MemorySecureStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for MemorySecureStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("MemorySecureStore")
            .field("keys", &items.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SecureStore for MemorySecureStore {
    fn get_item(&self, key: &str) -> Result<Option<SecretString>, StorageError> {
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: SecretString) -> Result<(), StorageError> {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        items.insert(key.to_string(), value);
        Ok(())
    }

    fn delete_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        items.remove(key);
        Ok(())
    }
}

/// Profile of the signed-in user, stored as JSON under `user_data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub id: UserId,
    pub email: String,
    pub full_name: String,
    pub role: String,
}

impl UserData {
    /// Parsed role.
    ///
    /// # Errors
    ///
    /// Returns `RoleParseError` if the stored role is not a known role.
    pub fn role(&self) -> Result<Role, RoleParseError> {
        self.role.parse()
    }

    /// Module the user lands on; unknown roles land on the POS.
    #[must_use]
    pub fn home_module(&self) -> Module {
        Module::for_role_name(&self.role)
    }
}

/// Typed access to the credentials in a [`SecureStore`].
///
/// Cheap to clone; clones share the same keystore.
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn SecureStore>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore").finish_non_exhaustive()
    }
}

impl CredentialStore {
    /// Wrap a keystore.
    pub fn new(store: impl SecureStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Credential store over a fresh in-memory keystore.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemorySecureStore::new())
    }

    /// Store the access token.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the keystore is unavailable.
    pub fn save_token(&self, token: SecretString) -> Result<(), StorageError> {
        self.store.set_item(AUTH_TOKEN_KEY, token)
    }

    /// Read the access token.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the keystore is unavailable.
    pub fn get_token(&self) -> Result<Option<SecretString>, StorageError> {
        self.store.get_item(AUTH_TOKEN_KEY)
    }

    /// Delete only the access token.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the keystore is unavailable.
    pub fn delete_token(&self) -> Result<(), StorageError> {
        self.store.delete_item(AUTH_TOKEN_KEY)
    }

    /// Store the refresh token.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the keystore is unavailable.
    pub fn save_refresh_token(&self, token: SecretString) -> Result<(), StorageError> {
        self.store.set_item(REFRESH_TOKEN_KEY, token)
    }

    /// Read the refresh token.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the keystore is unavailable.
    pub fn get_refresh_token(&self) -> Result<Option<SecretString>, StorageError> {
        self.store.get_item(REFRESH_TOKEN_KEY)
    }

    /// Store the tenant ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the keystore is unavailable.
    pub fn save_tenant_id(&self, tenant: &TenantId) -> Result<(), StorageError> {
        self.store
            .set_item(TENANT_ID_KEY, SecretString::from(tenant.as_str().to_string()))
    }

    /// Read the tenant ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the keystore is unavailable.
    pub fn get_tenant_id(&self) -> Result<Option<TenantId>, StorageError> {
        Ok(self
            .store
            .get_item(TENANT_ID_KEY)?
            .map(|s| TenantId::from(s.expose_secret()))
            .filter(|t| !t.is_empty()))
    }

    /// Store the user profile as JSON.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on serialization or keystore failure.
    pub fn save_user(&self, user: &UserData) -> Result<(), StorageError> {
        let raw = serde_json::to_string(user)?;
        self.store.set_item(USER_DATA_KEY, SecretString::from(raw))
    }

    /// Read the user profile.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on keystore failure or malformed JSON.
    pub fn get_user(&self) -> Result<Option<UserData>, StorageError> {
        self.store
            .get_item(USER_DATA_KEY)?
            .map(|raw| serde_json::from_str(raw.expose_secret()))
            .transpose()
            .map_err(StorageError::from)
    }

    /// Store everything a successful login returns.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if any write fails.
    #[instrument(skip(self, token, refresh_token, user), fields(user_id = %user.id, tenant = %tenant))]
    pub fn save_session(
        &self,
        token: SecretString,
        refresh_token: Option<SecretString>,
        tenant: &TenantId,
        user: &UserData,
    ) -> Result<(), StorageError> {
        self.save_token(token)?;
        if let Some(refresh) = refresh_token {
            self.save_refresh_token(refresh)?;
        }
        self.save_tenant_id(tenant)?;
        self.save_user(user)?;
        debug!("Session stored");
        Ok(())
    }

    /// Delete all four credential keys.
    ///
    /// # Errors
    ///
    /// Returns the first `StorageError` encountered; remaining keys are still
    /// attempted.
    #[instrument(skip(self))]
    pub fn clear_all(&self) -> Result<(), StorageError> {
        let mut first_error = None;
        for key in [AUTH_TOKEN_KEY, REFRESH_TOKEN_KEY, TENANT_ID_KEY, USER_DATA_KEY] {
            if let Err(e) = self.store.delete_item(key) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// `true` when an access token is stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the keystore is unavailable.
    pub fn is_authenticated(&self) -> Result<bool, StorageError> {
        Ok(self
            .get_token()?
            .is_some_and(|t| !t.expose_secret().is_empty()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user() -> UserData {
        UserData {
            id: UserId::new(uuid::Uuid::from_u128(7)),
            email: "vendedor@farmacia.cl".to_string(),
            full_name: "Ana Rojas".to_string(),
            role: "WAREHOUSE_OP".to_string(),
        }
    }

    #[test]
    fn test_token_lifecycle() {
        let creds = CredentialStore::in_memory();
        assert!(!creds.is_authenticated().unwrap());

        creds.save_token(SecretString::from("jwt-abc".to_string())).unwrap();
        assert!(creds.is_authenticated().unwrap());
        assert_eq!(creds.get_token().unwrap().unwrap().expose_secret(), "jwt-abc");

        creds.delete_token().unwrap();
        assert!(!creds.is_authenticated().unwrap());
    }

    #[test]
    fn test_user_data_wire_shape() {
        let creds = CredentialStore::in_memory();
        creds.save_user(&user()).unwrap();

        let raw = creds.store.get_item(USER_DATA_KEY).unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(raw.expose_secret()).unwrap();
        assert_eq!(json["fullName"], "Ana Rojas");
        assert_eq!(json["role"], "WAREHOUSE_OP");

        let loaded = creds.get_user().unwrap().unwrap();
        assert_eq!(loaded, user());
        assert_eq!(loaded.home_module(), Module::Wms);
    }

    #[test]
    fn test_clear_all_removes_every_key() {
        let creds = CredentialStore::in_memory();
        creds
            .save_session(
                SecretString::from("jwt".to_string()),
                Some(SecretString::from("refresh".to_string())),
                &TenantId::from("tenant-1"),
                &user(),
            )
            .unwrap();
        assert_eq!(creds.get_tenant_id().unwrap().unwrap().as_str(), "tenant-1");

        creds.clear_all().unwrap();
        assert!(creds.get_token().unwrap().is_none());
        assert!(creds.get_refresh_token().unwrap().is_none());
        assert!(creds.get_tenant_id().unwrap().is_none());
        assert!(creds.get_user().unwrap().is_none());
    }

    #[test]
    fn test_debug_never_prints_secrets() {
        let store = MemorySecureStore::new();
        store.set_item(AUTH_TOKEN_KEY, SecretString::from("jwt-secret".to_string())).unwrap();
        let debug = format!("{store:?}");
        assert!(debug.contains("auth_token"));
        assert!(!debug.contains("jwt-secret"));
    }
}
