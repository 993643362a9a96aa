use anyhow::{Context, Result};
use tracing::warn;

use super::storage::Storage;
use crate::models::UserRecord;

/// Storage key holding the bearer token
pub const TOKEN_KEY: &str = "authToken";

/// Storage key holding the JSON-encoded user record
pub const USER_KEY: &str = "usuario";

/// Session state for one client: the held token plus its durable mirror.
///
/// The token and the user record are always written together and cleared
/// together, so storage never claims a user without a token or the
/// reverse.
pub struct Session {
    storage: Box<dyn Storage>,
    token: Option<String>,
}

impl Session {
    pub fn new(storage: Box<dyn Storage>) -> Self {
        Self {
            storage,
            token: None,
        }
    }

    /// Restore the held token from storage
    pub fn load(&mut self) -> Result<bool> {
        self.token = self
            .storage
            .get_item(TOKEN_KEY)
            .context("Failed to read stored token")?;
        Ok(self.is_valid())
    }

    /// Persist a freshly issued token together with its user record
    pub fn save(&mut self, token: &str, user: &UserRecord) -> Result<()> {
        let encoded = serde_json::to_string(user)?;
        self.storage
            .set_item(TOKEN_KEY, token)
            .context("Failed to store token")?;
        if let Err(e) = self.storage.set_item(USER_KEY, &encoded) {
            // Keep the pair consistent: no token without its user
            if let Err(rollback) = self.storage.remove_item(TOKEN_KEY) {
                warn!(error = %rollback, "Token left stored without its user record");
            }
            return Err(e).context("Failed to store user record");
        }
        self.token = Some(token.to_string());
        Ok(())
    }

    /// Clear session data
    pub fn clear(&mut self) -> Result<()> {
        self.token = None;
        let token_result = self.storage.remove_item(TOKEN_KEY);
        let user_result = self.storage.remove_item(USER_KEY);
        token_result.context("Failed to remove stored token")?;
        user_result.context("Failed to remove stored user record")?;
        Ok(())
    }

    /// Get the bearer token, if one is held and non-empty
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn is_valid(&self) -> bool {
        self.token().is_some()
    }

    /// Read the persisted user record. Does not look at the token.
    pub fn current_user(&self) -> Result<Option<UserRecord>> {
        let stored = self
            .storage
            .get_item(USER_KEY)
            .context("Failed to read stored user record")?;
        match stored.filter(|s| !s.is_empty()) {
            Some(json) => {
                let user = serde_json::from_str(&json).context("Failed to parse stored user record")?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }
}
