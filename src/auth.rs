//! Session handling: credential exchange, token storage and session checks.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::api::models::User;
use crate::api::ApiClient;
use crate::error::{RasadError, Result};

/// Where the bearer token lives between requests.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, token: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;

    /// Whether a saved token outlives the process.
    fn is_persistent(&self) -> bool {
        false
    }
}

/// Keeps the token for the lifetime of the process only.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self
            .token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone())
    }

    fn save(&self, token: &str) -> Result<()> {
        *self
            .token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self
            .token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        Ok(())
    }
}

/// Persists the token to a private file so separate CLI invocations share a login.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let token = fs::read_to_string(&self.path)?;
        let token = token.trim();
        if token.is_empty() {
            Ok(None)
        } else {
            Ok(Some(token.to_string()))
        }
    }

    fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RasadError::Io(e)),
        }
    }

    fn is_persistent(&self) -> bool {
        true
    }
}

/// The authenticated (or not) user session, wrapping a shared [`ApiClient`].
#[derive(Clone)]
pub struct Session {
    client: ApiClient,
    store: Arc<dyn TokenStore>,
}

impl Session {
    /// Picks up any token the store already holds.
    pub fn new(client: ApiClient, store: Arc<dyn TokenStore>) -> Self {
        match store.load() {
            Ok(Some(token)) => {
                tracing::debug!("Restored stored session token");
                client.set_token(token);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Could not read stored token: {}", e),
        }
        Self { client, store }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn is_logged_in(&self) -> bool {
        self.client.has_token()
    }

    /// False when the token is lost once the process exits.
    pub fn keeps_token(&self) -> bool {
        self.store.is_persistent()
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let token = self.client.login(username, password).await?;
        self.client.set_token(&token.access_token);
        if let Err(e) = self.store.save(&token.access_token) {
            tracing::warn!("Could not persist session token: {}", e);
        }
        tracing::info!("Logged in as {}", username);
        Ok(())
    }

    pub fn logout(&self) {
        self.client.clear_token();
        if let Err(e) = self.store.clear() {
            tracing::warn!("Could not remove stored token: {}", e);
        }
        tracing::info!("Logged out");
    }

    /// Validates the held token against `/auth/me`.
    ///
    /// Returns `None` without a request when no token is held; any failure
    /// drops the token.
    pub async fn check_session(&self) -> Option<User> {
        if !self.client.has_token() {
            tracing::debug!("No token found");
            return None;
        }

        match self.client.me().await {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!("Auth check failed: {}", e);
                self.logout();
                None
            }
        }
    }

    /// Forget a token the server has rejected.
    pub fn expire(&self) {
        self.logout();
    }
}

/// Name shown in the header bar for a user
pub fn display_name(user: &User) -> String {
    if !user.email.is_empty() {
        return user.email.clone();
    }
    user.full_name
        .clone()
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "کاربر".to_string())
}
