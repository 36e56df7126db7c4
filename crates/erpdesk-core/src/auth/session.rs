use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::models::{seed_profiles, PersonName};
use crate::storage::LocalStorage;

/// Storage key holding the serialized signed-in user
const USER_KEY: &str = "user";

/// Storage key holding the literal "true" while signed in
const AUTH_KEY: &str = "isAuthenticated";

/// Simulated authentication round-trip
pub const DEFAULT_LOGIN_DELAY: Duration = Duration::from_millis(800);

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Username is required")]
    MissingUsername,

    #[error("Password is required")]
    MissingPassword,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Identity of the signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: String,
    pub username: String,
    pub name: PersonName,
    pub email: String,
}

impl SessionUser {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name.first, self.name.last).trim().to_string()
    }

    pub fn initials(&self) -> String {
        self.name.first.chars().take(1)
            .chain(self.name.last.chars().take(1))
            .collect::<String>()
            .to_uppercase()
    }
}

/// Authentication flag and current user, persisted in [`LocalStorage`].
///
/// There is no real credential check: any non-empty username and password
/// sign in, with the identity of the first sample profile under the typed
/// username.
pub struct SessionStore {
    storage: LocalStorage,
    user: Option<SessionUser>,
    login_delay: Duration,
}

impl SessionStore {
    /// Create the store and restore any persisted session
    pub fn new(storage: LocalStorage) -> Self {
        let mut store = Self {
            storage,
            user: None,
            login_delay: DEFAULT_LOGIN_DELAY,
        };
        store.check();
        store
    }

    pub fn with_login_delay(mut self, delay: Duration) -> Self {
        self.login_delay = delay;
        self
    }

    pub fn login_delay(&self) -> Duration {
        self.login_delay
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Re-read the persisted session. Both keys must be present and the user
    /// must parse, otherwise the session counts as signed out.
    pub fn check(&mut self) -> bool {
        let authenticated = self.storage.get(AUTH_KEY) == Some("true");
        self.user = match (authenticated, self.storage.get(USER_KEY)) {
            (true, Some(raw)) => match serde_json::from_str(raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(error = %e, "Stored session user is unreadable");
                    None
                }
            },
            _ => None,
        };
        self.user.is_some()
    }

    /// Input validation shared by the form and [`login`](Self::login)
    pub fn validate(username: &str, password: &str) -> Result<(), SessionError> {
        if username.is_empty() {
            return Err(SessionError::MissingUsername);
        }
        if password.is_empty() {
            return Err(SessionError::MissingPassword);
        }
        Ok(())
    }

    /// Validate, wait out the simulated round-trip, then sign in
    pub async fn login(&mut self, username: &str, password: &str) -> Result<SessionUser, SessionError> {
        Self::validate(username, password)?;
        if !self.login_delay.is_zero() {
            tokio::time::sleep(self.login_delay).await;
        }
        self.complete_login(username)
    }

    /// Record `username` as signed in and persist it
    pub fn complete_login(&mut self, username: &str) -> Result<SessionUser, SessionError> {
        let template = seed_profiles().into_iter().next().unwrap_or_default();
        let user = SessionUser {
            id: template.id,
            username: username.to_string(),
            name: template.name,
            email: template.email,
        };

        let raw = serde_json::to_string(&user).map_err(anyhow::Error::from)?;
        self.storage.set(USER_KEY, raw)?;
        self.storage.set(AUTH_KEY, "true")?;

        info!(username = %username, "Signed in");
        self.user = Some(user.clone());
        Ok(user)
    }

    pub fn logout(&mut self) -> Result<(), SessionError> {
        self.user = None;
        self.storage.remove(USER_KEY)?;
        self.storage.remove(AUTH_KEY)?;
        info!("Signed out");
        Ok(())
    }
}
