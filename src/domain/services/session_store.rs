#[cfg(test)]
#[path = "session_store_test.rs"]
mod tests;

use parking_lot::Mutex;
use thiserror::Error;

use crate::domain::models::AuthResponse;
use crate::domain::models::ClientResult;
use crate::domain::models::GatewayArc;
use crate::domain::models::LoginRequest;
use crate::domain::models::RegisterRequest;
use crate::domain::models::StorageArc;
use crate::domain::models::User;
use crate::domain::models::TOKEN_KEY;
use crate::domain::models::USER_KEY;

pub const GUEST_LIMIT: u32 = 3;

/// Why a persisted session could not be restored. Only used to decide what to
/// clean up, never handed to callers.
#[derive(Error, Debug, PartialEq)]
pub enum RestoreError {
    #[error("no persisted session")]
    Empty,
    #[error("persisted session has no token")]
    MissingToken,
    #[error("persisted session has no user")]
    MissingUser,
    #[error("persisted session has an empty {0}")]
    EmptyValue(&'static str),
    #[error("persisted user is unreadable: {0}")]
    InvalidUser(String),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionState {
    pub user: Option<User>,
    pub token: Option<String>,
    pub guest_todo_count: u32,
    pub error: Option<String>,
    pub is_loading: bool,
}

impl SessionState {
    /// Authenticated means holding both a user and a non-empty token. There is
    /// no separate flag to fall out of sync with them.
    pub fn is_authenticated(&self) -> bool {
        let has_token = self
            .token
            .as_ref()
            .map(|token| return !token.is_empty())
            .unwrap_or(false);

        return has_token && self.user.is_some();
    }

    pub fn guest_remaining(&self) -> u32 {
        return GUEST_LIMIT.saturating_sub(self.guest_todo_count);
    }

    pub fn is_guest_limit_reached(&self) -> bool {
        return self.guest_todo_count >= GUEST_LIMIT;
    }

    fn clear_auth(&mut self) {
        self.user = None;
        self.token = None;
        self.error = None;
    }
}

/// Reads `token` and `user` from storage and checks that together they form a
/// usable session.
pub fn read_persisted_session(storage: &StorageArc) -> Result<(String, User), RestoreError> {
    let (token, user) = match (storage.get_item(TOKEN_KEY), storage.get_item(USER_KEY)) {
        (None, None) => return Err(RestoreError::Empty),
        (None, Some(_)) => return Err(RestoreError::MissingToken),
        (Some(_), None) => return Err(RestoreError::MissingUser),
        (Some(token), Some(user)) => (token, user),
    };

    // Keys that exist but hold nothing count as a broken session, not an absent one.
    if token.is_empty() {
        return Err(RestoreError::EmptyValue(TOKEN_KEY));
    }
    if user.is_empty() {
        return Err(RestoreError::EmptyValue(USER_KEY));
    }

    let user = serde_json::from_str::<User>(&user)
        .map_err(|err| return RestoreError::InvalidUser(err.to_string()))?;
    if user.id.is_null() {
        return Err(RestoreError::InvalidUser("user id is null".to_string()));
    }

    return Ok((token, user));
}

/// Authentication status, credentials and the guest quota for one client.
pub struct SessionStore {
    gateway: GatewayArc,
    storage: StorageArc,
    state: Mutex<SessionState>,
}

impl SessionStore {
    pub fn new(gateway: GatewayArc, storage: StorageArc) -> SessionStore {
        return SessionStore {
            gateway,
            storage,
            state: Mutex::new(SessionState::default()),
        };
    }

    pub fn snapshot(&self) -> SessionState {
        return self.state.lock().clone();
    }

    pub fn is_authenticated(&self) -> bool {
        return self.state.lock().is_authenticated();
    }

    pub fn current_user(&self) -> Option<User> {
        return self.state.lock().user.clone();
    }

    pub fn auth_token(&self) -> Option<String> {
        return self.state.lock().token.clone();
    }

    pub fn auth_error(&self) -> Option<String> {
        return self.state.lock().error.clone();
    }

    pub fn is_auth_loading(&self) -> bool {
        return self.state.lock().is_loading;
    }

    pub fn guest_todo_count(&self) -> u32 {
        return self.state.lock().guest_todo_count;
    }

    pub fn guest_limit(&self) -> u32 {
        return GUEST_LIMIT;
    }

    pub fn guest_remaining(&self) -> u32 {
        return self.state.lock().guest_remaining();
    }

    pub fn is_guest_limit_reached(&self) -> bool {
        return self.state.lock().is_guest_limit_reached();
    }

    pub fn init_auth(&self) {
        self.restore();
    }

    /// Brings the in-memory session in line with storage. A broken or partial
    /// persisted session is wiped and the store stays anonymous. Never fails.
    pub fn restore(&self) {
        match read_persisted_session(&self.storage) {
            Ok((token, user)) => {
                tracing::debug!(user_id = %user.id, "Restored persisted session");
                let mut state = self.state.lock();
                state.token = Some(token);
                state.user = Some(user);
            }
            Err(RestoreError::Empty) => {
                let mut state = self.state.lock();
                state.token = None;
                state.user = None;
            }
            Err(err) => {
                tracing::warn!(error = %err, "Discarding corrupt persisted session");
                self.remove_persisted();
                let mut state = self.state.lock();
                state.token = None;
                state.user = None;
            }
        }
    }

    #[allow(clippy::implicit_return)]
    pub async fn login(&self, req: LoginRequest) -> ClientResult<String> {
        self.begin();
        let res = self.gateway.login(req).await;
        return self.settle_auth("login", res);
    }

    #[allow(clippy::implicit_return)]
    pub async fn register(&self, req: RegisterRequest) -> ClientResult<String> {
        self.begin();
        let res = self.gateway.register(req).await;
        return self.settle_auth("register", res);
    }

    pub fn logout(&self) {
        self.state.lock().clear_auth();
        self.remove_persisted();
        tracing::debug!("Logged out");
    }

    /// Refreshes the guest counter from the service. Failures are logged and
    /// the counter keeps its last value.
    pub async fn fetch_guest_todo_count(&self) {
        match self.gateway.guest_todo_count().await {
            Ok(count) => self.set_guest_todo_count(count),
            Err(err) => {
                tracing::warn!(error = %err, "Failed to fetch guest todo count");
            }
        }
    }

    pub fn set_guest_todo_count(&self, count: u32) {
        self.state.lock().guest_todo_count = count;
    }

    pub fn increment_guest_count(&self) {
        let mut state = self.state.lock();
        state.guest_todo_count = state.guest_todo_count.saturating_add(1);
    }

    pub fn decrement_guest_count(&self) {
        let mut state = self.state.lock();
        state.guest_todo_count = state.guest_todo_count.saturating_sub(1);
    }

    pub fn clear_error(&self) {
        self.state.lock().error = None;
    }

    fn begin(&self) {
        let mut state = self.state.lock();
        state.is_loading = true;
        state.error = None;
    }

    fn settle_auth(&self, action: &str, res: ClientResult<AuthResponse>) -> ClientResult<String> {
        match res {
            Ok(auth) => {
                {
                    let mut state = self.state.lock();
                    state.is_loading = false;
                    state.error = None;
                    state.user = Some(auth.user.clone());
                    state.token = Some(auth.token.to_string());
                }
                self.persist(&auth.token, &auth.user);
                tracing::debug!(action = action, user_id = %auth.user.id, "Authenticated");

                return Ok(auth.message.unwrap_or_default());
            }
            Err(err) => {
                tracing::error!(action = action, error = %err, "Authentication failed");
                let mut state = self.state.lock();
                state.is_loading = false;
                state.error = Some(err.message());

                return Err(err);
            }
        }
    }

    fn persist(&self, token: &str, user: &User) {
        let user_json = match serde_json::to_string(user) {
            Ok(val) => val,
            Err(err) => {
                tracing::error!(error = ?err, "Failed to serialize user for storage");
                return;
            }
        };

        if let Err(err) = self.storage.set_item(TOKEN_KEY, token) {
            tracing::error!(error = ?err, "Failed to persist token");
        }
        if let Err(err) = self.storage.set_item(USER_KEY, &user_json) {
            tracing::error!(error = ?err, "Failed to persist user");
        }
    }

    fn remove_persisted(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(err) = self.storage.remove_item(key) {
                tracing::warn!(error = ?err, key = key, "Failed to remove persisted session key");
            }
        }
    }
}
