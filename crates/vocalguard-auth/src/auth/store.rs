//! The session store: current token and user, mirrored to storage, updated by
//! the auth API calls.
//!
//! Every operation returns an [`AuthOutcome`]; no error escapes as `Err`.
//! Storage is written before memory, under the session lock, so a failed
//! write leaves the in-memory session untouched and concurrent sign-ins
//! settle on whichever committed last.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{ApiError, AuthClient, AuthPayload, HttpTransport};

use super::outcome::AuthOutcome;
use super::session::Session;
use super::storage::SessionStorage;

pub struct SessionStore {
    client: AuthClient,
    storage: Arc<dyn SessionStorage>,
    session: RwLock<Session>,
    authenticated: watch::Sender<bool>,
}

impl SessionStore {
    /// Create a store, loading any persisted session from `storage`.
    pub fn new(
        storage: Arc<dyn SessionStorage>,
        transport: Arc<dyn HttpTransport>,
        base_url: impl Into<String>,
    ) -> Self {
        Self::with_client(storage, AuthClient::new(transport, base_url))
    }

    pub fn with_client(storage: Arc<dyn SessionStorage>, client: AuthClient) -> Self {
        let session = Session::load(storage.as_ref());
        let (authenticated, _) = watch::channel(session.is_authenticated());
        Self {
            client,
            storage,
            session: RwLock::new(session),
            authenticated,
        }
    }

    pub async fn signup(&self, email: &str, password: &str) -> AuthOutcome {
        let result = self.client.signup(email, password).await;
        self.finish_sign_in("signup", result)
    }

    pub async fn login(&self, email: &str, password: &str) -> AuthOutcome {
        let result = self.client.login(email, password).await;
        self.finish_sign_in("login", result)
    }

    pub async fn google_login(&self, credential: &str) -> AuthOutcome {
        let result = self.client.google_login(credential).await;
        self.finish_sign_in("google_login", result)
    }

    /// Clear the session from memory and storage. No network call.
    pub fn logout(&self) {
        self.clear();
        info!("Logged out");
    }

    pub fn token(&self) -> Option<String> {
        self.read_session().token.clone()
    }

    pub fn user(&self) -> Option<Value> {
        self.read_session().user.clone()
    }

    /// Snapshot of the current session.
    pub fn session(&self) -> Session {
        self.read_session().clone()
    }

    /// Recomputed from the current token on every call.
    pub fn is_authenticated(&self) -> bool {
        self.read_session().is_authenticated()
    }

    /// Receiver that sees every change to [`is_authenticated`](Self::is_authenticated).
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.authenticated.subscribe()
    }

    /// Refresh the user profile with the stored token.
    ///
    /// A 401 with a readable body clears the whole session before the failure
    /// is returned. A response that lands after a concurrent `logout` still
    /// writes the user key, leaving a stored user with no token until the next
    /// sign-in or logout.
    pub async fn current_user(&self) -> AuthOutcome {
        let Some(token) = self.token() else {
            return ApiError::AuthRequired.into();
        };

        let result = match self.client.current_user(&token).await {
            Ok(user) => self.commit_user(user),
            Err(e) => {
                if e.is_unauthorized() {
                    debug!("Token rejected, clearing session");
                    self.clear();
                }
                Err(e)
            }
        };

        if let Err(ref e) = result {
            warn!(error = %e, "Get current user failed");
        }
        result.into()
    }

    /// [`current_user`](Self::current_user) when a token is present, otherwise
    /// a failure with no message and no network call.
    pub async fn check_auth(&self) -> AuthOutcome {
        if self.is_authenticated() {
            self.current_user().await
        } else {
            AuthOutcome::unattempted()
        }
    }

    fn finish_sign_in(
        &self,
        operation: &'static str,
        result: Result<AuthPayload, ApiError>,
    ) -> AuthOutcome {
        match result.and_then(|payload| self.commit(payload)) {
            Ok(user) => {
                info!(operation, "Signed in");
                AuthOutcome::success(user)
            }
            Err(e) => {
                warn!(operation, error = %e, "Sign-in failed");
                e.into()
            }
        }
    }

    fn commit(&self, payload: AuthPayload) -> Result<Value, ApiError> {
        let user = payload.user.clone();
        let next = Session::new(payload.token, payload.user);

        let mut session = self.write_session();
        next.save(self.storage.as_ref()).map_err(ApiError::storage)?;
        *session = next;
        // Published under the lock so subscribers see changes in session order
        self.publish(true);
        drop(session);

        Ok(user)
    }

    fn commit_user(&self, user: Value) -> Result<Value, ApiError> {
        let mut session = self.write_session();
        Session::save_user(&user, self.storage.as_ref()).map_err(ApiError::storage)?;
        session.user = Some(user.clone());
        Ok(user)
    }

    fn clear(&self) {
        let mut session = self.write_session();
        *session = Session::default();
        if let Err(e) = Session::erase(self.storage.as_ref()) {
            warn!(error = %e, "Failed to remove stored session");
        }
        self.publish(false);
        drop(session);
    }

    fn publish(&self, authenticated: bool) {
        self.authenticated.send_if_modified(|current| {
            let changed = *current != authenticated;
            *current = authenticated;
            changed
        });
    }

    fn read_session(&self) -> RwLockReadGuard<'_, Session> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_session(&self) -> RwLockWriteGuard<'_, Session> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }
}
