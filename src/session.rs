//! Signed-in session
//!
//! An explicit context object holding the current user and their bearer
//! token. Whoever needs credentials gets a [`Session`] (or a
//! [`SharedSession`]) handed to them; nothing reads auth state from a
//! global.
use crate::{
    api::{ApiError, SharedMarketplaceApi},
    auction::{User, UserId},
    profile::ProfileUpdate,
};
use anyhow::Result;
use parking_lot::Mutex;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use thiserror::Error;
use tracing::{debug, info, warn};

mod file;
pub use self::file::*;

/// Where the bearer token survives between runs
pub trait TokenStore {
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, token: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

pub type SharedTokenStore = Arc<dyn TokenStore + Send + Sync + 'static>;

/// Fake in-memory token store.
///
/// Useful for unit-tests.
#[derive(Default)]
pub struct InMemoryTokenStore(Mutex<Option<String>>);

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self(Mutex::new(Some(token.to_owned())))
    }

    pub fn new_shared() -> SharedTokenStore {
        Arc::new(Self::new())
    }
}

impl TokenStore for InMemoryTokenStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.0.lock().clone())
    }

    fn save(&self, token: &str) -> Result<()> {
        *self.0.lock() = Some(token.to_owned());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.0.lock() = None;
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("not signed in")]
    NotAuthenticated,
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("token store: {0}")]
    Store(#[source] anyhow::Error),
}

/// What a request on behalf of the user needs
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    pub user_id: UserId,
    pub token: String,
}

/// Counts sign-ins and sign-outs
///
/// Work started on behalf of a user remembers the epoch it began in; if
/// it moved on by the time the work finishes, the result belongs to a
/// session that no longer exists. Readable without locking the session.
#[derive(Clone, Debug, Default)]
pub struct SessionEpoch(Arc<AtomicU64>);

impl SessionEpoch {
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    fn advance(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct Session {
    api: SharedMarketplaceApi,
    epoch: SessionEpoch,
    token_store: SharedTokenStore,
    user: Option<User>,
    token: Option<String>,
    initialized: bool,
    last_error: Option<String>,
}

pub type SharedSession = Arc<tokio::sync::Mutex<Session>>;

impl Session {
    pub fn new(api: SharedMarketplaceApi, token_store: SharedTokenStore) -> Self {
        Self {
            api,
            epoch: SessionEpoch::default(),
            token_store,
            user: None,
            token: None,
            initialized: false,
            last_error: None,
        }
    }

    pub fn into_shared(self) -> SharedSession {
        Arc::new(tokio::sync::Mutex::new(self))
    }

    /// Hydrate from the token store
    ///
    /// Never fails: a missing or rejected token just leaves the session
    /// signed out, with the reason in [`Session::last_error`].
    pub async fn initialize(&mut self) {
        match self.token_store.load() {
            Ok(Some(token)) => match self.api.current_user(&token).await {
                Ok(user) => {
                    info!(user = %user.id, "session restored");
                    self.user = Some(user);
                    self.token = Some(token);
                    self.last_error = None;
                }
                Err(e) => {
                    warn!(error = %e, "stored token rejected");
                    self.user = None;
                    self.token = None;
                    self.last_error = Some(e.to_string());
                }
            },
            Ok(None) => debug!("no stored token"),
            Err(e) => {
                warn!(error = %e, "failed to read token store");
                self.last_error = Some(e.to_string());
            }
        }
        self.initialized = true;
    }

    pub async fn login_with_google(&mut self, id_token: &str) -> Result<&User, SessionError> {
        self.last_error = None;
        let grant = match self.api.google_auth(id_token).await {
            Ok(grant) => grant,
            Err(e) => {
                self.last_error = Some(e.to_string());
                return Err(e.into());
            }
        };

        self.token_store
            .save(&grant.token)
            .map_err(SessionError::Store)?;
        info!(user = %grant.user.id, "signed in");

        self.epoch.advance();
        self.token = Some(grant.token);
        Ok(self.user.insert(grant.user))
    }

    pub fn logout(&mut self) -> Result<(), SessionError> {
        self.epoch.advance();
        self.user = None;
        self.token = None;
        self.last_error = None;
        self.token_store.clear().map_err(SessionError::Store)?;
        info!("signed out");
        Ok(())
    }

    /// Re-read the user record, e.g. after a profile edit
    pub async fn refresh_user(&mut self) -> Result<&User, SessionError> {
        let token = self.token.as_deref().ok_or(SessionError::NotAuthenticated)?;
        let user = self.api.current_user(token).await?;
        Ok(self.user.insert(user))
    }

    /// Send a validated profile edit and pick up the server's copy of the user
    pub async fn update_profile(&mut self, update: &ProfileUpdate) -> Result<String, SessionError> {
        let Credentials { user_id, token } = self.credentials()?;
        let msg = self
            .api
            .update_profile_info(&token, &user_id, update)
            .await?;
        info!(field = update.field(), "profile updated");
        self.refresh_user().await?;
        Ok(msg)
    }

    pub fn credentials(&self) -> Result<Credentials, SessionError> {
        match (&self.user, &self.token) {
            (Some(user), Some(token)) => Ok(Credentials {
                user_id: user.id.clone(),
                token: token.clone(),
            }),
            _ => Err(SessionError::NotAuthenticated),
        }
    }

    pub fn epoch(&self) -> &SessionEpoch {
        &self.epoch
    }

    pub fn api(&self) -> &SharedMarketplaceApi {
        &self.api
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }
}
