use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::models::ItemId;

pub mod directory;
pub mod storage;

pub use directory::{Identity, IdentityDirectory};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};

/// Durable slot holding the last known session.
pub const SESSION_KEY: &str = "streamverse_user";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email already in use")]
    EmailAlreadyRegistered,

    #[error("Failed to encode session: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Item ids in insertion order, never duplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ItemId>", into = "Vec<ItemId>")]
pub struct Watchlist(Vec<ItemId>);

impl Watchlist {
    pub fn contains(&self, id: ItemId) -> bool {
        self.0.contains(&id)
    }

    /// Returns `false` when the id was already present.
    pub fn insert(&mut self, id: ItemId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.0.push(id);
        true
    }

    /// Returns `false` when the id was absent.
    pub fn remove(&mut self, id: ItemId) -> bool {
        let before = self.0.len();
        self.0.retain(|x| *x != id);
        self.0.len() != before
    }

    pub fn ids(&self) -> &[ItemId] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<ItemId>> for Watchlist {
    fn from(ids: Vec<ItemId>) -> Self {
        let mut list = Watchlist::default();
        for id in ids {
            list.insert(id);
        }
        list
    }
}

impl From<Watchlist> for Vec<ItemId> {
    fn from(list: Watchlist) -> Self {
        list.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub watchlist: Watchlist,
    #[serde(default)]
    pub signed_in_at: Option<DateTime<Utc>>,
}

impl Session {
    fn from_identity(identity: &Identity) -> Self {
        Self {
            id: identity.id.clone(),
            email: identity.email.clone(),
            name: identity.name.clone(),
            watchlist: identity.watchlist.clone(),
            signed_in_at: Some(Utc::now()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated(Session),
}

/// Owns the signed-in identity and keeps the durable slot in step with it.
///
/// Every mutation writes the full record before the in-memory state changes,
/// so memory always matches the last successful write.
pub struct SessionStore {
    state: SessionState,
    store: Arc<dyn KeyValueStore>,
    directory: IdentityDirectory,
}

impl SessionStore {
    /// Restores the last known session, if the slot holds a readable one.
    pub fn open(store: Arc<dyn KeyValueStore>, directory: IdentityDirectory) -> Self {
        let state = match store.get(SESSION_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Session>(&raw) {
                Ok(session) => {
                    info!("Restored session for {}", session.email);
                    SessionState::Authenticated(session)
                }
                Err(e) => {
                    warn!("Discarding unreadable stored session: {}", e);
                    if let Err(e) = store.remove(SESSION_KEY) {
                        warn!("Failed to clear unreadable session: {}", e);
                    }
                    SessionState::Unauthenticated
                }
            },
            Ok(None) => SessionState::Unauthenticated,
            Err(e) => {
                warn!("Failed to read stored session: {}", e);
                SessionState::Unauthenticated
            }
        };

        let mut this = Self {
            state,
            store,
            directory,
        };
        if let SessionState::Authenticated(session) = &this.state {
            this.directory.restore(session);
        }
        this
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn current(&self) -> Option<&Session> {
        match &self.state {
            SessionState::Authenticated(session) => Some(session),
            SessionState::Unauthenticated => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    pub fn directory(&self) -> &IdentityDirectory {
        &self.directory
    }

    pub fn authenticate(&mut self, email: &str, secret: &str) -> Result<Session, SessionError> {
        let session = match self.directory.verify(email, secret) {
            Ok(identity) => Session::from_identity(identity),
            Err(e) => {
                info!("Sign-in rejected");
                return Err(e);
            }
        };
        self.commit(session.clone())?;
        info!("Signed in {}", session.email);
        Ok(session)
    }

    pub fn register(
        &mut self,
        email: &str,
        secret: &str,
        name: &str,
    ) -> Result<Session, SessionError> {
        let identity = self
            .directory
            .insert(email, secret, name, Watchlist::default())?;
        let session = Session::from_identity(&identity);
        self.commit(session.clone())?;
        info!("Registered {} as identity {}", session.email, session.id);
        Ok(session)
    }

    /// Signing out twice is fine. The slot is cleared either way, so a record
    /// left behind by a failed restore does not linger.
    pub fn deauthenticate(&mut self) -> Result<(), SessionError> {
        self.store.remove(SESSION_KEY)?;
        if let SessionState::Authenticated(session) =
            std::mem::replace(&mut self.state, SessionState::Unauthenticated)
        {
            info!("Signed out {}", session.email);
        }
        Ok(())
    }

    /// Returns whether the watchlist changed.
    pub fn add_to_watchlist(&mut self, id: ItemId) -> Result<bool, SessionError> {
        let Some(current) = self.current() else {
            return Ok(false);
        };
        if current.watchlist.contains(id) {
            return Ok(false);
        }
        let mut next = current.clone();
        next.watchlist.insert(id);
        self.commit(next)?;
        debug!("Added item {} to watchlist", id);
        Ok(true)
    }

    /// Returns whether the watchlist changed.
    pub fn remove_from_watchlist(&mut self, id: ItemId) -> Result<bool, SessionError> {
        let Some(current) = self.current() else {
            return Ok(false);
        };
        if !current.watchlist.contains(id) {
            return Ok(false);
        }
        let mut next = current.clone();
        next.watchlist.remove(id);
        self.commit(next)?;
        debug!("Removed item {} from watchlist", id);
        Ok(true)
    }

    pub fn is_in_watchlist(&self, id: ItemId) -> bool {
        self.current().is_some_and(|s| s.watchlist.contains(id))
    }

    pub fn close(self) {
        match &self.state {
            SessionState::Authenticated(s) => info!("Closing session store ({} signed in)", s.email),
            SessionState::Unauthenticated => info!("Closing session store (signed out)"),
        }
    }

    fn commit(&mut self, session: Session) -> Result<(), SessionError> {
        let raw = serde_json::to_string(&session)?;
        self.store.set(SESSION_KEY, &raw)?;
        self.directory
            .sync_watchlist(&session.id, &session.watchlist);
        self.state = SessionState::Authenticated(session);
        Ok(())
    }
}
