// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use futures_util::lock::Mutex;
use log::{debug, info, warn};
use tokio::sync::watch;

use crate::{
    credentials::{CredentialStore, Stored, Token},
    error::Result,
    model::user::{Tier, User},
};

/// The authenticated caller: a profile and the token issued with it.
#[derive(Clone, Debug)]
pub(crate) struct Identity {
    user: User,
    token: Token,
}

/// A point-in-time view of the session.
///
/// The user and token are only ever present together.
#[derive(Clone, Debug, Default)]
pub(crate) struct Session {
    identity: Option<Identity>,
    hydrated: bool,
}

impl Session {
    pub(crate) fn user(&self) -> Option<&User> {
        self.identity.as_ref().map(|identity| &identity.user)
    }

    pub(crate) fn token(&self) -> Option<&Token> {
        self.identity.as_ref().map(|identity| &identity.token)
    }

    pub(crate) fn tier(&self) -> Option<&Tier> {
        self.user().map(|user| &user.tier)
    }

    pub(crate) const fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Whether the stored session has been read. Never reverts once set.
    pub(crate) const fn is_hydrated(&self) -> bool {
        self.hydrated
    }
}

/// Owner of the session and the only writer of stored credentials.
///
/// Changes are published as whole [`Session`] values, so subscribers never
/// observe a token without its user.
pub(crate) struct SessionManager {
    store: Mutex<CredentialStore>,
    state: watch::Sender<Session>,
}

impl SessionManager {
    pub(crate) fn new(store: CredentialStore) -> Self {
        let (state, _) = watch::channel(Session::default());
        Self {
            store: Mutex::new(store),
            state,
        }
    }

    pub(crate) fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Restores the session from storage. Only the first call has any effect.
    ///
    /// Missing, partial, or unreadable credentials leave the session
    /// unauthenticated; the latter two are removed from storage. The session
    /// is marked hydrated in every case.
    pub(crate) async fn hydrate(&self) {
        let mut store = self.store.lock().await;
        let hydrated = self.state.borrow().hydrated;
        if hydrated {
            debug!("Session already hydrated");
            return;
        }

        let identity = match store.load().await {
            Ok(Stored::Complete(user, token)) => {
                debug!("Restored session for {}", user.email);
                Some(Identity { user, token })
            }
            Ok(Stored::Empty) => None,
            Ok(Stored::Partial) => {
                warn!("Discarding incomplete stored session");
                _ = store.clear().await;
                None
            }
            Err(e) => {
                warn!("Discarding unreadable stored session: {}", e);
                _ = store.clear().await;
                None
            }
        };

        self.state.send_modify(|session| {
            session.identity = identity;
            session.hydrated = true;
        });
    }

    /// Stores a freshly issued token and its profile, then publishes them.
    ///
    /// If storing fails, the session is left as it was and anything partially
    /// written is removed.
    pub(crate) async fn set_auth(&self, user: User, token: Token) -> Result<()> {
        let mut store = self.store.lock().await;
        if let Err(e) = store.save(&user, &token).await {
            _ = store.clear().await;
            return Err(e);
        }

        info!("Authenticated as {}", user.email);
        self.state.send_modify(|session| {
            session.identity = Some(Identity { user, token });
        });
        Ok(())
    }

    /// Forgets the session. Safe to call when already logged out.
    pub(crate) async fn logout(&self) {
        let mut store = self.store.lock().await;
        // Failures are logged by the store; the in-memory session is cleared
        // regardless.
        _ = store.clear().await;

        let cleared = self
            .state
            .send_if_modified(|session| session.identity.take().is_some());
        if cleared {
            info!("Logged out");
        }
    }
}
