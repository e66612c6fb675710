// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use log::warn;
use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    error::Result,
    model::user::User,
    storage::{self, IsPersistent as _, Storage},
};

/// Storage key of the bearer token.
pub(crate) const TOKEN_KEY: &str = "access_token";
/// Storage key of the serialized user profile.
pub(crate) const USER_KEY: &str = "user";

/// An opaque bearer credential.
#[derive(Clone, Debug)]
pub(crate) struct Token(SecretString);

impl Token {
    pub(crate) fn new<S: Into<String>>(value: S) -> Self {
        Self(SecretString::new(value.into()))
    }

    pub(crate) fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl Serialize for Token {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.expose())
    }
}

impl<'de> Deserialize<'de> for Token {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

/// What a credential store held at startup.
#[derive(Debug)]
pub(crate) enum Stored {
    Empty,
    /// Only one of the two entries was present.
    Partial,
    Complete(User, Token),
}

/// The two persisted entries making up a session: the bearer token and the
/// user profile it belongs to.
pub(crate) struct CredentialStore {
    token: Box<dyn Storage<Token>>,
    user: Box<dyn Storage<User>>,
}

impl CredentialStore {
    pub(crate) fn new(token: Box<dyn Storage<Token>>, user: Box<dyn Storage<User>>) -> Self {
        Self { token, user }
    }

    pub(crate) fn in_memory() -> Self {
        Self::new(
            Box::new(storage::Memory::<Token>::new()),
            Box::new(storage::Memory::<User>::new()),
        )
    }

    pub(crate) fn is_persistent(&self) -> bool {
        self.token.is_persistent() && self.user.is_persistent()
    }

    /// Reads both entries. A user record that cannot be decoded is an error.
    pub(crate) async fn load(&mut self) -> Result<Stored> {
        let token = self.token.get().await?;
        let user = self.user.get().await?;
        Ok(match (user, token) {
            (Some(user), Some(token)) => Stored::Complete(user, token),
            (None, None) => Stored::Empty,
            (Some(_), None) | (None, Some(_)) => Stored::Partial,
        })
    }

    pub(crate) async fn save(&mut self, user: &User, token: &Token) -> Result<()> {
        self.token.update(token).await?;
        self.user.update(user).await
    }

    /// Removes both entries, attempting the second even if the first fails.
    pub(crate) async fn clear(&mut self) -> Result<()> {
        let token = self.token.clear().await;
        let user = self.user.clear().await;
        let result = token.and(user);
        if let Err(ref e) = result {
            warn!("Could not clear stored credentials: {}", e);
        }
        result
    }
}
