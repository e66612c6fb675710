// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretVec};
use serde::{Deserialize, Serialize};

use crate::{
    error::{self, Result},
    metadata,
};

use super::{IsPersistent, Storage};

/// An item in the default Secret Service collection, located by the slot key
/// and service URL.
pub(crate) struct SecretService {
    keyring: oo7::Keyring,
    label: String,
    attributes: HashMap<String, String>,
}

impl SecretService {
    async fn item(&self) -> Result<Option<oo7::Item>> {
        Ok(self
            .keyring
            .search_items(self.attribute_refs())
            .await
            .map_err(error::Storage::from)?
            .into_iter()
            .next())
    }

    fn attribute_refs(&self) -> HashMap<&str, &str> {
        self.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect()
    }

    pub(crate) async fn new(url: &url::Url, key: &str) -> Result<Self> {
        let prefix = &*metadata::CLIENT_NAME;
        Ok(Self {
            keyring: oo7::Keyring::new().await.map_err(error::Storage::from)?,
            label: format!("{} {}", *metadata::CLIENT_DISPLAY_NAME, key),
            attributes: HashMap::from([
                (format!("{prefix}.kind"), key.to_owned()),
                (format!("{prefix}.url"), url.as_str().to_owned()),
            ]),
        })
    }
}

impl IsPersistent for SecretService {
    fn is_persistent(&self) -> bool {
        true
    }
}

#[async_trait]
impl<T: for<'de> Deserialize<'de> + Send + Serialize + Sync> Storage<T> for SecretService {
    async fn get(&mut self) -> Result<Option<T>> {
        let data = match self.item().await? {
            Some(item) => {
                let secret = item.secret().await.map_err(error::Storage::from)?;
                Some(serde_json::from_slice(&secret)?)
            }
            None => None,
        };
        Ok(data)
    }

    async fn update(&mut self, data: &T) -> Result<()> {
        self.keyring
            .create_item(
                &self.label,
                self.attribute_refs(),
                SecretVec::new(serde_json::to_vec(data)?).expose_secret(),
                true,
            )
            .await
            .map_err(error::Storage::from)?;
        Ok(())
    }

    async fn clear(&mut self) -> Result<()> {
        if let Some(item) = self.item().await? {
            item.delete().await.map_err(error::Storage::from)?;
        }
        Ok(())
    }
}
