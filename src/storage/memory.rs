// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;

use crate::error::Result;

use super::{IsPersistent, Storage};

/// Process-local storage, used when credentials must not outlive the
/// invocation.
pub(crate) struct Memory<T> {
    data: Option<T>,
}

impl<T> Memory<T> {
    pub(crate) const fn new() -> Self {
        Self { data: None }
    }

    #[cfg(test)]
    pub(crate) const fn with(data: T) -> Self {
        Self { data: Some(data) }
    }
}

impl<T> IsPersistent for Memory<T> {
    fn is_persistent(&self) -> bool {
        false
    }
}

#[async_trait]
impl<T: Send + Sync + Clone> Storage<T> for Memory<T> {
    async fn get(&mut self) -> Result<Option<T>> {
        Ok(self.data.clone())
    }

    async fn update(&mut self, data: &T) -> Result<()> {
        self.data = Some(data.clone());
        Ok(())
    }

    async fn clear(&mut self) -> Result<()> {
        self.data = None;
        Ok(())
    }
}

impl<T> Default for Memory<T> {
    fn default() -> Self {
        Self::new()
    }
}
