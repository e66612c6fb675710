// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;

use crate::error::Result;

/// Forget the stored session. Logging out while logged out does nothing.
#[derive(Debug, Parser)]
pub(crate) struct Command {}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, cx: &super::Context) -> Result<()> {
        cx.session.logout().await;
        println!("Logged out.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        command::Command as _,
        credentials::Token,
        testing::{self, user},
    };

    use super::*;

    #[tokio::test]
    async fn logout_twice_succeeds() -> Result<()> {
        let (cx, navigator) = testing::context();
        cx.session.hydrate().await;
        cx.session.set_auth(user(), Token::new("secret-token")).await?;

        Command {}.execute(&cx).await?;
        assert!(!cx.session.snapshot().is_authenticated());
        Command {}.execute(&cx).await?;
        assert!(navigator.visits().is_empty());
        Ok(())
    }
}
