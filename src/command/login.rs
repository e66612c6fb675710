// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;

use crate::{error::Result, password};

/// Log in to the service.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// The email address of the account.
    #[clap()]
    email: String,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, cx: &super::Context) -> Result<()> {
        let password = cx.password(password::Request::new(&self.email)).await?;
        let user = cx.workspace.login(&self.email, &password).await?;
        println!("Logged in as {} ({} plan).", user.display_name(), user.tier);
        Ok(())
    }
}
