// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;

use crate::{
    error::{Error, Result},
    gate::Route,
    view,
};

/// Show the logged-in account.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// Read the profile from the service instead of the stored copy, picking
    /// up any plan changes.
    #[arg(long)]
    refresh: bool,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, cx: &super::Context) -> Result<()> {
        cx.enter(Route::Dashboard).await?;

        let user = if self.refresh {
            cx.workspace.refresh_profile().await?
        } else {
            cx.session
                .snapshot()
                .user()
                .cloned()
                .ok_or(Error::AccessDenied)?
        };
        println!("{}", view::profile(&user));
        Ok(())
    }
}
