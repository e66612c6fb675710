// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;

use crate::{error::Result, password};

/// Create an account and log in to it.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// Your full name, as it should appear on reports.
    #[arg(long)]
    name: Option<String>,

    /// The industry you work in. The service compares clauses against its norms.
    #[arg(long)]
    industry: Option<String>,

    /// The email address to register.
    #[clap()]
    email: String,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, cx: &super::Context) -> Result<()> {
        let password = cx
            .password(password::Request::new(&self.email).confirmed())
            .await?;
        let user = cx
            .workspace
            .register(
                &self.email,
                &password,
                self.name.as_deref(),
                self.industry.as_deref(),
            )
            .await?;
        println!(
            "Welcome, {}! You are on the {} plan.",
            user.display_name(),
            user.tier
        );
        Ok(())
    }
}
