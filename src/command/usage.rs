// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use log::warn;

use crate::{error::Result, gate::Route, view};

/// Show how much of this month's allowance is left.
#[derive(Debug, Parser)]
pub(crate) struct Command {}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, cx: &super::Context) -> Result<()> {
        cx.enter(Route::Pricing).await?;

        let snapshot = cx.workspace.quota().await?;
        let plan = match cx.workspace.plan_usage().await {
            Ok(plan) => Some(plan),
            Err(e) if e.is_handled() => return Err(e),
            Err(e) => {
                warn!("The service did not report plan usage: {}", e);
                None
            }
        };
        println!("{}", view::usage(&snapshot, plan.as_ref()));
        Ok(())
    }
}
