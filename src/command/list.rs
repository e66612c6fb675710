// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use core::num;

use async_trait::async_trait;
use clap::Parser;

use crate::{error::Result, gate::Route, view};

/// List your contracts, newest first.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// The number of contracts to show.
    #[arg(short, long)]
    count: Option<num::NonZeroUsize>,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, cx: &super::Context) -> Result<()> {
        cx.enter(Route::Contracts).await?;

        cx.workspace.reload().await?;
        let contracts = cx.workspace.contracts().await?;
        if contracts.is_empty() {
            println!("No contracts yet. Upload one to get started.");
            return Ok(());
        }

        let mut rows = vec![];
        for contract in contracts
            .iter()
            .take(self.count.map_or(usize::MAX, num::NonZeroUsize::get))
        {
            let origin = cx.workspace.origin(contract.id()).await;
            rows.push(view::ContractRow::new(contract, origin));
        }
        println!("{}", view::contracts(rows));
        Ok(())
    }
}
