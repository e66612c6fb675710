// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;

use crate::{error::Result, gate::Route, model::contract::ContractId};

/// Delete a contract.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// The ID of the contract.
    #[clap()]
    id: String,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, cx: &super::Context) -> Result<()> {
        let id = ContractId::from(self.id);
        cx.enter(Route::Contract(id.clone())).await?;

        cx.workspace.delete(&id).await?;
        println!("Deleted contract {id}.");
        Ok(())
    }
}
