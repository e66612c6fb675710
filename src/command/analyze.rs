// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;

use crate::{error::Result, gate::Route, model::contract::ContractId};

/// Start the analysis of a pending contract.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// The ID of the contract.
    #[clap()]
    id: String,
}

/// Runs the analysis and reports where the contract ended up.
pub(crate) async fn run(cx: &super::Context, id: &ContractId) -> Result<()> {
    let analyzing = cx.workspace.analyze(id).await?;
    println!("Analysis of \"{}\" started.", analyzing.title);

    // The service may already have finished; show whatever it reports now.
    if let Some(contract) = cx.workspace.refresh(id).await? {
        match contract.risk() {
            Some(risk) => println!("Analysis complete: risk {risk}."),
            None => println!("Status: {}.", contract.status()),
        }
    }
    Ok(())
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, cx: &super::Context) -> Result<()> {
        let id = ContractId::from(self.id);
        cx.enter(Route::Contract(id.clone())).await?;
        run(cx, &id).await
    }
}
