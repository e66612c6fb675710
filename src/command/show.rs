// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use log::error;

use crate::{
    error::{self, Result},
    gate::Route,
    model::contract::ContractId,
    view,
};

/// Show a contract and its analysis.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// Also print the text the service extracted from the document.
    #[arg(long)]
    text: bool,

    /// The ID of the contract.
    #[clap()]
    id: String,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, cx: &super::Context) -> Result<()> {
        let id = ContractId::from(self.id);
        cx.enter(Route::Contract(id.clone())).await?;

        let Some(contract) = cx.workspace.open(&id).await? else {
            error!("Contract {} was deleted", id);
            return Err(error::Error::Command);
        };
        println!("{}", view::contract(&contract, cx.workspace.origin(&id).await));
        if let Some(clauses) = view::clauses(&contract) {
            println!("{clauses}");
        }
        if self.text {
            match contract.contract_text.as_deref() {
                Some(text) => println!("{text}"),
                None => eprintln!("No text has been extracted from this contract yet."),
            }
        }
        Ok(())
    }
}
