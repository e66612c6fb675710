// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use async_trait::async_trait;
use clap::Parser;

use crate::{
    error::Result,
    gate::Route,
    model::contract::Upload,
    view,
};

/// Upload a contract for review.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// The title to file the contract under. Defaults to the file name.
    #[arg(long)]
    title: Option<String>,

    /// The other party to the contract.
    #[arg(long)]
    client: Option<String>,

    /// The kind of contract, such as "lease" or "services".
    #[arg(long = "type")]
    contract_type: Option<String>,

    /// Start the analysis as soon as the upload is accepted.
    #[arg(long)]
    analyze: bool,

    /// The contract document.
    #[arg(value_hint = clap::ValueHint::FilePath)]
    file: PathBuf,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, cx: &super::Context) -> Result<()> {
        cx.enter(Route::Contracts).await?;

        let mut upload = Upload::from_path(&self.file, self.title)?;
        upload.client_name = self.client;
        upload.contract_type = self.contract_type;

        let contract = cx.workspace.upload(upload).await?;
        println!(
            "{}",
            view::contracts([view::ContractRow::new(
                &contract,
                cx.workspace.origin(contract.id()).await,
            )])
        );

        if self.analyze {
            super::analyze::run(cx, contract.id()).await?;
        }
        Ok(())
    }
}
