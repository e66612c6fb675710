// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::{
    error::{self, Error, Result},
    gate::{self, Decision, Navigator, Route},
    metadata,
    password::{self, Prompt},
    session::SessionManager,
    workspace::Workspace,
};

pub(crate) mod analyze;
pub(crate) mod delete;
pub(crate) mod list;
pub(crate) mod login;
pub(crate) mod logout;
pub(crate) mod register;
pub(crate) mod show;
pub(crate) mod upload;
pub(crate) mod usage;
pub(crate) mod whoami;

/// Everything a command needs to run.
pub(crate) struct Context {
    pub(crate) session: Arc<SessionManager>,
    pub(crate) workspace: Workspace,
    pub(crate) navigator: Arc<dyn Navigator>,
    pub(crate) prompt: Box<dyn Prompt>,
}

impl Context {
    /// Consults the access gate before entering `route`, following any
    /// redirect it asks for.
    pub(crate) async fn enter(&self, route: Route) -> Result<()> {
        let mut sessions = self.session.subscribe();
        match gate::resolve(&mut sessions, &route).await {
            Decision::Allow => Ok(()),
            Decision::Deny { redirect, replace } => {
                self.navigator.navigate(&redirect, replace);
                Err(Error::AccessDenied)
            }
            Decision::Defer => Err(Error::AccessDenied),
        }
    }

    pub(crate) async fn password(&self, req: password::Request) -> Result<SecretString> {
        self.prompt
            .prompt(req)
            .await?
            .ok_or_else(|| error::Password::NoPrompt.into())
    }
}

#[async_trait]
pub(crate) trait Command {
    async fn execute(self, cx: &Context) -> Result<()>;
}

/// Delivers forced navigation to someone at a terminal.
pub(crate) struct Terminal;

impl Navigator for Terminal {
    fn navigate(&self, to: &Route, _: bool) {
        match *to {
            Route::Login => eprintln!(
                "You are not logged in. Run `{} login <EMAIL>` to continue.",
                *metadata::CLIENT_NAME
            ),
            Route::Register
            | Route::Dashboard
            | Route::Contracts
            | Route::Contract(_)
            | Route::Pricing => eprintln!("Continue at {to}."),
        }
    }
}
