// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{ffi::OsString, path::Path};

use async_trait::async_trait;
use secrecy::SecretString;
use tokio::task;

use crate::{error::Result, metadata};

/// What to ask the user for.
#[derive(Debug, Clone)]
pub(crate) struct Request {
    account: String,
    confirm: bool,
}

impl Request {
    /// Asks for the password of `account`.
    pub(crate) fn new<S: Into<String>>(account: S) -> Self {
        Self {
            account: account.into(),
            confirm: false,
        }
    }

    /// Asks for the password twice, for choosing a new one.
    pub(crate) fn confirmed(mut self) -> Self {
        self.confirm = true;
        self
    }

    fn description(&self) -> String {
        if self.confirm {
            format!("Choose a password for {}.", self.account)
        } else {
            format!("Enter the password for {}.", self.account)
        }
    }
}

#[async_trait]
pub(crate) trait Prompt: Send + Sync {
    /// Returns `None` if this prompt is not available here.
    async fn prompt(&self, req: Request) -> Result<Option<SecretString>>;
}

#[async_trait]
impl<T: Prompt + ?Sized> Prompt for Box<T> {
    async fn prompt(&self, req: Request) -> Result<Option<SecretString>> {
        (**self).prompt(req).await
    }
}

#[async_trait]
impl<T: Prompt> Prompt for Vec<T> {
    async fn prompt(&self, req: Request) -> Result<Option<SecretString>> {
        for candidate in self {
            if let r @ (Ok(Some(_)) | Err(_)) = candidate.prompt(req.clone()).await {
                return r;
            }
        }

        Ok(None)
    }
}

pub(crate) struct PinentryPrompt {
    executable: Option<OsString>,
}

impl PinentryPrompt {
    pub(crate) const fn new() -> Self {
        Self { executable: None }
    }

    pub(crate) fn new_with_executable<P: AsRef<Path>>(executable: P) -> Self {
        Self {
            executable: Some(executable.as_ref().as_os_str().into()),
        }
    }
}

#[async_trait]
impl Prompt for PinentryPrompt {
    async fn prompt(&self, req: Request) -> Result<Option<SecretString>> {
        fn interact<'input>(
            mut input: pinentry::PassphraseInput<'input>,
            title: &'input str,
            description: &'input str,
            confirm: bool,
        ) -> Result<SecretString> {
            _ = input.required("A password is required to continue.");
            _ = input.with_title(title);
            _ = input.with_description(description);
            _ = input.with_prompt("Password");
            if confirm {
                _ = input.with_confirmation("Repeat", "The passwords do not match.");
            }

            Ok(input.interact()?)
        }

        let title = format!("Sign in - {}", *metadata::CLIENT_DISPLAY_NAME);
        let description = req.description();

        let input = self
            .executable
            .as_ref()
            .and_then(pinentry::PassphraseInput::with_binary)
            .or_else(pinentry::PassphraseInput::with_default_binary)
            .map(|input| {
                task::spawn_blocking(move || interact(input, &title, &description, req.confirm))
            });

        Ok(match input {
            Some(fut) => Some(fut.await??),
            None => None,
        })
    }
}

/// Reads the password from the controlling terminal.
pub(crate) struct RpasswordPrompt;

#[async_trait]
impl Prompt for RpasswordPrompt {
    async fn prompt(&self, req: Request) -> Result<Option<SecretString>> {
        eprintln!("{}", req.description());

        let password = task::spawn_blocking(move || -> Result<String> {
            loop {
                let password = rpassword::prompt_password("Password: ")?;
                if !req.confirm || rpassword::prompt_password("Repeat: ")? == password {
                    return Ok(password);
                }
                eprintln!("Error: The passwords do not match.");
            }
        })
        .await??;

        Ok(Some(SecretString::new(password)))
    }
}
