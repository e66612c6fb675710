// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
#![deny(elided_lifetimes_in_paths)]
#![warn(
    rust_2018_idioms,
    future_incompatible,
    unused,
    unused_lifetimes,
    unused_qualifications,
    unused_results,
    anonymous_parameters,
    deprecated_in_future,
    elided_lifetimes_in_paths,
    explicit_outlives_requirements,
    keyword_idents,
    macro_use_extern_crate,
    missing_doc_code_examples,
    private_doc_tests,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::unseparated_literal_suffix,
    clippy::decimal_literal_representation,
    clippy::single_char_lifetime_names,
    clippy::fallible_impl_from,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::wildcard_enum_match_arm,
    clippy::deref_by_slicing,
    clippy::default_numeric_fallback,
    clippy::shadow_reuse,
    clippy::clone_on_ref_ptr,
    clippy::todo,
    clippy::string_add,
    clippy::use_debug,
    clippy::future_not_send
)]
#![cfg_attr(not(test), warn(clippy::panic_in_result_fn))]

mod command;
mod credentials;
mod error;
mod gate;
mod gateway;
mod metadata;
mod model;
mod password;
mod quota;
mod session;
mod storage;
#[cfg(test)]
mod testing;
mod tracker;
mod view;
mod workspace;

use std::{path::PathBuf, process, sync::Arc};

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use credentials::CredentialStore;
use error::Result;
use gate::Navigator;
use gateway::{Gateway, Http};
use log::{debug, error, warn};
use quota::TierLimits;
use serde::{Deserialize, Serialize};
use session::SessionManager;
use url::Url;
use workspace::Workspace;

#[derive(Debug, Subcommand)]
enum Command {
    Login(command::login::Command),
    Register(command::register::Command),
    Logout(command::logout::Command),
    Whoami(command::whoami::Command),
    List(command::list::Command),
    Show(command::show::Command),
    Upload(command::upload::Command),
    Analyze(command::analyze::Command),
    Delete(command::delete::Command),
    Usage(command::usage::Command),
}

#[async_trait]
impl command::Command for Command {
    async fn execute(self, cx: &command::Context) -> Result<()> {
        match self {
            Self::Login(cmd) => cmd.execute(cx).await,
            Self::Register(cmd) => cmd.execute(cx).await,
            Self::Logout(cmd) => cmd.execute(cx).await,
            Self::Whoami(cmd) => cmd.execute(cx).await,
            Self::List(cmd) => cmd.execute(cx).await,
            Self::Show(cmd) => cmd.execute(cx).await,
            Self::Upload(cmd) => cmd.execute(cx).await,
            Self::Analyze(cmd) => cmd.execute(cx).await,
            Self::Delete(cmd) => cmd.execute(cx).await,
            Self::Usage(cmd) => cmd.execute(cx).await,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// The root URL of the contract analysis service. API calls are made under
    /// its /api path.
    #[arg(long, env = "PACTUM_URL", default_value = "http://127.0.0.1:8080", value_parser = Url::parse)]
    url: Url,

    /// Keep the session in memory only, so it ends with this invocation.
    #[arg(long)]
    no_persist_session: bool,

    /// The path to the Pinentry program to use when asking for the account
    /// password.
    #[arg(long, value_hint = clap::ValueHint::ExecutablePath)]
    pinentry_program: Option<PathBuf>,

    /// A JSON file mapping subscription tiers to monthly contract allowances.
    /// Defaults to tier-limits.json in the configuration directory.
    #[arg(long, env = "PACTUM_TIER_LIMITS", value_hint = clap::ValueHint::FilePath)]
    tier_limits: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

async fn open_storage<T: Send + Serialize + Sync + for<'de> Deserialize<'de> + Clone + 'static>(
    args: &Args,
    key: &str,
) -> Box<dyn storage::Storage<T>> {
    if !args.no_persist_session {
        #[cfg(feature = "secret-service")]
        match storage::SecretService::new(&args.url, key).await {
            Ok(secret_service_storage) => return Box::new(secret_service_storage),
            Err(e) => {
                warn!("We need to fall back to unencrypted file storage because we can't connect to the secret service: {}", e);
            }
        }

        #[cfg(feature = "keychain")]
        match storage::Keychain::new(&args.url, key) {
            Ok(keychain_storage) => return Box::new(keychain_storage),
            Err(e) => {
                warn!("We need to fall back to unencrypted file storage because we can't connect to Keychain: {}", e);
            }
        }

        if let Some(file_storage) = storage::File::new(format!("{key}.json")) {
            return Box::new(file_storage);
        }
        warn!("No data directory is available, so the session will not outlive this command");
    }

    Box::new(storage::Memory::<T>::new())
}

async fn run(args: Args) -> Result<()> {
    let limits = TierLimits::discover(args.tier_limits.as_deref())?;

    let store = CredentialStore::new(
        open_storage(&args, credentials::TOKEN_KEY).await,
        open_storage(&args, credentials::USER_KEY).await,
    );
    if !store.is_persistent() {
        debug!("The session is kept in memory only");
    }
    let session = Arc::new(SessionManager::new(store));
    session.hydrate().await;

    let navigator: Arc<dyn Navigator> = Arc::new(command::Terminal);
    let gateway = Gateway::new(
        Box::new(Http::new(args.url)?),
        Arc::clone(&session),
        Arc::clone(&navigator),
    );
    let workspace = Workspace::new(Arc::new(gateway), Arc::clone(&session), limits);

    let prompt: Vec<Box<dyn password::Prompt>> = vec![
        Box::new(args.pinentry_program.map_or_else(
            password::PinentryPrompt::new,
            password::PinentryPrompt::new_with_executable,
        )),
        Box::new(password::RpasswordPrompt),
    ];

    let cx = command::Context {
        session,
        workspace,
        navigator,
        prompt: Box::new(prompt),
    };
    command::Command::execute(args.command, &cx).await
}

#[tokio::main]
async fn main() {
    let logger_env = env_logger::Env::new()
        .filter_or("PACTUM_LOG", "warn")
        .write_style("PACTUM_LOG_STYLE");
    env_logger::Builder::from_env(logger_env).init();

    if let Err(e) = run(Args::parse()).await {
        // Session expiry and denied access have already been reported.
        if !e.is_handled() {
            error!("We encountered an error: {}", e);
        }
        process::exit(1);
    };
}
