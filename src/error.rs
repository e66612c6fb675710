// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{convert::Infallible, io, result};

use thiserror::Error;

use crate::{
    model::contract::{ContractId, Status},
    quota::Allowance,
};

pub(crate) type Result<T, E = Error> = result::Result<T, E>;

#[derive(Error, Debug)]
pub(crate) enum Error {
    #[error("IO operation failed: {0}")]
    Io(#[from] io::Error),
    #[error("JSON format error: {0}")]
    Json(serde_json::Error),
    #[error("HTTP transport error: {0}")]
    Http(reqwest::Error),
    #[error("data conversion error: {0}")]
    Conversion(#[from] Conversion),
    #[error("{0}")]
    Api(#[from] Api),
    #[error("storage error: {0}")]
    Storage(#[from] Storage),
    #[error("password retrieval error: {0}")]
    Password(#[from] Password),
    #[error("contract state error: {0}")]
    Transition(#[from] Transition),
    #[error("monthly allowance exhausted ({used} of {limit} contracts used this month)")]
    QuotaExceeded { used: u32, limit: Allowance },
    #[error("you need to log in before continuing")]
    AccessDenied,
    #[error("command execution failed")]
    Command,
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// Whether the failure has already been reported to the user through a
    /// forced navigation, so it should not be displayed again.
    pub(crate) const fn is_handled(&self) -> bool {
        matches!(*self, Self::Api(Api::SessionExpired) | Self::AccessDenied)
    }
}

impl From<pinentry::Error> for Error {
    fn from(value: pinentry::Error) -> Self {
        // LINT: Deliberate fall-through that should catch future cases added to
        // the enum.
        #[allow(
            clippy::wildcard_enum_match_arm,
            clippy::match_wildcard_for_single_variants
        )]
        match value {
            pinentry::Error::Cancelled | pinentry::Error::Timeout => Self::Cancelled,
            pinentry::Error::Io(e) => Self::Io(e),
            _ => Self::Password(Password::Pinentry(value)),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        // LINT: Deliberate fall-through that should catch future cases added to
        // the enum.
        #[allow(clippy::wildcard_enum_match_arm)]
        match value.classify() {
            serde_json::error::Category::Io => Self::Io(value.into()),
            _ => Self::Json(value),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        if value.is_builder() {
            return Self::Api(Api::Request(value.to_string()));
        }
        Self::Http(value)
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Io(value.into())
    }
}

impl From<Infallible> for Error {
    fn from(_: Infallible) -> Self {
        unreachable!()
    }
}

#[derive(Error, Debug)]
pub(crate) enum Conversion {
    #[error("risk score {0} is outside the range 0 to 100")]
    RiskScoreRange(i64),
    #[error("risk score and overall assessment must be reported together")]
    UnpairedRisk,
    #[error("a risk result was reported for a contract whose status is {0}")]
    RiskBeforeCompletion(Status),
    #[error("unrecognized timestamp {0:?}")]
    Timestamp(String),
}

#[derive(Error, Debug)]
pub(crate) enum Api {
    #[error("your session has expired")]
    SessionExpired,
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("server returned HTTP status {0}")]
    Status(u16),
    #[error("could not build request: {0}")]
    Request(String),
    #[error("the service URL {0} cannot carry API paths")]
    BaseUrl(url::Url),
}

#[derive(Error, Debug)]
pub(crate) enum Storage {
    #[error("no suitable project directory could be determined")]
    NoProjectDirs,
    #[cfg(feature = "secret-service")]
    #[error("secret service error: {0}")]
    SecretService(#[from] oo7::Error),
    #[cfg(feature = "keychain")]
    #[error("Keychain error: {0}")]
    Keychain(#[from] security_framework::base::Error),
}

#[derive(Error, Debug)]
pub(crate) enum Password {
    #[error("no password prompt available")]
    NoPrompt,
    #[error("Pinentry implementation error: {0}")]
    Pinentry(pinentry::Error),
}

#[derive(Error, Debug)]
pub(crate) enum Transition {
    #[error("contract {id} cannot move from {from} to {to}")]
    Invalid {
        id: ContractId,
        from: Status,
        to: Status,
    },
    #[error("contract {0} is no longer tracked")]
    Untracked(ContractId),
}
