// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use crate::model::contract::ContractId;

use super::transport::Method;

const API_PREFIX: &str = "api";

/// A remote operation exposed by the service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Endpoint {
    Login,
    Register,
    Me,
    ListContracts,
    Upload,
    Contract(ContractId),
    DeleteContract(ContractId),
    Analyze(ContractId),
    Usage,
}

impl Endpoint {
    pub(crate) const fn method(&self) -> Method {
        match *self {
            Self::Login | Self::Register | Self::Upload | Self::Analyze(_) => Method::Post,
            Self::DeleteContract(_) => Method::Delete,
            Self::Me | Self::ListContracts | Self::Contract(_) | Self::Usage => Method::Get,
        }
    }

    /// Path segments relative to the service root.
    pub(crate) fn segments(&self) -> Vec<&str> {
        let mut segments = vec![API_PREFIX];
        match self {
            Self::Login => segments.extend(["auth", "login"]),
            Self::Register => segments.extend(["auth", "register"]),
            Self::Me => segments.extend(["auth", "me"]),
            Self::ListContracts => segments.push("contracts"),
            Self::Upload => segments.extend(["contracts", "upload"]),
            Self::Contract(id) | Self::DeleteContract(id) => {
                segments.extend(["contracts", id.as_str()]);
            }
            Self::Analyze(id) => segments.extend(["contracts", id.as_str(), "analyze"]),
            Self::Usage => segments.extend(["contracts", "usage"]),
        }
        segments
    }

    /// Whether this endpoint establishes a session rather than using one.
    pub(crate) const fn is_auth(&self) -> bool {
        matches!(*self, Self::Login | Self::Register)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} /{}", self.method(), self.segments().join("/"))
    }
}
