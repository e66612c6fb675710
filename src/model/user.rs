// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use chrono::{DateTime, Utc};
use inflector::Inflector as _;
use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize, Serializer};

use crate::credentials::Token;

use super::timestamp;

/// A subscription level. Kept as the name the service reports so that
/// profiles written by newer servers survive a round trip unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub(crate) struct Tier(String);

impl Tier {
    pub(crate) const FREE: &'static str = "free";
    pub(crate) const PREMIUM: &'static str = "premium";
    pub(crate) const ENTERPRISE: &'static str = "enterprise";

    pub(crate) fn new<S: Into<String>>(name: S) -> Self {
        Self(name.into())
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_title_case())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum SubscriptionStatus {
    Active,
    Canceled,
    PastDue,
    Trialing,
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            Self::Active => "Active",
            Self::Canceled => "Canceled",
            Self::PastDue => "Past due",
            Self::Trialing => "Trialing",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) full_name: Option<String>,
    pub(crate) industry: Option<String>,
    pub(crate) tier: Tier,
    pub(crate) status: SubscriptionStatus,
    #[serde(with = "timestamp")]
    pub(crate) created_at: DateTime<Utc>,
}

impl User {
    pub(crate) fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.email)
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuthResponse {
    pub(crate) access_token: Token,
    pub(crate) user: User,
}

fn expose<S: Serializer>(value: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(value.expose_secret())
}

#[derive(Serialize)]
pub(crate) struct LoginRequest<'req> {
    pub(crate) email: &'req str,
    #[serde(serialize_with = "expose")]
    pub(crate) password: &'req SecretString,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegisterRequest<'req> {
    pub(crate) email: &'req str,
    #[serde(serialize_with = "expose")]
    pub(crate) password: &'req SecretString,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) full_name: Option<&'req str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) industry: Option<&'req str>,
}
