// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{fmt, path::Path};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{error, tracker::Transition};

use super::{timestamp, user::Tier};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub(crate) struct ContractId(String);

impl ContractId {
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ContractId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ContractId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Status {
    Pending,
    Analyzing,
    Completed,
    Error,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            Self::Pending => "pending",
            Self::Analyzing => "analyzing",
            Self::Completed => "completed",
            Self::Error => "error",
        })
    }
}

/// Risk level, both for a whole contract and for individual clauses. The
/// service historically reports these in Spanish.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Assessment {
    #[serde(alias = "bajo")]
    Low,
    #[serde(alias = "medio")]
    Medium,
    #[serde(alias = "alto")]
    High,
    #[serde(alias = "critico", alias = "crítico")]
    Critical,
}

impl fmt::Display for Assessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        })
    }
}

/// The result of a completed analysis. A score without an assessment (or the
/// reverse) is never constructed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Risk {
    score: u8,
    assessment: Assessment,
}

impl Risk {
    pub(crate) const MAX_SCORE: u8 = 100;

    pub(crate) fn new(score: i64, assessment: Assessment) -> Result<Self, error::Conversion> {
        match u8::try_from(score) {
            Ok(score) if score <= Self::MAX_SCORE => Ok(Self { score, assessment }),
            _ => Err(error::Conversion::RiskScoreRange(score)),
        }
    }

    pub(crate) const fn score(&self) -> u8 {
        self.score
    }

    pub(crate) const fn assessment(&self) -> Assessment {
        self.assessment
    }
}

impl fmt::Display for Risk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.score, self.assessment)
    }
}

/// Reads an explicit `null` the same as an absent field.
fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Clause {
    #[serde(default)]
    pub(crate) risk_level: Option<Assessment>,
    #[serde(default, deserialize_with = "or_default")]
    pub(crate) clause_text: String,
    #[serde(default, deserialize_with = "or_default")]
    pub(crate) clause_type: String,
    #[serde(default, deserialize_with = "or_default")]
    pub(crate) legal_article: String,
    #[serde(default, deserialize_with = "or_default")]
    pub(crate) alternative_clause: String,
    #[serde(default, deserialize_with = "or_default")]
    pub(crate) industry_benchmark: String,
    #[serde(default, deserialize_with = "or_default")]
    pub(crate) negotiation_suggestion: String,
}

/// The detailed report attached to a completed contract.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Analysis {
    #[serde(default, deserialize_with = "or_default")]
    pub(crate) clauses: Vec<Clause>,
    #[serde(default, deserialize_with = "or_default")]
    pub(crate) summary: String,
    #[serde(default, deserialize_with = "or_default")]
    pub(crate) red_flags: Vec<String>,
    #[serde(default, deserialize_with = "or_default")]
    pub(crate) next_steps: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawContract {
    id: ContractId,
    title: String,
    status: Status,
    contract_type: Option<String>,
    client_name: Option<String>,
    contract_text: Option<String>,
    risk_score: Option<i64>,
    overall_assessment: Option<Assessment>,
    summary: Option<String>,
    #[serde(with = "timestamp")]
    created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    updated_at: DateTime<Utc>,
    ai_response: Option<Analysis>,
}

/// A contract as tracked by the client.
///
/// Status, risk, and timestamps only change through [`Contract::apply`], so a
/// risk result is present only on completed contracts.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "RawContract")]
pub(crate) struct Contract {
    id: ContractId,
    pub(crate) title: String,
    pub(crate) contract_type: Option<String>,
    pub(crate) client_name: Option<String>,
    pub(crate) contract_text: Option<String>,
    pub(crate) summary: Option<String>,
    pub(crate) analysis: Option<Analysis>,
    status: Status,
    risk: Option<Risk>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RawContract> for Contract {
    type Error = error::Conversion;

    fn try_from(value: RawContract) -> Result<Self, Self::Error> {
        let risk = match (value.risk_score, value.overall_assessment) {
            (Some(score), Some(assessment)) => Some(Risk::new(score, assessment)?),
            (None, None) => None,
            (Some(_), None) | (None, Some(_)) => return Err(error::Conversion::UnpairedRisk),
        };
        if risk.is_some() && value.status != Status::Completed {
            return Err(error::Conversion::RiskBeforeCompletion(value.status));
        }

        Ok(Self {
            id: value.id,
            title: value.title,
            contract_type: value.contract_type,
            client_name: value.client_name,
            contract_text: value.contract_text,
            summary: value.summary,
            analysis: value.ai_response,
            status: value.status,
            risk,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

impl Contract {
    pub(crate) const fn id(&self) -> &ContractId {
        &self.id
    }

    pub(crate) const fn status(&self) -> Status {
        self.status
    }

    pub(crate) const fn risk(&self) -> Option<Risk> {
        self.risk
    }

    pub(crate) const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub(crate) const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Moves the contract along one edge of its lifecycle. On rejection the
    /// contract is left untouched.
    ///
    /// `updated_at` always advances, even if `at` is not later than the
    /// previous value.
    pub(crate) fn apply(
        &mut self,
        transition: Transition,
        at: DateTime<Utc>,
    ) -> Result<(), error::Transition> {
        let to = transition.target();
        if !transition.leaves(self.status) {
            return Err(error::Transition::Invalid {
                id: self.id.clone(),
                from: self.status,
                to,
            });
        }

        self.risk = match transition {
            Transition::Complete(risk) => risk,
            Transition::Analyze | Transition::Fail => None,
        };
        self.status = to;
        self.updated_at = if at > self.updated_at {
            at
        } else {
            self.updated_at + Duration::milliseconds(1)
        };
        Ok(())
    }
}

/// A file to submit for analysis.
#[derive(Clone, Debug)]
pub(crate) struct Upload {
    pub(crate) file_name: String,
    pub(crate) bytes: Vec<u8>,
    pub(crate) title: String,
    pub(crate) client_name: Option<String>,
    pub(crate) contract_type: Option<String>,
}

impl Upload {
    /// Reads a file from disk, titling it after the file name unless a title
    /// is given.
    pub(crate) fn from_path(path: &Path, title: Option<String>) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path.file_name().map_or_else(
            || "contract".to_owned(),
            |name| name.to_string_lossy().into_owned(),
        );
        let title = title.unwrap_or_else(|| {
            path.file_stem().map_or_else(
                || file_name.clone(),
                |stem| stem.to_string_lossy().into_owned(),
            )
        });

        Ok(Self {
            file_name,
            bytes,
            title,
            client_name: None,
            contract_type: None,
        })
    }
}

/// The service's own accounting of the current billing period.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlanUsage {
    pub(crate) tier: Tier,
    pub(crate) contracts_this_month: u32,
    pub(crate) contracts_limit: u32,
    pub(crate) contracts_remaining: u32,
    pub(crate) can_upload: bool,
}
