// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{collections::HashMap, fmt, fs, io, path::Path};

use chrono::{DateTime, Datelike as _, Local, TimeZone};
use log::debug;
use serde::Deserialize;

use crate::{
    error::{Error, Result},
    metadata,
    model::{contract::Contract, user::Tier},
};

const TIER_LIMITS_FILE: &str = "tier-limits.json";

/// A monthly contract allowance.
///
/// Ordered from most to least restrictive.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(from = "RawAllowance")]
pub(crate) enum Allowance {
    Limited(u32),
    Unlimited,
}

impl Allowance {
    pub(crate) const fn is_exhausted(&self) -> bool {
        matches!(*self, Self::Limited(0))
    }

    fn less(self, used: u32) -> Self {
        match self {
            Self::Limited(limit) => Self::Limited(limit.saturating_sub(used)),
            Self::Unlimited => Self::Unlimited,
        }
    }
}

impl fmt::Display for Allowance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Limited(n) => write!(f, "{n}"),
            Self::Unlimited => f.write_str("unlimited"),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum Keyword {
    Unlimited,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAllowance {
    Count(u32),
    Keyword(Keyword),
}

impl From<RawAllowance> for Allowance {
    fn from(value: RawAllowance) -> Self {
        match value {
            RawAllowance::Count(n) => Self::Limited(n),
            RawAllowance::Keyword(Keyword::Unlimited) => Self::Unlimited,
        }
    }
}

/// Monthly allowance per subscription tier, e.g.
///
/// ```json
/// {"free": 3, "premium": 50, "enterprise": "unlimited"}
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub(crate) struct TierLimits(HashMap<Tier, Allowance>);

impl Default for TierLimits {
    fn default() -> Self {
        Self(HashMap::from([
            (Tier::new(Tier::FREE), Allowance::Limited(3)),
            (Tier::new(Tier::PREMIUM), Allowance::Limited(50)),
            (Tier::new(Tier::ENTERPRISE), Allowance::Unlimited),
        ]))
    }
}

impl TierLimits {
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let limits = serde_json::from_reader(fs::File::open(path)?)?;
        debug!("Loaded tier limits from {}", path.display());
        Ok(limits)
    }

    /// Loads the table from `explicit` if given, otherwise from the project
    /// configuration directory, falling back to the built-in table.
    pub(crate) fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let configured = metadata::PROJECT_DIRS
            .as_ref()
            .map(|dirs| dirs.config_dir().join(TIER_LIMITS_FILE));
        match configured.map(|path| Self::load(&path)) {
            Some(Ok(limits)) => Ok(limits),
            Some(Err(Error::Io(e))) if e.kind() == io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            Some(Err(e)) => Err(e),
            None => Ok(Self::default()),
        }
    }

    /// The smallest allowance in the table. An empty table allows nothing.
    pub(crate) fn most_restrictive(&self) -> Allowance {
        self.0
            .values()
            .min()
            .copied()
            .unwrap_or(Allowance::Limited(0))
    }

    /// The allowance for `tier`. Callers without a tier, or with one the table
    /// does not know, get the most restrictive allowance.
    pub(crate) fn limit_for(&self, tier: Option<&Tier>) -> Allowance {
        tier.and_then(|tier| self.0.get(tier))
            .copied()
            .unwrap_or_else(|| self.most_restrictive())
    }
}

/// Usage for the current calendar month. Always computed from the current
/// contract set and never stored.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Snapshot {
    pub(crate) used: u32,
    pub(crate) limit: Allowance,
    pub(crate) remaining: Allowance,
    pub(crate) can_create: bool,
}

/// Computes usage for the month containing `now`, in `now`'s time zone.
pub(crate) fn snapshot_at<'c, I, Tz>(
    contracts: I,
    tier: Option<&Tier>,
    limits: &TierLimits,
    now: &DateTime<Tz>,
) -> Snapshot
where
    I: IntoIterator<Item = &'c Contract>,
    Tz: TimeZone,
{
    let zone = now.timezone();
    let used = contracts
        .into_iter()
        .map(|contract| contract.created_at().with_timezone(&zone))
        .filter(|created| created.year() == now.year() && created.month() == now.month())
        .count();
    let used = u32::try_from(used).unwrap_or(u32::MAX);

    let limit = limits.limit_for(tier);
    let remaining = limit.less(used);
    Snapshot {
        used,
        limit,
        remaining,
        can_create: !remaining.is_exhausted(),
    }
}

/// Computes usage for the caller's current local month.
pub(crate) fn snapshot<'c, I: IntoIterator<Item = &'c Contract>>(
    contracts: I,
    tier: Option<&Tier>,
    limits: &TierLimits,
) -> Snapshot {
    snapshot_at(contracts, tier, limits, &Local::now())
}
