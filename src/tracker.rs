// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use log::debug;

use crate::{
    error,
    model::contract::{Contract, ContractId, Risk, Status},
};

/// An edge in the contract lifecycle:
///
/// ```text
/// pending --Analyze--> analyzing --Complete--> completed
///                          \------Fail------> error
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Transition {
    Analyze,
    Complete(Option<Risk>),
    Fail,
}

impl Transition {
    pub(crate) const fn target(&self) -> Status {
        match *self {
            Self::Analyze => Status::Analyzing,
            Self::Complete(_) => Status::Completed,
            Self::Fail => Status::Error,
        }
    }

    /// Whether this edge starts at `from`.
    pub(crate) const fn leaves(&self, from: Status) -> bool {
        matches!(
            (from, *self),
            (Status::Pending, Self::Analyze)
                | (Status::Analyzing, Self::Complete(_) | Self::Fail)
        )
    }
}

/// Where the tracked copy of a contract came from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Origin {
    /// Read from the service and not modified since.
    Server,
    /// Modified locally ahead of confirmation from the service.
    Optimistic,
}

#[derive(Debug)]
struct Entry {
    contract: Contract,
    origin: Origin,
}

/// The set of contracts known to the client.
///
/// Server reads always replace a tracked entry wholesale. Contracts removed
/// locally are remembered for the life of the tracker, so neither a late
/// single read nor a listing that raced the delete brings them back.
#[derive(Debug, Default)]
pub(crate) struct Tracker {
    entries: HashMap<ContractId, Entry>,
    removed: HashSet<ContractId>,
    loaded: bool,
}

impl Tracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Whether a full listing has been applied.
    pub(crate) const fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub(crate) fn get(&self, id: &ContractId) -> Option<&Contract> {
        self.entries.get(id).map(|entry| &entry.contract)
    }

    pub(crate) fn origin(&self, id: &ContractId) -> Option<Origin> {
        self.entries.get(id).map(|entry| entry.origin)
    }

    pub(crate) fn contracts(&self) -> impl Iterator<Item = &Contract> {
        self.entries.values().map(|entry| &entry.contract)
    }

    /// All tracked contracts, newest first.
    pub(crate) fn newest_first(&self) -> Vec<&Contract> {
        let mut contracts = self.contracts().collect::<Vec<_>>();
        contracts.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        contracts
    }

    /// Replaces the whole collection with a fresh listing from the service.
    pub(crate) fn replace_all<I: IntoIterator<Item = Contract>>(&mut self, contracts: I) {
        let removed = &self.removed;
        self.entries = contracts
            .into_iter()
            .filter(|contract| !removed.contains(contract.id()))
            .map(|contract| {
                (
                    contract.id().clone(),
                    Entry {
                        contract,
                        origin: Origin::Server,
                    },
                )
            })
            .collect();
        self.loaded = true;
        debug!("Tracking {} contracts after reload", self.entries.len());
    }

    /// Starts tracking a contract read from the service, replacing any tracked
    /// copy. Returns `false` for a contract removed locally.
    pub(crate) fn insert(&mut self, contract: Contract) -> bool {
        if self.removed.contains(contract.id()) {
            debug!("Not tracking removed contract {}", contract.id());
            return false;
        }

        _ = self.entries.insert(
            contract.id().clone(),
            Entry {
                contract,
                origin: Origin::Server,
            },
        );
        true
    }

    /// Overwrites the tracked copy of a contract with the service's version.
    /// Returns `false` if the contract is not tracked (for instance because it
    /// was removed while the read was in flight), in which case nothing
    /// changes.
    pub(crate) fn reconcile(&mut self, contract: Contract) -> bool {
        if !self.entries.contains_key(contract.id()) {
            debug!("Discarding late update for untracked contract {}", contract.id());
            return false;
        }

        _ = self.entries.insert(
            contract.id().clone(),
            Entry {
                contract,
                origin: Origin::Server,
            },
        );
        true
    }

    pub(crate) fn remove(&mut self, id: &ContractId) -> Option<Contract> {
        _ = self.removed.insert(id.clone());
        self.entries.remove(id).map(|entry| entry.contract)
    }

    /// Checks that `transition` could be applied right now without applying
    /// it.
    pub(crate) fn check(
        &self,
        id: &ContractId,
        transition: Transition,
    ) -> Result<(), error::Transition> {
        let contract = self
            .get(id)
            .ok_or_else(|| error::Transition::Untracked(id.clone()))?;
        if transition.leaves(contract.status()) {
            Ok(())
        } else {
            Err(error::Transition::Invalid {
                id: id.clone(),
                from: contract.status(),
                to: transition.target(),
            })
        }
    }

    /// Applies a local transition ahead of confirmation from the service.
    pub(crate) fn apply(
        &mut self,
        id: &ContractId,
        transition: Transition,
    ) -> Result<&Contract, error::Transition> {
        self.apply_at(id, transition, Utc::now())
    }

    pub(crate) fn apply_at(
        &mut self,
        id: &ContractId,
        transition: Transition,
        at: DateTime<Utc>,
    ) -> Result<&Contract, error::Transition> {
        let entry = self
            .entries
            .get_mut(id)
            .ok_or_else(|| error::Transition::Untracked(id.clone()))?;
        entry.contract.apply(transition, at)?;
        entry.origin = Origin::Optimistic;
        debug!("Contract {} is now {}", id, entry.contract.status());
        Ok(&entry.contract)
    }
}
