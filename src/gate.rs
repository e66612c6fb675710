// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use log::debug;
use tokio::sync::watch;

use crate::{model::contract::ContractId, session::Session};

/// A place the user can ask to go.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Route {
    Login,
    Register,
    Dashboard,
    Contracts,
    Contract(ContractId),
    Pricing,
}

impl Route {
    /// Whether the route requires an authenticated session.
    pub(crate) const fn is_protected(&self) -> bool {
        !matches!(*self, Self::Login | Self::Register)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login => f.write_str("/login"),
            Self::Register => f.write_str("/register"),
            Self::Dashboard => f.write_str("/dashboard"),
            Self::Contracts => f.write_str("/contracts"),
            Self::Contract(id) => write!(f, "/contracts/{id}"),
            Self::Pricing => f.write_str("/pricing"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Decision {
    /// The session has not been restored yet; ask again later.
    Defer,
    Allow,
    Deny { redirect: Route, replace: bool },
}

/// Decides whether `route` may be entered with the given session.
///
/// Never denies before the stored session has been read.
pub(crate) fn decide(session: &Session, route: &Route) -> Decision {
    if !route.is_protected() {
        Decision::Allow
    } else if !session.is_hydrated() {
        Decision::Defer
    } else if session.is_authenticated() {
        Decision::Allow
    } else {
        Decision::Deny {
            redirect: Route::Login,
            replace: true,
        }
    }
}

/// Waits until the session is settled enough to decide on `route`.
///
/// If the session owner goes away before that, the last published session is
/// decided on as if it were hydrated, which denies protected routes.
pub(crate) async fn resolve(sessions: &mut watch::Receiver<Session>, route: &Route) -> Decision {
    loop {
        let decision = decide(&sessions.borrow_and_update(), route);
        if decision != Decision::Defer {
            debug!(
                "Access to {} {}",
                route,
                if decision == Decision::Allow {
                    "allowed"
                } else {
                    "denied"
                }
            );
            return decision;
        }

        if sessions.changed().await.is_err() {
            return Decision::Deny {
                redirect: Route::Login,
                replace: true,
            };
        }
    }
}

/// Somewhere forced navigation is delivered.
pub(crate) trait Navigator: Send + Sync {
    fn navigate(&self, to: &Route, replace: bool);
}
