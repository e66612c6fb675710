// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! Fixtures shared by unit tests.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::{
    command::Context,
    credentials::CredentialStore,
    error::Result,
    gate::{Navigator, Route},
    gateway::{
        transport::{Request, Response},
        Gateway, Transport,
    },
    model::user::{Tier, User},
    password::Prompt,
    quota::TierLimits,
    session::SessionManager,
    workspace::Workspace,
};

pub(crate) fn user() -> User {
    serde_json::from_value(json!({
        "id": "u-1",
        "email": "ana@example.com",
        "fullName": "Ana Pérez",
        "industry": "construction",
        "tier": "premium",
        "status": "active",
        "createdAt": "2024-01-05T10:00:00.5Z",
    }))
    .expect("valid user fixture")
}

pub(crate) fn user_with_tier(tier: &str) -> User {
    User {
        tier: Tier::new(tier),
        ..user()
    }
}

/// A contract as the service would report it, created at `created_at`.
pub(crate) fn contract_json(id: &str, status: &str, created_at: &str) -> Value {
    json!({
        "id": id,
        "userId": "u-1",
        "title": format!("Contract {id}"),
        "status": status,
        "contractType": "services",
        "clientName": "ACME",
        "createdAt": created_at,
        "updatedAt": created_at,
    })
}

#[derive(Default)]
struct Script {
    responses: VecDeque<Response>,
    requests: Vec<Request>,
}

/// A transport that replays scripted responses in order and records every
/// request it is given.
#[derive(Clone, Default)]
pub(crate) struct FakeTransport {
    script: Arc<Mutex<Script>>,
}

impl FakeTransport {
    pub(crate) fn respond(&self, status: u16, body: &Value) -> &Self {
        let body = if body.is_null() {
            vec![]
        } else {
            serde_json::to_vec(body).expect("serializable response body")
        };
        self.script
            .lock()
            .expect("script lock")
            .responses
            .push_back(Response { status, body });
        self
    }

    pub(crate) fn requests(&self) -> Vec<Request> {
        self.script.lock().expect("script lock").requests.clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        let mut script = self.script.lock().expect("script lock");
        let response = script
            .responses
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected request to {}", request.endpoint));
        script.requests.push(request);
        Ok(response)
    }
}

#[derive(Default)]
pub(crate) struct RecordingNavigator {
    visits: Mutex<Vec<(Route, bool)>>,
}

impl RecordingNavigator {
    pub(crate) fn visits(&self) -> Vec<(Route, bool)> {
        self.visits.lock().expect("visits lock").clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, to: &Route, replace: bool) {
        self.visits
            .lock()
            .expect("visits lock")
            .push((to.clone(), replace));
    }
}

/// A gateway over `transport` with a fresh, hydrated in-memory session.
pub(crate) async fn gateway(
    transport: &FakeTransport,
) -> (Arc<Gateway>, Arc<SessionManager>, Arc<RecordingNavigator>) {
    let session = Arc::new(SessionManager::new(CredentialStore::in_memory()));
    session.hydrate().await;
    let navigator = Arc::new(RecordingNavigator::default());
    let gateway = Gateway::new(
        Box::new(transport.clone()),
        Arc::clone(&session),
        Arc::<RecordingNavigator>::clone(&navigator),
    );
    (Arc::new(gateway), session, navigator)
}

/// A command context whose session has not been hydrated yet and whose
/// service answers nothing.
pub(crate) fn context() -> (Context, Arc<RecordingNavigator>) {
    let session = Arc::new(SessionManager::new(CredentialStore::in_memory()));
    let navigator = Arc::new(RecordingNavigator::default());
    let gateway = Gateway::new(
        Box::new(FakeTransport::default()),
        Arc::clone(&session),
        Arc::<RecordingNavigator>::clone(&navigator),
    );
    let workspace = Workspace::new(
        Arc::new(gateway),
        Arc::clone(&session),
        TierLimits::default(),
    );
    let prompts: Vec<Box<dyn Prompt>> = vec![];

    let cx = Context {
        session,
        workspace,
        navigator: Arc::<RecordingNavigator>::clone(&navigator),
        prompt: Box::new(prompts),
    };
    (cx, navigator)
}
