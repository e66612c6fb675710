// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

pub(crate) mod endpoint;
pub(crate) mod transport;

use std::sync::Arc;

use log::{debug, warn};
use secrecy::SecretString;
use serde::{de::DeserializeOwned, Deserialize};

use crate::{
    error::{self, Result},
    gate::{Navigator, Route},
    model::{
        contract::{Contract, ContractId, PlanUsage, Upload},
        user::{AuthResponse, LoginRequest, RegisterRequest, User},
    },
    session::SessionManager,
};

pub(crate) use endpoint::Endpoint;
pub(crate) use transport::{Http, Transport};
use transport::{Body, Request, Response};

/// How a response status should be treated.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    Success,
    /// The session was rejected and must be discarded.
    AuthFailure,
    OtherFailure,
}

pub(crate) fn classify(endpoint: &Endpoint, status: u16) -> Outcome {
    match status {
        200..=299 => Outcome::Success,
        401 if !endpoint.is_auth() => Outcome::AuthFailure,
        _ => Outcome::OtherFailure,
    }
}

#[derive(Deserialize)]
struct FailureBody {
    error: Option<String>,
    message: Option<String>,
}

/// Extracts the service's explanation of a failure, if it gave one.
fn failure(status: u16, body: &[u8]) -> error::Api {
    let message = serde_json::from_slice::<FailureBody>(body)
        .ok()
        .and_then(|body| body.error.or(body.message))
        .filter(|message| !message.trim().is_empty());
    match message {
        Some(message) => error::Api::Rejected { status, message },
        None => error::Api::Status(status),
    }
}

/// Client for the remote service.
///
/// Attaches the current session's token to every call. A call rejected for
/// lack of authentication ends the session and sends the user to the login
/// route; the caller then sees [`error::Api::SessionExpired`].
pub(crate) struct Gateway {
    transport: Box<dyn Transport>,
    session: Arc<SessionManager>,
    navigator: Arc<dyn Navigator>,
}

impl Gateway {
    pub(crate) fn new(
        transport: Box<dyn Transport>,
        session: Arc<SessionManager>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            transport,
            session,
            navigator,
        }
    }

    async fn expire_session(&self) {
        warn!("The service rejected the session; logging out");
        self.session.logout().await;
        self.navigator.navigate(&Route::Login, true);
    }

    async fn react(&self, endpoint: &Endpoint, response: Response) -> Result<Vec<u8>> {
        match classify(endpoint, response.status) {
            Outcome::Success => Ok(response.body),
            Outcome::AuthFailure => {
                self.expire_session().await;
                Err(error::Api::SessionExpired.into())
            }
            Outcome::OtherFailure => {
                debug!("{} failed with HTTP {}", endpoint, response.status);
                Err(failure(response.status, &response.body).into())
            }
        }
    }

    async fn call(&self, endpoint: Endpoint, body: Body) -> Result<Vec<u8>> {
        let bearer = self.session.snapshot().token().cloned();
        let response = self
            .transport
            .send(Request {
                endpoint: endpoint.clone(),
                bearer,
                body,
            })
            .await?;
        self.react(&endpoint, response).await
    }

    async fn call_json<T: DeserializeOwned>(&self, endpoint: Endpoint, body: Body) -> Result<T> {
        let body = self.call(endpoint, body).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    pub(crate) async fn login(&self, email: &str, password: &SecretString) -> Result<AuthResponse> {
        let request = serde_json::to_value(LoginRequest { email, password })?;
        self.call_json(Endpoint::Login, Body::Json(request)).await
    }

    pub(crate) async fn register(
        &self,
        email: &str,
        password: &SecretString,
        full_name: Option<&str>,
        industry: Option<&str>,
    ) -> Result<AuthResponse> {
        let request = serde_json::to_value(RegisterRequest {
            email,
            password,
            full_name,
            industry,
        })?;
        self.call_json(Endpoint::Register, Body::Json(request))
            .await
    }

    pub(crate) async fn me(&self) -> Result<User> {
        self.call_json(Endpoint::Me, Body::Empty).await
    }

    pub(crate) async fn list_contracts(&self) -> Result<Vec<Contract>> {
        self.call_json(Endpoint::ListContracts, Body::Empty).await
    }

    pub(crate) async fn upload(&self, upload: Upload) -> Result<Contract> {
        self.call_json(Endpoint::Upload, Body::Multipart(upload))
            .await
    }

    pub(crate) async fn contract(&self, id: &ContractId) -> Result<Contract> {
        self.call_json(Endpoint::Contract(id.clone()), Body::Empty)
            .await
    }

    pub(crate) async fn delete_contract(&self, id: &ContractId) -> Result<()> {
        _ = self
            .call(Endpoint::DeleteContract(id.clone()), Body::Empty)
            .await?;
        Ok(())
    }

    /// Asks the service to start analyzing a contract. Acceptance carries no
    /// result; the outcome is read back later.
    pub(crate) async fn analyze(&self, id: &ContractId) -> Result<()> {
        _ = self
            .call(Endpoint::Analyze(id.clone()), Body::Empty)
            .await?;
        Ok(())
    }

    pub(crate) async fn usage(&self) -> Result<PlanUsage> {
        self.call_json(Endpoint::Usage, Body::Empty).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use crate::{
        credentials::Token,
        model::contract::Status,
        testing::{self, contract_json, user, FakeTransport},
    };

    use super::*;

    fn password() -> SecretString {
        SecretString::new("hunter2".to_owned())
    }

    #[test]
    fn classifies_statuses() {
        let contracts = Endpoint::ListContracts;
        assert_eq!(classify(&contracts, 200), Outcome::Success);
        assert_eq!(classify(&contracts, 204), Outcome::Success);
        assert_eq!(classify(&contracts, 401), Outcome::AuthFailure);
        assert_eq!(classify(&contracts, 403), Outcome::OtherFailure);
        assert_eq!(classify(&contracts, 500), Outcome::OtherFailure);
        assert_eq!(classify(&Endpoint::Login, 401), Outcome::OtherFailure);
        assert_eq!(classify(&Endpoint::Register, 401), Outcome::OtherFailure);
    }

    #[test]
    fn failure_prefers_the_error_field() {
        let body = br#"{"error": "Contract limit reached", "message": "ignored"}"#;
        assert!(matches!(
            failure(403, body),
            error::Api::Rejected { status: 403, ref message } if message == "Contract limit reached"
        ));
        assert!(matches!(
            failure(400, br#"{"message": "Bad file"}"#),
            error::Api::Rejected { ref message, .. } if message == "Bad file"
        ));
        assert!(matches!(failure(502, b"<html>"), error::Api::Status(502)));
    }

    #[tokio::test]
    async fn unauthorized_listing_ends_the_session() -> Result<()> {
        let transport = FakeTransport::default();
        _ = transport.respond(401, &json!({"error": "Token expired"}));
        let (gateway, session, navigator) = testing::gateway(&transport).await;
        session.set_auth(user(), Token::new("stale")).await?;

        let result = gateway.list_contracts().await;
        assert!(matches!(
            result,
            Err(error::Error::Api(error::Api::SessionExpired))
        ));
        assert!(result.err().is_some_and(|e| e.is_handled()));
        assert!(!session.snapshot().is_authenticated());
        assert_eq!(navigator.visits(), [(Route::Login, true)]);
        Ok(())
    }

    #[tokio::test]
    async fn rejected_login_keeps_the_session() -> Result<()> {
        let transport = FakeTransport::default();
        _ = transport.respond(401, &json!({"message": "Invalid credentials"}));
        let (gateway, session, navigator) = testing::gateway(&transport).await;
        session.set_auth(user(), Token::new("current")).await?;

        let result = gateway.login("ana@example.com", &password()).await;
        match result {
            Err(error::Error::Api(error::Api::Rejected { status, message })) => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid credentials");
            }
            other => panic!("expected a rejection, got {other:?}"),
        }
        assert!(session.snapshot().is_authenticated());
        assert!(navigator.visits().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn bearer_is_attached_only_with_a_session() -> Result<()> {
        let transport = FakeTransport::default();
        _ = transport
            .respond(200, &json!([]))
            .respond(200, &json!([]));
        let (gateway, session, _) = testing::gateway(&transport).await;

        _ = gateway.list_contracts().await?;
        session.set_auth(user(), Token::new("secret-token")).await?;
        _ = gateway.list_contracts().await?;

        let bearers = transport
            .requests()
            .into_iter()
            .map(|request| request.bearer.map(|token| token.expose().to_owned()))
            .collect::<Vec<_>>();
        assert_eq!(bearers, [None, Some("secret-token".to_owned())]);
        Ok(())
    }

    #[tokio::test]
    async fn server_errors_pass_through() -> Result<()> {
        let transport = FakeTransport::default();
        _ = transport.respond(500, &Value::Null);
        let (gateway, session, navigator) = testing::gateway(&transport).await;
        session.set_auth(user(), Token::new("secret-token")).await?;

        assert!(matches!(
            gateway.contract(&ContractId::from("c-1")).await,
            Err(error::Error::Api(error::Api::Status(500)))
        ));
        assert!(session.snapshot().is_authenticated());
        assert!(navigator.visits().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn login_sends_credentials() -> Result<()> {
        let transport = FakeTransport::default();
        _ = transport.respond(
            200,
            &json!({
                "accessToken": "fresh",
                "tokenType": "bearer",
                "user": serde_json::to_value(user())?,
            }),
        );
        let (gateway, _, _) = testing::gateway(&transport).await;

        let auth = gateway.login("ana@example.com", &password()).await?;
        assert_eq!(auth.access_token.expose(), "fresh");
        assert_eq!(auth.user, user());

        let requests = transport.requests();
        assert_eq!(requests[0].endpoint, Endpoint::Login);
        assert!(requests[0].bearer.is_none());
        assert!(matches!(
            &requests[0].body,
            Body::Json(body) if *body == json!({"email": "ana@example.com", "password": "hunter2"})
        ));
        Ok(())
    }

    #[tokio::test]
    async fn upload_returns_a_pending_contract() -> Result<()> {
        let transport = FakeTransport::default();
        _ = transport.respond(
            201,
            &contract_json("c-9", "pending", "2024-06-01T09:00:00Z"),
        );
        let (gateway, _, _) = testing::gateway(&transport).await;

        let contract = gateway
            .upload(Upload {
                file_name: "lease.pdf".to_owned(),
                bytes: b"%PDF-1.7".to_vec(),
                title: "Lease".to_owned(),
                client_name: Some("ACME".to_owned()),
                contract_type: None,
            })
            .await?;
        assert_eq!(contract.status(), Status::Pending);
        assert!(matches!(
            &transport.requests()[0].body,
            Body::Multipart(upload) if upload.file_name == "lease.pdf"
        ));
        Ok(())
    }
}
