// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use futures_util::lock::Mutex;
use log::{debug, info};
use secrecy::SecretString;

use crate::{
    error::{self, Error, Result},
    gateway::Gateway,
    model::{
        contract::{Contract, ContractId, PlanUsage, Upload},
        user::User,
    },
    quota::{self, Snapshot, TierLimits},
    session::SessionManager,
    tracker::{Origin, Tracker, Transition},
};

/// The user-level operations, combining the session, the remote service, the
/// tracked contracts and the quota rules.
///
/// The tracker lock is never held while waiting on the service.
pub(crate) struct Workspace {
    gateway: Arc<Gateway>,
    session: Arc<SessionManager>,
    limits: TierLimits,
    tracker: Mutex<Tracker>,
}

impl Workspace {
    pub(crate) fn new(
        gateway: Arc<Gateway>,
        session: Arc<SessionManager>,
        limits: TierLimits,
    ) -> Self {
        Self {
            gateway,
            session,
            limits,
            tracker: Mutex::new(Tracker::new()),
        }
    }

    pub(crate) async fn login(&self, email: &str, password: &SecretString) -> Result<User> {
        let auth = self.gateway.login(email, password).await?;
        self.session
            .set_auth(auth.user.clone(), auth.access_token)
            .await?;
        Ok(auth.user)
    }

    pub(crate) async fn register(
        &self,
        email: &str,
        password: &SecretString,
        full_name: Option<&str>,
        industry: Option<&str>,
    ) -> Result<User> {
        let auth = self
            .gateway
            .register(email, password, full_name, industry)
            .await?;
        self.session
            .set_auth(auth.user.clone(), auth.access_token)
            .await?;
        Ok(auth.user)
    }

    /// Re-reads the profile from the service and stores it with the current
    /// token, picking up tier changes.
    pub(crate) async fn refresh_profile(&self) -> Result<User> {
        let user = self.gateway.me().await?;
        let token = self
            .session
            .snapshot()
            .token()
            .cloned()
            .ok_or(Error::AccessDenied)?;
        self.session.set_auth(user.clone(), token).await?;
        Ok(user)
    }

    /// Replaces the tracked contracts with the service's full listing.
    pub(crate) async fn reload(&self) -> Result<()> {
        let contracts = self.gateway.list_contracts().await?;
        self.tracker.lock().await.replace_all(contracts);
        Ok(())
    }

    async fn ensure_loaded(&self) -> Result<()> {
        let loaded = self.tracker.lock().await.is_loaded();
        if loaded {
            Ok(())
        } else {
            self.reload().await
        }
    }

    /// All tracked contracts, newest first.
    pub(crate) async fn contracts(&self) -> Result<Vec<Contract>> {
        self.ensure_loaded().await?;
        let tracker = self.tracker.lock().await;
        Ok(tracker.newest_first().into_iter().cloned().collect())
    }

    pub(crate) async fn origin(&self, id: &ContractId) -> Option<Origin> {
        self.tracker.lock().await.origin(id)
    }

    /// This month's usage against the caller's tier, computed from the tracked
    /// contracts.
    pub(crate) async fn quota(&self) -> Result<Snapshot> {
        self.ensure_loaded().await?;
        let session = self.session.snapshot();
        let tracker = self.tracker.lock().await;
        Ok(quota::snapshot(
            tracker.contracts(),
            session.tier(),
            &self.limits,
        ))
    }

    /// The service's own accounting of the current period.
    pub(crate) async fn plan_usage(&self) -> Result<PlanUsage> {
        self.gateway.usage().await
    }

    /// Submits a new contract, provided the monthly allowance is not used up.
    pub(crate) async fn upload(&self, upload: Upload) -> Result<Contract> {
        let usage = self.quota().await?;
        if !usage.can_create {
            return Err(Error::QuotaExceeded {
                used: usage.used,
                limit: usage.limit,
            });
        }

        let contract = self.gateway.upload(upload).await?;
        info!("Uploaded contract {}", contract.id());
        _ = self.tracker.lock().await.insert(contract.clone());
        Ok(contract)
    }

    /// Reads one tracked contract from the service and replaces the tracked
    /// copy.
    ///
    /// Returns `None` if the contract is no longer tracked once the read
    /// completes.
    pub(crate) async fn refresh(&self, id: &ContractId) -> Result<Option<Contract>> {
        let contract = self.gateway.contract(id).await?;
        let mut tracker = self.tracker.lock().await;
        Ok(tracker.reconcile(contract.clone()).then_some(contract))
    }

    /// Reads one contract from the service, tracking it if it was not tracked
    /// yet. Returns `None` for a contract deleted locally.
    pub(crate) async fn open(&self, id: &ContractId) -> Result<Option<Contract>> {
        let tracked = self.tracker.lock().await.get(id).is_some();
        if tracked {
            return self.refresh(id).await;
        }

        let contract = self.gateway.contract(id).await?;
        let mut tracker = self.tracker.lock().await;
        Ok(tracker.insert(contract.clone()).then_some(contract))
    }

    /// Starts analysis of a pending contract and marks it as analyzing once
    /// the service accepts.
    pub(crate) async fn analyze(&self, id: &ContractId) -> Result<Contract> {
        let tracked = self.tracker.lock().await.get(id).is_some();
        if !tracked && self.open(id).await?.is_none() {
            return Err(error::Transition::Untracked(id.clone()).into());
        }
        self.tracker
            .lock()
            .await
            .check(id, Transition::Analyze)?;

        self.gateway.analyze(id).await?;
        debug!("Analysis of {} accepted", id);

        let mut tracker = self.tracker.lock().await;
        Ok(tracker.apply(id, Transition::Analyze)?.clone())
    }

    pub(crate) async fn delete(&self, id: &ContractId) -> Result<()> {
        self.gateway.delete_contract(id).await?;
        _ = self.tracker.lock().await.remove(id);
        info!("Deleted contract {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Local, SecondsFormat};
    use serde_json::{json, Value};

    use crate::{
        credentials::Token,
        gateway::{transport::Body, Endpoint},
        model::{
            contract::{Assessment, Status},
            user::Tier,
        },
        quota::Allowance,
        testing::{self, contract_json, user, user_with_tier, FakeTransport},
    };

    use super::*;

    fn this_month() -> String {
        Local::now().to_rfc3339_opts(SecondsFormat::Secs, false)
    }

    fn upload(title: &str) -> Upload {
        Upload {
            file_name: format!("{title}.pdf"),
            bytes: b"%PDF-1.7".to_vec(),
            title: title.to_owned(),
            client_name: None,
            contract_type: None,
        }
    }

    async fn workspace(transport: &FakeTransport) -> (Workspace, Arc<SessionManager>) {
        let (gateway, session, _) = testing::gateway(transport).await;
        let workspace = Workspace::new(gateway, Arc::clone(&session), TierLimits::default());
        (workspace, session)
    }

    fn endpoints(transport: &FakeTransport) -> Vec<Endpoint> {
        transport
            .requests()
            .into_iter()
            .map(|request| request.endpoint)
            .collect()
    }

    #[tokio::test]
    async fn login_upload_analyze_complete() -> Result<()> {
        let created = "2024-06-01T09:00:00Z";
        let mut completed = contract_json("c-1", "completed", created);
        completed["updatedAt"] = json!("2024-06-01T09:05:00Z");
        completed["riskScore"] = json!(72);
        completed["overallAssessment"] = json!("alto");

        let transport = FakeTransport::default();
        _ = transport
            .respond(
                200,
                &json!({
                    "accessToken": "fresh",
                    "tokenType": "bearer",
                    "user": serde_json::to_value(user())?,
                }),
            )
            .respond(200, &json!([]))
            .respond(201, &contract_json("c-1", "pending", created))
            .respond(202, &Value::Null)
            .respond(200, &completed);
        let (workspace, session) = workspace(&transport).await;

        let user = workspace
            .login("ana@example.com", &SecretString::new("hunter2".to_owned()))
            .await?;
        assert_eq!(user.tier, Tier::new(Tier::PREMIUM));
        assert!(session.snapshot().is_authenticated());

        let uploaded = workspace.upload(upload("lease")).await?;
        assert_eq!(uploaded.status(), Status::Pending);
        let id = uploaded.id().clone();

        let analyzing = workspace.analyze(&id).await?;
        assert_eq!(analyzing.status(), Status::Analyzing);
        assert!(analyzing.updated_at() > uploaded.updated_at());
        assert_eq!(workspace.origin(&id).await, Some(Origin::Optimistic));

        let refreshed = workspace.refresh(&id).await?.expect("still tracked");
        assert_eq!(refreshed.status(), Status::Completed);
        let risk = refreshed.risk().map(|risk| (risk.score(), risk.assessment()));
        assert_eq!(risk, Some((72, Assessment::High)));
        assert_eq!(workspace.origin(&id).await, Some(Origin::Server));

        let requests = transport.requests();
        assert!(requests[0].bearer.is_none());
        assert!(requests[1..]
            .iter()
            .all(|request| request.bearer.as_ref().map(Token::expose) == Some("fresh")));
        Ok(())
    }

    #[tokio::test]
    async fn free_tier_upload_is_blocked_until_a_delete() -> Result<()> {
        let now = this_month();
        let transport = FakeTransport::default();
        _ = transport
            .respond(
                200,
                &json!([
                    contract_json("a", "pending", &now),
                    contract_json("b", "pending", &now),
                    contract_json("c", "pending", &now),
                ]),
            )
            .respond(204, &Value::Null)
            .respond(201, &contract_json("d", "pending", &now));
        let (workspace, session) = workspace(&transport).await;
        session
            .set_auth(user_with_tier("free"), Token::new("secret-token"))
            .await?;

        match workspace.upload(upload("fourth")).await {
            Err(Error::QuotaExceeded { used, limit }) => {
                assert_eq!(used, 3);
                assert_eq!(limit, Allowance::Limited(3));
            }
            other => panic!("expected the quota to block, got {other:?}"),
        }
        assert_eq!(endpoints(&transport), [Endpoint::ListContracts]);

        workspace.delete(&ContractId::from("c")).await?;
        assert_eq!(workspace.quota().await?.remaining, Allowance::Limited(1));
        _ = workspace.upload(upload("fourth")).await?;
        assert!(matches!(
            transport.requests().last().map(|request| &request.body),
            Some(Body::Multipart(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn old_contracts_do_not_count_against_the_quota() -> Result<()> {
        let old = (Local::now() - Duration::days(120)).to_rfc3339_opts(SecondsFormat::Secs, false);
        let mut old_contract = contract_json("a", "completed", &old);
        old_contract["riskScore"] = json!(10);
        old_contract["overallAssessment"] = json!("bajo");
        let transport = FakeTransport::default();
        _ = transport.respond(
            200,
            &json!([old_contract, contract_json("b", "pending", &this_month())]),
        );
        let (workspace, session) = workspace(&transport).await;
        session
            .set_auth(user_with_tier("free"), Token::new("secret-token"))
            .await?;

        let usage = workspace.quota().await?;
        assert_eq!(usage.used, 1);
        assert_eq!(usage.remaining, Allowance::Limited(2));
        assert!(usage.can_create);
        Ok(())
    }

    #[tokio::test]
    async fn completed_contract_is_not_reanalyzed() -> Result<()> {
        let mut completed = contract_json("c-1", "completed", "2024-06-01T09:00:00Z");
        completed["riskScore"] = json!(30);
        completed["overallAssessment"] = json!("low");
        let transport = FakeTransport::default();
        _ = transport.respond(200, &json!([completed]));
        let (workspace, session) = workspace(&transport).await;
        session.set_auth(user(), Token::new("secret-token")).await?;
        workspace.reload().await?;

        let id = ContractId::from("c-1");
        assert!(matches!(
            workspace.analyze(&id).await,
            Err(Error::Transition(error::Transition::Invalid { .. }))
        ));
        assert_eq!(endpoints(&transport), [Endpoint::ListContracts]);
        assert_eq!(workspace.origin(&id).await, Some(Origin::Server));
        Ok(())
    }

    #[tokio::test]
    async fn refresh_after_delete_is_dropped() -> Result<()> {
        let created = "2024-06-01T09:00:00Z";
        let transport = FakeTransport::default();
        _ = transport
            .respond(200, &json!([contract_json("c-1", "analyzing", created)]))
            .respond(204, &Value::Null)
            .respond(200, &contract_json("c-1", "analyzing", created));
        let (workspace, session) = workspace(&transport).await;
        session.set_auth(user(), Token::new("secret-token")).await?;
        workspace.reload().await?;

        let id = ContractId::from("c-1");
        workspace.delete(&id).await?;
        assert!(workspace.refresh(&id).await?.is_none());
        assert!(workspace.contracts().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn listing_that_raced_a_delete_keeps_it_deleted() -> Result<()> {
        let created = "2024-06-01T09:00:00Z";
        let transport = FakeTransport::default();
        _ = transport
            .respond(200, &json!([contract_json("c-1", "analyzing", created)]))
            .respond(204, &Value::Null)
            .respond(200, &json!([contract_json("c-1", "analyzing", created)]));
        let (workspace, session) = workspace(&transport).await;
        session.set_auth(user(), Token::new("secret-token")).await?;
        workspace.reload().await?;

        let id = ContractId::from("c-1");
        workspace.delete(&id).await?;
        workspace.reload().await?;
        assert!(workspace.contracts().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn analyze_fetches_an_untracked_contract() -> Result<()> {
        let created = "2024-06-01T09:00:00Z";
        let transport = FakeTransport::default();
        _ = transport
            .respond(200, &contract_json("c-9", "pending", created))
            .respond(202, &Value::Null);
        let (workspace, session) = workspace(&transport).await;
        session.set_auth(user(), Token::new("secret-token")).await?;

        let id = ContractId::from("c-9");
        let analyzing = workspace.analyze(&id).await?;
        assert_eq!(analyzing.status(), Status::Analyzing);
        assert_eq!(
            endpoints(&transport),
            [Endpoint::Contract(id.clone()), Endpoint::Analyze(id)]
        );
        Ok(())
    }

    #[tokio::test]
    async fn expired_session_during_listing() -> Result<()> {
        let transport = FakeTransport::default();
        _ = transport.respond(401, &json!({"error": "jwt expired"}));
        let (workspace, session) = workspace(&transport).await;
        session.set_auth(user(), Token::new("stale")).await?;

        let err = workspace.contracts().await.expect_err("listing must fail");
        assert!(err.is_handled());
        assert!(!session.snapshot().is_authenticated());
        Ok(())
    }
}
