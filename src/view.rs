// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Local, Utc};
use inflector::Inflector as _;
use tabled::{settings::Style, Table, Tabled};

use crate::{
    model::{
        contract::{Assessment, Clause, Contract, PlanUsage},
        user::User,
    },
    quota::Snapshot,
    tracker::Origin,
};

const NONE: &str = "-";

fn local(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn titled(value: Option<&str>) -> String {
    value.map_or_else(|| NONE.to_owned(), |value| value.to_title_case())
}

#[derive(Clone, Debug, Tabled)]
pub(crate) struct ContractRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Client")]
    client: String,
    #[tabled(rename = "Status", display_with("Self::format_status", self))]
    status: String,
    #[tabled(rename = "Risk")]
    risk: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(skip)]
    optimistic: bool,
}

impl ContractRow {
    pub(crate) fn new(contract: &Contract, origin: Option<Origin>) -> Self {
        Self {
            id: contract.id().to_string(),
            title: contract.title.clone(),
            client: contract
                .client_name
                .clone()
                .unwrap_or_else(|| NONE.to_owned()),
            status: contract.status().to_string(),
            risk: contract
                .risk()
                .map_or_else(|| NONE.to_owned(), |risk| risk.to_string()),
            created: local(contract.created_at()),
            optimistic: origin == Some(Origin::Optimistic),
        }
    }

    fn format_status(&self) -> String {
        if self.optimistic {
            format!("{} (unconfirmed)", self.status)
        } else {
            self.status.clone()
        }
    }
}

fn or_none(value: &str) -> String {
    if value.is_empty() {
        NONE.to_owned()
    } else {
        value.to_owned()
    }
}

#[derive(Clone, Debug, Tabled)]
struct ClauseRow {
    #[tabled(rename = "Risk", display_with("Self::format_risk", self))]
    risk: Option<Assessment>,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Clause")]
    text: String,
    #[tabled(rename = "Article")]
    article: String,
    #[tabled(rename = "Benchmark")]
    benchmark: String,
    #[tabled(rename = "Suggestion")]
    suggestion: String,
}

impl ClauseRow {
    fn format_risk(&self) -> String {
        self.risk
            .map_or_else(|| NONE.to_owned(), |risk| risk.to_string())
    }
}

impl From<&Clause> for ClauseRow {
    fn from(value: &Clause) -> Self {
        Self {
            risk: value.risk_level,
            kind: or_none(&value.clause_type.to_title_case()),
            text: value.clause_text.clone(),
            article: or_none(&value.legal_article),
            benchmark: or_none(&value.industry_benchmark),
            suggestion: if value.negotiation_suggestion.is_empty() {
                or_none(&value.alternative_clause)
            } else {
                value.negotiation_suggestion.clone()
            },
        }
    }
}

#[derive(Clone, Debug, Tabled)]
struct Field {
    #[tabled(rename = "Field")]
    name: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

fn fields<I: IntoIterator<Item = (&'static str, String)>>(fields: I) -> Table {
    let mut table = Table::new(
        fields
            .into_iter()
            .map(|(name, value)| Field { name, value }),
    );
    _ = table.with(Style::rounded());
    table
}

pub(crate) fn contracts<I: IntoIterator<Item = ContractRow>>(rows: I) -> Table {
    let mut table = Table::new(rows);
    _ = table.with(Style::rounded());
    table
}

pub(crate) fn profile(user: &User) -> Table {
    fields([
        ("Name", user.display_name().to_owned()),
        ("Email", user.email.clone()),
        ("Industry", titled(user.industry.as_deref())),
        ("Plan", user.tier.to_string()),
        ("Subscription", user.status.to_string()),
        ("Member since", local(user.created_at)),
    ])
}

pub(crate) fn contract(contract: &Contract, origin: Option<Origin>) -> Table {
    let row = ContractRow::new(contract, origin);
    let mut details = vec![
        ("ID", row.id.clone()),
        ("Title", row.title.clone()),
        ("Client", row.client.clone()),
        ("Type", titled(contract.contract_type.as_deref())),
        ("Status", row.format_status()),
        ("Risk", row.risk.clone()),
        ("Created", row.created),
        ("Updated", local(contract.updated_at())),
    ];
    if let Some(summary) = contract
        .analysis
        .as_ref()
        .map(|analysis| analysis.summary.as_str())
        .or(contract.summary.as_deref())
        .filter(|summary| !summary.is_empty())
    {
        details.push(("Summary", summary.to_owned()));
    }
    if let Some(analysis) = &contract.analysis {
        if !analysis.red_flags.is_empty() {
            details.push(("Red flags", analysis.red_flags.join("\n")));
        }
        if !analysis.next_steps.is_empty() {
            details.push(("Next steps", analysis.next_steps.join("\n")));
        }
    }
    fields(details)
}

/// The clauses flagged by an analysis, riskiest first.
pub(crate) fn clauses(contract: &Contract) -> Option<Table> {
    let analysis = contract.analysis.as_ref()?;
    if analysis.clauses.is_empty() {
        return None;
    }

    let mut rows = analysis
        .clauses
        .iter()
        .map(ClauseRow::from)
        .collect::<Vec<_>>();
    rows.sort_by(|a, b| b.risk.cmp(&a.risk));
    let mut table = Table::new(rows);
    _ = table.with(Style::rounded());
    Some(table)
}

pub(crate) fn usage(snapshot: &Snapshot, plan: Option<&PlanUsage>) -> Table {
    let mut details = vec![
        ("Used this month", snapshot.used.to_string()),
        ("Monthly allowance", snapshot.limit.to_string()),
        ("Remaining", snapshot.remaining.to_string()),
        (
            "Can upload",
            if snapshot.can_create { "yes" } else { "no" }.to_owned(),
        ),
    ];
    if let Some(plan) = plan {
        details.push(("Plan", plan.tier.to_string()));
        details.push((
            "Reported by service",
            format!(
                "{} of {} used, {} remaining",
                plan.contracts_this_month, plan.contracts_limit, plan.contracts_remaining
            ),
        ));
        if !plan.can_upload {
            details.push(("Service allows upload", "no".to_owned()));
        }
    }
    fields(details)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::testing::{contract_json, user};

    use super::*;

    fn analyzed() -> Contract {
        let mut value = contract_json("c-1", "completed", "2024-06-01T09:00:00Z");
        value["riskScore"] = json!(72);
        value["overallAssessment"] = json!("alto");
        value["aiResponse"] = json!({
            "clauses": [
                {"riskLevel": "bajo", "clauseText": "Payment in 30 days.", "clauseType": "payment_terms"},
                {"riskLevel": "critico", "clauseText": "Unlimited liability.", "clauseType": "liability",
                 "industryBenchmark": "Usually capped at annual fees.",
                 "negotiationSuggestion": "Cap liability at the contract value."},
                {"riskLevel": null, "clauseText": "Governed by local law."}
            ],
            "summary": "Liability is uncapped.",
            "redFlags": ["Unlimited liability"],
            "nextSteps": []
        });
        serde_json::from_value(value).expect("valid contract fixture")
    }

    #[test]
    fn pending_contract_has_no_risk() {
        let contract: Contract =
            serde_json::from_value(contract_json("c-2", "pending", "2024-06-01T09:00:00Z"))
                .expect("valid contract fixture");
        let row = ContractRow::new(&contract, Some(Origin::Server));

        assert_eq!(row.risk, NONE);
        assert_eq!(row.format_status(), "pending");
    }

    #[test]
    fn optimistic_status_is_marked() {
        let contract: Contract =
            serde_json::from_value(contract_json("c-2", "analyzing", "2024-06-01T09:00:00Z"))
                .expect("valid contract fixture");
        let row = ContractRow::new(&contract, Some(Origin::Optimistic));

        assert_eq!(row.format_status(), "analyzing (unconfirmed)");
    }

    #[test]
    fn details_include_the_analysis() {
        let rendered = contract(&analyzed(), None).to_string();

        assert!(rendered.contains("72 (High)"));
        assert!(rendered.contains("Liability is uncapped."));
        assert!(rendered.contains("Unlimited liability"));
        assert!(!rendered.contains("Next steps"));
    }

    #[test]
    fn riskiest_clauses_come_first() {
        let rendered = clauses(&analyzed())
            .map(|table| table.to_string())
            .unwrap_or_default();

        let critical = rendered.find("Critical");
        let low = rendered.find("Low");
        assert!(critical.is_some() && low.is_some());
        assert!(critical < low);
        assert!(rendered.contains("Payment Terms"));
        assert!(rendered.contains("Cap liability"));
        assert!(rendered.contains("Usually capped at annual fees."));
    }

    #[test]
    fn unrated_clauses_come_last() {
        let rendered = clauses(&analyzed())
            .map(|table| table.to_string())
            .unwrap_or_default();

        let low = rendered.find("Low");
        let unrated = rendered.find("Governed by local law.");
        assert!(low.is_some() && unrated.is_some());
        assert!(low < unrated);
    }

    #[test]
    fn profile_shows_plan_and_name() {
        let rendered = profile(&user()).to_string();

        assert!(rendered.contains("Ana Pérez"));
        assert!(rendered.contains("Premium"));
        assert!(rendered.contains("Construction"));
    }
}
