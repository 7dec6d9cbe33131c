//! # Splitwise Adapter
//!
//! HTTP implementation of [`GroupDirectory`] and [`LedgerClient`] against
//! the Splitwise v3.0 API.
//!
//! ## Endpoints
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET  {base}/get_groups        → {"groups": [{"id", "name"}]}           │
//! │  GET  {base}/get_group/{id}    → {"group": {"members": [                │
//! │                                     {"id", "first_name", "last_name"}]}}│
//! │  POST {base}/create_expense    ← form fields (see below)                │
//! │                                → {"expenses": [...], "errors": {...}}   │
//! │                                                                         │
//! │  All requests: Authorization: Bearer <access token>                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Expense Form
//! ```text
//! cost=24.00  description=Bill split: ...  date=2024-11-23
//! group_id=123456  split_equally=true
//!
//! itemized only, N = 0, 1, ...:
//! users__N__user_id=11  users__N__paid_share=0.00  users__N__owed_share=13.50
//! ```
//!
//! A member's display name is their `first_name`. Members arrive either
//! flat or wrapped as `{"user": {"id", "first_name"}}`; both are accepted.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use billsplit_core::{ExpenseRequest, GroupId, GroupSummary, Member};

use crate::config::LedgerSettings;
use crate::error::{LedgerError, LedgerResult};
use crate::ports::{GroupDirectory, LedgerAck, LedgerClient};

/// Public Splitwise API root.
pub const DEFAULT_API_BASE: &str = "https://secure.splitwise.com/api/v3.0";

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct GroupsResponse {
    groups: Vec<WireGroup>,
}

#[derive(Debug, Deserialize)]
struct WireGroup {
    id: GroupId,
    name: String,
}

#[derive(Debug, Deserialize)]
struct GroupResponse {
    group: WireGroupDetail,
}

#[derive(Debug, Deserialize)]
struct WireGroupDetail {
    #[serde(default)]
    members: Vec<WireMember>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireMember {
    Nested { user: WireUser },
    Flat(WireUser),
}

#[derive(Debug, Deserialize)]
struct WireUser {
    id: i64,
    #[serde(default)]
    first_name: Option<String>,
}

impl From<WireMember> for Member {
    fn from(member: WireMember) -> Self {
        let (WireMember::Nested { user } | WireMember::Flat(user)) = member;
        Member::new(user.id, user.first_name.unwrap_or_default())
    }
}

#[derive(Debug, Default, Deserialize)]
struct CreateExpenseResponse {
    #[serde(default)]
    expenses: Vec<WireExpense>,
    #[serde(default)]
    errors: Value,
}

#[derive(Debug, Deserialize)]
struct WireExpense {
    id: i64,
}

// =============================================================================
// Client
// =============================================================================

/// Splitwise API client.
#[derive(Debug, Clone)]
pub struct SplitwiseClient {
    http: Client,
    base_url: String,
    access_token: String,
}

impl SplitwiseClient {
    /// Creates a client for `base_url` (no trailing slash needed).
    pub fn new(
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        timeout: Duration,
    ) -> LedgerResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::Config(format!("HTTP client: {e}")))?;

        Ok(SplitwiseClient {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        })
    }

    /// Creates a client from the `[ledger]` settings.
    ///
    /// The settings must already hold a resolved access token.
    pub fn from_settings(settings: &LedgerSettings) -> LedgerResult<Self> {
        let token = settings
            .access_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| LedgerError::Config("Splitwise access token is not set".into()))?;

        Self::new(
            settings.api_base.clone(),
            token.trim(),
            Duration::from_secs(settings.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> LedgerResult<T> {
        let url = self.endpoint(path);
        debug!(url = %url, "Splitwise GET");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = read_body(response).await;
            return Err(LedgerError::Directory(format!(
                "GET {path} returned {}: {body}",
                status.as_u16()
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| LedgerError::Parse(format!("GET {path}: {e}")))
    }
}

#[async_trait]
impl GroupDirectory for SplitwiseClient {
    async fn list_groups(&self) -> LedgerResult<Vec<GroupSummary>> {
        let response: GroupsResponse = self.get_json("get_groups").await?;
        Ok(response
            .groups
            .into_iter()
            .map(|g| GroupSummary {
                id: g.id,
                name: g.name,
            })
            .collect())
    }

    async fn get_members(&self, group_id: GroupId) -> LedgerResult<Vec<Member>> {
        let response: GroupResponse = self.get_json(&format!("get_group/{group_id}")).await?;
        Ok(response
            .group
            .members
            .into_iter()
            .map(Member::from)
            .collect())
    }
}

#[async_trait]
impl LedgerClient for SplitwiseClient {
    async fn create_expense(&self, request: &ExpenseRequest) -> LedgerResult<LedgerAck> {
        let fields = to_form_fields(request);
        debug!(
            group_id = request.group_id,
            cost = %request.cost,
            field_count = fields.len(),
            "Splitwise POST create_expense"
        );

        let response = self
            .http
            .post(self.endpoint("create_expense"))
            .bearer_auth(&self.access_token)
            .form(&fields)
            .send()
            .await?;

        let status = response.status();
        let body = read_body(response).await;

        if !status.is_success() {
            return Err(LedgerError::Remote {
                status: status.as_u16(),
                body,
            });
        }

        parse_expense_response(status, &body)
    }
}

/// Decodes a 2xx `create_expense` body. A non-empty `errors` field is a
/// rejection even though the status says otherwise.
fn parse_expense_response(status: StatusCode, body: &str) -> LedgerResult<LedgerAck> {
    let parsed: CreateExpenseResponse = if body.trim().is_empty() {
        CreateExpenseResponse::default()
    } else {
        serde_json::from_str(body)
            .map_err(|e| LedgerError::Parse(format!("create_expense: {e}")))?
    };

    if has_errors(&parsed.errors) {
        warn!(status = status.as_u16(), errors = %parsed.errors, "Splitwise rejected expense");
        return Err(LedgerError::Remote {
            status: status.as_u16(),
            body: parsed.errors.to_string(),
        });
    }

    Ok(LedgerAck {
        expense_ids: parsed.expenses.into_iter().map(|e| e.id).collect(),
    })
}

fn has_errors(errors: &Value) -> bool {
    match errors {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

async fn read_body(response: Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|e| format!("<unreadable body: {e}>"))
}

/// Flattens an expense request into Splitwise form fields.
pub fn to_form_fields(request: &ExpenseRequest) -> Vec<(String, String)> {
    let mut fields = vec![
        ("cost".to_string(), request.cost.to_ledger_string()),
        ("description".to_string(), request.description.clone()),
        ("date".to_string(), request.date.to_string()),
        ("group_id".to_string(), request.group_id.to_string()),
        ("split_equally".to_string(), request.split_equally.to_string()),
    ];

    if let Some(shares) = &request.shares {
        for (index, (member_id, share)) in shares.iter().enumerate() {
            fields.push((format!("users__{index}__user_id"), member_id.to_string()));
            fields.push((
                format!("users__{index}__paid_share"),
                share.paid_share.to_ledger_string(),
            ));
            fields.push((
                format!("users__{index}__owed_share"),
                share.owed_share.to_ledger_string(),
            ));
        }
    }

    fields
}

// =============================================================================
// Unit Tests
// =============================================================================
