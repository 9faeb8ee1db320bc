//! JSON bodies exchanged over the HTTP API.
//!
//! Field names are camelCase on the wire. Money is always an integer count
//! of minor units (cents) of the account currency.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Eur,
    Usd,
    Gbp,
    Brl,
}

/// Role of a user inside an account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountRole {
    Owner,
    Admin,
    Member,
}

/// Error body returned with every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

/// Acknowledgement for actions that return no resource.
#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Minimal public profile used inside other resources.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
}

pub mod auth {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Register {
        #[serde(default)]
        pub name: String,
        #[serde(default)]
        pub email: String,
        #[serde(default)]
        pub password: String,
        #[serde(default)]
        pub confirm_password: String,
        pub gender: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Login {
        #[serde(default)]
        pub email: String,
        #[serde(default)]
        pub password: String,
    }

    /// Google ID token obtained by the client.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GoogleLogin {
        #[serde(default)]
        pub id_token: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AuthResponse {
        pub token: String,
        pub user: super::user::User,
    }
}

pub mod user {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Provider {
        Local,
        Google,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct User {
        pub id: String,
        pub name: String,
        pub email: String,
        pub gender: Option<String>,
        pub provider: Provider,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct UserUpdate {
        pub name: Option<String>,
        pub gender: Option<String>,
        pub current_password: Option<String>,
        pub new_password: Option<String>,
        pub confirm_new_password: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct UserDelete {
        pub password: Option<String>,
    }
}

pub mod account {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AccountNew {
        pub name: String,
        pub description: Option<String>,
        pub currency: Option<Currency>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AccountUpdate {
        pub name: Option<String>,
        pub description: Option<String>,
        pub currency: Option<Currency>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Account {
        pub id: String,
        pub name: String,
        pub description: Option<String>,
        pub currency: Currency,
        /// The caller's role, when known.
        pub role: Option<AccountRole>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AccountDetail {
        #[serde(flatten)]
        pub account: Account,
        pub members: Vec<super::member::Member>,
    }
}

pub mod member {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Member {
        pub id: String,
        pub account_id: String,
        pub role: AccountRole,
        pub user: UserSummary,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RoleUpdate {
        pub role: String,
    }
}

pub mod invite {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum InviteStatus {
        Pending,
        Accepted,
        Expired,
        Cancelled,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct InviteNew {
        pub account_id: String,
        pub email: String,
        pub role: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct InviteAccount {
        pub id: String,
        pub name: String,
        pub currency: Currency,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Invite {
        pub id: String,
        pub email: String,
        pub account_id: String,
        pub role: AccountRole,
        pub token: String,
        pub status: InviteStatus,
        pub expires_at: DateTime<Utc>,
        pub invited_by_id: String,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub account: Option<InviteAccount>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub invited_by: Option<UserSummary>,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum TransactionType {
        Income,
        Expense,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionNew {
        pub account_id: String,
        pub title: String,
        pub amount: i64,
        #[serde(rename = "type")]
        pub kind: TransactionType,
        pub category: String,
        pub notes: Option<String>,
        pub date: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionUpdate {
        pub title: Option<String>,
        pub amount: Option<i64>,
        #[serde(rename = "type")]
        pub kind: Option<TransactionType>,
        pub category: Option<String>,
        pub notes: Option<String>,
        pub date: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Transaction {
        pub id: String,
        pub account_id: String,
        pub title: String,
        pub amount: i64,
        #[serde(rename = "type")]
        pub kind: TransactionType,
        pub category: String,
        pub notes: Option<String>,
        pub date: DateTime<Utc>,
        pub created_by_id: String,
        pub updated_by_id: Option<String>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

pub mod saving_goal {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum MoveType {
        Add,
        Remove,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SavingGoalNew {
        pub account_id: String,
        pub title: String,
        pub target_amount: i64,
        pub deadline: Option<DateTime<Utc>>,
        pub notes: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SavingGoalUpdate {
        pub title: Option<String>,
        pub target_amount: Option<i64>,
        pub deadline: Option<DateTime<Utc>>,
        pub notes: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MoveMoney {
        pub amount: i64,
        #[serde(rename = "type")]
        pub kind: MoveType,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SavingGoal {
        pub id: String,
        pub account_id: String,
        pub title: String,
        pub target_amount: i64,
        pub current_amount: i64,
        pub deadline: Option<DateTime<Utc>>,
        pub notes: Option<String>,
        pub created_by_id: String,
        pub updated_by_id: Option<String>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

pub mod analytics {
    use super::*;

    /// `?month=&year=` filter. Both must be numeric to select a month.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct PeriodQuery {
        pub month: Option<String>,
        pub year: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Summary {
        pub total_income: i64,
        pub total_expense: i64,
        pub balance: i64,
        pub transaction_count: u64,
        pub period: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CategoryTotal {
        pub category: String,
        pub total: i64,
        pub percentage: f64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Dashboard {
        pub summary: Summary,
        pub categories: Vec<CategoryTotal>,
        pub recent_transactions: Vec<super::transaction::Transaction>,
    }
}

pub mod audit {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum AuditAction {
        Create,
        Update,
        Delete,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AuditQuery {
        pub action: Option<AuditAction>,
        pub entity_type: Option<String>,
        pub start_date: Option<DateTime<Utc>>,
        pub end_date: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AuditLog {
        pub id: String,
        pub action: AuditAction,
        pub entity_type: String,
        pub entity_id: String,
        pub performed_by_id: String,
        pub account_id: String,
        pub old_data: Option<serde_json::Value>,
        pub new_data: Option<serde_json::Value>,
        pub created_at: DateTime<Utc>,
        pub performed_by: Option<UserSummary>,
    }
}
