//! Audit trail.
//!
//! Every mutating operation produces one or more [`AuditEntry`] values while
//! it runs. They are handed to the configured [`AuditSink`] only after the
//! operation's DB transaction has committed, and a sink failure is logged and
//! dropped: the audit trail never blocks or rolls back the mutation it
//! describes.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, DatabaseConnection, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl TryFrom<&str> for AuditAction {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "CREATE" => Ok(Self::Create),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            other => Err(EngineError::InvalidInput(format!(
                "invalid audit action: {other}"
            ))),
        }
    }
}

/// Entity kinds written to `entity_type`.
pub mod entity {
    pub const ACCOUNT: &str = "Account";
    pub const ACCOUNT_MEMBER: &str = "AccountMember";
    pub const ACCOUNT_INVITE: &str = "AccountInvite";
    pub const TRANSACTION: &str = "Transaction";
    pub const SAVING_GOAL: &str = "SavingGoal";
}

/// A pending audit record, not yet persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub action: AuditAction,
    pub entity_type: String,
    pub entity_id: String,
    pub performed_by_id: String,
    pub account_id: String,
    pub old_data: Option<serde_json::Value>,
    pub new_data: Option<serde_json::Value>,
}

impl AuditEntry {
    pub fn created<T: Serialize>(
        entity_type: &str,
        entity_id: &str,
        performed_by_id: &str,
        account_id: &str,
        new: &T,
    ) -> Self {
        Self {
            action: AuditAction::Create,
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            performed_by_id: performed_by_id.to_string(),
            account_id: account_id.to_string(),
            old_data: None,
            new_data: Some(snapshot(entity_type, new)),
        }
    }

    pub fn updated<T: Serialize>(
        entity_type: &str,
        entity_id: &str,
        performed_by_id: &str,
        account_id: &str,
        old: &T,
        new: &T,
    ) -> Self {
        Self {
            action: AuditAction::Update,
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            performed_by_id: performed_by_id.to_string(),
            account_id: account_id.to_string(),
            old_data: Some(snapshot(entity_type, old)),
            new_data: Some(snapshot(entity_type, new)),
        }
    }

    pub fn deleted<T: Serialize>(
        entity_type: &str,
        entity_id: &str,
        performed_by_id: &str,
        account_id: &str,
        old: &T,
    ) -> Self {
        Self {
            action: AuditAction::Delete,
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            performed_by_id: performed_by_id.to_string(),
            account_id: account_id.to_string(),
            old_data: Some(snapshot(entity_type, old)),
            new_data: None,
        }
    }
}

fn snapshot<T: Serialize>(entity_type: &str, value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or_else(|err| {
        tracing::warn!("audit snapshot for {entity_type} failed to serialize: {err}");
        serde_json::Value::Null
    })
}

/// A persisted audit record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
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
}

/// Performer summary attached to listed audit records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditPerformer {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditLogDetail {
    pub log: AuditLog,
    pub performed_by: Option<AuditPerformer>,
}

/// Query filters for the audit trail of one account.
#[derive(Clone, Debug, Default)]
pub struct AuditLogFilter {
    pub action: Option<AuditAction>,
    pub entity_type: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Destination for audit records.
#[async_trait]
pub trait AuditSink: Send + Sync + fmt::Debug {
    async fn write(&self, entry: &AuditEntry) -> ResultEngine<()>;
}

/// Writes audit records to the `audit_logs` table.
#[derive(Debug, Clone)]
pub struct DatabaseAuditSink {
    database: DatabaseConnection,
}

impl DatabaseAuditSink {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }
}

#[async_trait]
impl AuditSink for DatabaseAuditSink {
    async fn write(&self, entry: &AuditEntry) -> ResultEngine<()> {
        let model = ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4().to_string()),
            action: ActiveValue::Set(entry.action.as_str().to_string()),
            entity_type: ActiveValue::Set(entry.entity_type.clone()),
            entity_id: ActiveValue::Set(entry.entity_id.clone()),
            performed_by_id: ActiveValue::Set(entry.performed_by_id.clone()),
            account_id: ActiveValue::Set(entry.account_id.clone()),
            old_data: ActiveValue::Set(entry.old_data.clone()),
            new_data: ActiveValue::Set(entry.new_data.clone()),
            created_at: ActiveValue::Set(Utc::now()),
        };
        model.insert(&self.database).await?;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "audit_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub performed_by_id: String,
    pub account_id: String,
    pub old_data: Option<Json>,
    pub new_data: Option<Json>,
    pub created_at: DateTimeUtc,
}

// Audit records outlive the rows they describe, so no foreign keys.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for AuditLog {
    type Error = EngineError;

    fn try_from(value: Model) -> ResultEngine<Self> {
        Ok(Self {
            action: AuditAction::try_from(value.action.as_str())?,
            id: value.id,
            entity_type: value.entity_type,
            entity_id: value.entity_id,
            performed_by_id: value.performed_by_id,
            account_id: value.account_id,
            old_data: value.old_data,
            new_data: value.new_data,
            created_at: value.created_at,
        })
    }
}
