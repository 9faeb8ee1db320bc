//! Income and expense records of an account.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::InvalidInput(format!(
                "invalid transaction type: {other}"
            ))),
        }
    }
}

/// A single income or expense. `amount_minor` is always positive; the sign
/// comes from `kind`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub account_id: String,
    pub title: String,
    pub amount_minor: i64,
    pub kind: TransactionKind,
    pub category: String,
    pub notes: Option<String>,
    pub date: DateTime<Utc>,
    pub created_by_id: String,
    pub updated_by_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn signed_amount(&self) -> i64 {
        match self.kind {
            TransactionKind::Income => self.amount_minor,
            TransactionKind::Expense => -self.amount_minor,
        }
    }
}

/// Input for a new transaction.
#[derive(Clone, Debug)]
pub struct NewTransaction {
    pub account_id: String,
    pub title: String,
    pub amount_minor: i64,
    pub kind: TransactionKind,
    pub category: String,
    pub notes: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

/// Partial update of a transaction.
#[derive(Clone, Debug, Default)]
pub struct TransactionChanges {
    pub title: Option<String>,
    pub amount_minor: Option<i64>,
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
    pub notes: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

impl TransactionChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.amount_minor.is_none()
            && self.kind.is_none()
            && self.category.is_none()
            && self.notes.is_none()
            && self.date.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub account_id: String,
    pub title: String,
    pub amount_minor: i64,
    pub kind: String,
    pub category: String,
    pub notes: Option<String>,
    pub date: DateTimeUtc,
    pub created_by_id: String,
    pub updated_by_id: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub(crate) fn new_transaction(input: NewTransaction, created_by_id: &str) -> Transaction {
    let now = Utc::now();
    Transaction {
        id: Uuid::new_v4().to_string(),
        account_id: input.account_id,
        title: input.title,
        amount_minor: input.amount_minor,
        kind: input.kind,
        category: input.category,
        notes: input.notes,
        date: input.date.unwrap_or(now),
        created_by_id: created_by_id.to_string(),
        updated_by_id: None,
        created_at: now,
        updated_at: now,
    }
}

impl From<&Transaction> for ActiveModel {
    fn from(value: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(value.id.clone()),
            account_id: ActiveValue::Set(value.account_id.clone()),
            title: ActiveValue::Set(value.title.clone()),
            amount_minor: ActiveValue::Set(value.amount_minor),
            kind: ActiveValue::Set(value.kind.as_str().to_string()),
            category: ActiveValue::Set(value.category.clone()),
            notes: ActiveValue::Set(value.notes.clone()),
            date: ActiveValue::Set(value.date),
            created_by_id: ActiveValue::Set(value.created_by_id.clone()),
            updated_by_id: ActiveValue::Set(value.updated_by_id.clone()),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(value: Model) -> ResultEngine<Self> {
        Ok(Self {
            kind: TransactionKind::try_from(value.kind.as_str())?,
            id: value.id,
            account_id: value.account_id,
            title: value.title,
            amount_minor: value.amount_minor,
            category: value.category,
            notes: value.notes,
            date: value.date,
            created_by_id: value.created_by_id,
            updated_by_id: value.updated_by_id,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_either_case() {
        assert_eq!(
            TransactionKind::try_from("INCOME").unwrap(),
            TransactionKind::Income
        );
        assert_eq!(
            TransactionKind::try_from("expense").unwrap(),
            TransactionKind::Expense
        );
        assert!(TransactionKind::try_from("transfer").is_err());
    }

    #[test]
    fn expense_is_negative_when_signed() {
        let tx = new_transaction(
            NewTransaction {
                account_id: "acc".to_string(),
                title: "Rent".to_string(),
                amount_minor: 120_000,
                kind: TransactionKind::Expense,
                category: "Housing".to_string(),
                notes: None,
                date: None,
            },
            "alice",
        );
        assert_eq!(tx.signed_amount(), -120_000);
        assert_eq!(tx.date, tx.created_at);
    }
}
