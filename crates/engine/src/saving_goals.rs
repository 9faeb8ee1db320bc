//! Saving goals: a target amount an account saves toward.
//!
//! `current_amount` only changes through [`apply_move`], which keeps it
//! inside `0..=target_amount`.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Direction of a money move on a goal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MoveKind {
    Add,
    Remove,
}

impl TryFrom<&str> for MoveKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ADD" => Ok(Self::Add),
            "REMOVE" => Ok(Self::Remove),
            other => Err(EngineError::InvalidInput(format!(
                "invalid move type: {other}"
            ))),
        }
    }
}

/// New `current_amount` after moving `amount` in `kind` direction.
pub fn apply_move(current: i64, target: i64, kind: MoveKind, amount: i64) -> ResultEngine<i64> {
    if amount <= 0 {
        return Err(EngineError::InvalidAmount(
            "amount must be greater than zero".to_string(),
        ));
    }
    match kind {
        MoveKind::Add => {
            let next = current
                .checked_add(amount)
                .ok_or_else(|| EngineError::InvalidAmount("amount overflow".to_string()))?;
            if next > target {
                return Err(EngineError::TargetExceeded(format!(
                    "{next} is above the goal target {target}"
                )));
            }
            Ok(next)
        }
        MoveKind::Remove => {
            if amount > current {
                return Err(EngineError::InsufficientFunds(format!(
                    "only {current} saved, cannot remove {amount}"
                )));
            }
            Ok(current - amount)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
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

impl SavingGoal {
    pub fn new(
        account_id: &str,
        title: String,
        target_amount: i64,
        deadline: Option<DateTime<Utc>>,
        notes: Option<String>,
        created_by_id: &str,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            account_id: account_id.to_string(),
            title,
            target_amount,
            current_amount: 0,
            deadline,
            notes,
            created_by_id: created_by_id.to_string(),
            updated_by_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a goal's descriptive fields.
#[derive(Clone, Debug, Default)]
pub struct SavingGoalChanges {
    pub title: Option<String>,
    pub target_amount: Option<i64>,
    pub deadline: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl SavingGoalChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.target_amount.is_none()
            && self.deadline.is_none()
            && self.notes.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "saving_goals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub account_id: String,
    pub title: String,
    pub target_amount: i64,
    pub current_amount: i64,
    pub deadline: Option<DateTimeUtc>,
    pub notes: Option<String>,
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

impl From<&SavingGoal> for ActiveModel {
    fn from(value: &SavingGoal) -> Self {
        Self {
            id: ActiveValue::Set(value.id.clone()),
            account_id: ActiveValue::Set(value.account_id.clone()),
            title: ActiveValue::Set(value.title.clone()),
            target_amount: ActiveValue::Set(value.target_amount),
            current_amount: ActiveValue::Set(value.current_amount),
            deadline: ActiveValue::Set(value.deadline),
            notes: ActiveValue::Set(value.notes.clone()),
            created_by_id: ActiveValue::Set(value.created_by_id.clone()),
            updated_by_id: ActiveValue::Set(value.updated_by_id.clone()),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl From<Model> for SavingGoal {
    fn from(value: Model) -> Self {
        Self {
            id: value.id,
            account_id: value.account_id,
            title: value.title,
            target_amount: value.target_amount,
            current_amount: value.current_amount,
            deadline: value.deadline,
            notes: value.notes,
            created_by_id: value.created_by_id,
            updated_by_id: value.updated_by_id,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}
