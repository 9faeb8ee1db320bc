use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    AuditEntry, AuthContext, EngineError, MoveKind, ResultEngine, SavingGoal, SavingGoalChanges,
    audit::entity, memberships, saving_goals,
};

use super::{
    Engine, normalize_optional_text, normalize_required_text, require_positive, with_tx,
};

impl Engine {
    async fn require_visible_goal<C: ConnectionTrait>(
        &self,
        db: &C,
        ctx: &AuthContext,
        goal_id: &str,
    ) -> ResultEngine<SavingGoal> {
        let goal = saving_goals::Entity::find_by_id(goal_id.to_string())
            .one(db)
            .await?
            .map(SavingGoal::from)
            .ok_or_else(|| EngineError::KeyNotFound("Saving goal".to_string()))?;
        self.require_membership(db, &ctx.user_id, &goal.account_id)
            .await?;
        Ok(goal)
    }

    pub async fn create_saving_goal(
        &self,
        ctx: &AuthContext,
        account_id: &str,
        title: &str,
        target_amount: i64,
        deadline: Option<DateTime<Utc>>,
        notes: Option<&str>,
    ) -> ResultEngine<SavingGoal> {
        let title = normalize_required_text(title, "Title")?;
        let target_amount = require_positive(target_amount, "target amount")?;
        self.require_membership(&self.database, &ctx.user_id, account_id)
            .await?;

        let goal = SavingGoal::new(
            account_id,
            title,
            target_amount,
            deadline,
            normalize_optional_text(notes),
            &ctx.user_id,
        );
        saving_goals::ActiveModel::from(&goal)
            .insert(&self.database)
            .await?;

        self.publish(vec![AuditEntry::created(
            entity::SAVING_GOAL,
            &goal.id,
            &ctx.user_id,
            account_id,
            &goal,
        )])
        .await;
        Ok(goal)
    }

    /// Goals of an account, latest deadline first.
    pub async fn list_saving_goals(
        &self,
        ctx: &AuthContext,
        account_id: &str,
    ) -> ResultEngine<Vec<SavingGoal>> {
        self.require_membership(&self.database, &ctx.user_id, account_id)
            .await?;
        Ok(saving_goals::Entity::find()
            .filter(saving_goals::Column::AccountId.eq(account_id.to_string()))
            .order_by_desc(saving_goals::Column::Deadline)
            .all(&self.database)
            .await?
            .into_iter()
            .map(SavingGoal::from)
            .collect())
    }

    pub async fn get_saving_goal(
        &self,
        ctx: &AuthContext,
        goal_id: &str,
    ) -> ResultEngine<SavingGoal> {
        self.require_visible_goal(&self.database, ctx, goal_id)
            .await
    }

    /// Add money to, or take money out of, a goal.
    ///
    /// The balance check uses the value read before the write; concurrent
    /// moves on one goal are not serialized.
    pub async fn move_money(
        &self,
        ctx: &AuthContext,
        goal_id: &str,
        kind: MoveKind,
        amount: i64,
    ) -> ResultEngine<SavingGoal> {
        if amount <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount must be greater than zero".to_string(),
            ));
        }

        // Goals outside the caller's accounts are reported as missing.
        let account_ids = memberships::Entity::find()
            .filter(memberships::Column::UserId.eq(ctx.user_id.clone()))
            .all(&self.database)
            .await?
            .into_iter()
            .map(|m| m.account_id)
            .collect::<Vec<_>>();
        let old = saving_goals::Entity::find_by_id(goal_id.to_string())
            .filter(saving_goals::Column::AccountId.is_in(account_ids))
            .one(&self.database)
            .await?
            .map(SavingGoal::from)
            .ok_or_else(|| EngineError::KeyNotFound("Saving goal".to_string()))?;

        let current = saving_goals::apply_move(old.current_amount, old.target_amount, kind, amount)?;
        let new = SavingGoal {
            current_amount: current,
            updated_by_id: Some(ctx.user_id.clone()),
            updated_at: Utc::now(),
            ..old.clone()
        };
        saving_goals::ActiveModel::from(&new)
            .update(&self.database)
            .await?;

        self.publish(vec![AuditEntry::updated(
            entity::SAVING_GOAL,
            &new.id,
            &ctx.user_id,
            &new.account_id,
            &old,
            &new,
        )])
        .await;
        Ok(new)
    }

    pub async fn update_saving_goal(
        &self,
        ctx: &AuthContext,
        goal_id: &str,
        changes: SavingGoalChanges,
    ) -> ResultEngine<SavingGoal> {
        if changes.is_empty() {
            return Err(EngineError::InvalidInput("No changes provided.".to_string()));
        }
        let title = changes
            .title
            .as_deref()
            .map(|t| normalize_required_text(t, "Title"))
            .transpose()?;
        let target = changes
            .target_amount
            .map(|t| require_positive(t, "target amount"))
            .transpose()?;

        let (old, new) = with_tx!(self, |db_tx| {
            let old = self.require_visible_goal(&db_tx, ctx, goal_id).await?;
            let mut new = old.clone();
            if let Some(title) = title {
                new.title = title;
            }
            if let Some(target) = target {
                if target < new.current_amount {
                    return Err(EngineError::TargetExceeded(format!(
                        "{} already saved, above the new target {target}",
                        new.current_amount
                    )));
                }
                new.target_amount = target;
            }
            if let Some(deadline) = changes.deadline {
                new.deadline = Some(deadline);
            }
            if let Some(notes) = changes.notes.as_deref() {
                new.notes = normalize_optional_text(Some(notes));
            }
            new.updated_by_id = Some(ctx.user_id.clone());
            new.updated_at = Utc::now();
            saving_goals::ActiveModel::from(&new).update(&db_tx).await?;
            Ok::<_, EngineError>((old, new))
        })?;

        self.publish(vec![AuditEntry::updated(
            entity::SAVING_GOAL,
            &new.id,
            &ctx.user_id,
            &new.account_id,
            &old,
            &new,
        )])
        .await;
        Ok(new)
    }

    pub async fn delete_saving_goal(&self, ctx: &AuthContext, goal_id: &str) -> ResultEngine<()> {
        let old = with_tx!(self, |db_tx| {
            let old = self.require_visible_goal(&db_tx, ctx, goal_id).await?;
            saving_goals::Entity::delete_by_id(old.id.clone())
                .exec(&db_tx)
                .await?;
            Ok::<_, EngineError>(old)
        })?;

        self.publish(vec![AuditEntry::deleted(
            entity::SAVING_GOAL,
            &old.id,
            &ctx.user_id,
            &old.account_id,
            &old,
        )])
        .await;
        Ok(())
    }
}
