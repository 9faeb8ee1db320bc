use chrono::Utc;
use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    AuditEntry, AuthContext, EngineError, NewTransaction, ResultEngine, Transaction,
    TransactionChanges, audit::entity, policy, transactions,
};

use super::{
    Engine, normalize_optional_text, normalize_required_text, require_positive, with_tx,
};

const MUTATE_DENIED: &str = "Only OWNER or ADMIN can modify transactions.";

impl Engine {
    /// Load a transaction: 404 if it does not exist, 403 if the caller is not
    /// a member of its account.
    async fn require_visible_transaction<C: ConnectionTrait>(
        &self,
        db: &C,
        ctx: &AuthContext,
        transaction_id: &str,
    ) -> ResultEngine<Transaction> {
        let tx = transactions::Entity::find_by_id(transaction_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("Transaction".to_string()))?;
        let tx = Transaction::try_from(tx)?;
        self.require_membership(db, &ctx.user_id, &tx.account_id)
            .await?;
        Ok(tx)
    }

    pub async fn create_transaction(
        &self,
        ctx: &AuthContext,
        input: NewTransaction,
    ) -> ResultEngine<Transaction> {
        let input = NewTransaction {
            title: normalize_required_text(&input.title, "Title")?,
            amount_minor: require_positive(input.amount_minor, "amount")?,
            category: normalize_required_text(&input.category, "Category")?,
            notes: normalize_optional_text(input.notes.as_deref()),
            ..input
        };
        self.require_membership(&self.database, &ctx.user_id, &input.account_id)
            .await?;

        let tx = transactions::new_transaction(input, &ctx.user_id);
        transactions::ActiveModel::from(&tx)
            .insert(&self.database)
            .await?;

        self.publish(vec![AuditEntry::created(
            entity::TRANSACTION,
            &tx.id,
            &ctx.user_id,
            &tx.account_id,
            &tx,
        )])
        .await;
        Ok(tx)
    }

    /// Transactions of an account, most recent date first.
    pub async fn list_transactions(
        &self,
        ctx: &AuthContext,
        account_id: &str,
    ) -> ResultEngine<Vec<Transaction>> {
        self.require_membership(&self.database, &ctx.user_id, account_id)
            .await?;
        transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account_id.to_string()))
            .order_by_desc(transactions::Column::Date)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Transaction::try_from)
            .collect()
    }

    pub async fn get_transaction(
        &self,
        ctx: &AuthContext,
        transaction_id: &str,
    ) -> ResultEngine<Transaction> {
        self.require_visible_transaction(&self.database, ctx, transaction_id)
            .await
    }

    /// Partial update (ADMIN or OWNER).
    pub async fn update_transaction(
        &self,
        ctx: &AuthContext,
        transaction_id: &str,
        changes: TransactionChanges,
    ) -> ResultEngine<Transaction> {
        if changes.is_empty() {
            return Err(EngineError::InvalidInput("No changes provided.".to_string()));
        }
        let title = changes
            .title
            .as_deref()
            .map(|t| normalize_required_text(t, "Title"))
            .transpose()?;
        let category = changes
            .category
            .as_deref()
            .map(|c| normalize_required_text(c, "Category"))
            .transpose()?;
        let amount = changes
            .amount_minor
            .map(|a| require_positive(a, "amount"))
            .transpose()?;

        let (old, new) = with_tx!(self, |db_tx| {
            let old = self
                .require_visible_transaction(&db_tx, ctx, transaction_id)
                .await?;
            self.require_role(
                &db_tx,
                &ctx.user_id,
                &old.account_id,
                policy::can_mutate_transaction,
                MUTATE_DENIED,
            )
            .await?;

            let mut new = old.clone();
            if let Some(title) = title {
                new.title = title;
            }
            if let Some(category) = category {
                new.category = category;
            }
            if let Some(amount) = amount {
                new.amount_minor = amount;
            }
            if let Some(kind) = changes.kind {
                new.kind = kind;
            }
            if let Some(notes) = changes.notes.as_deref() {
                new.notes = normalize_optional_text(Some(notes));
            }
            if let Some(date) = changes.date {
                new.date = date;
            }
            new.updated_by_id = Some(ctx.user_id.clone());
            new.updated_at = Utc::now();
            transactions::ActiveModel::from(&new).update(&db_tx).await?;
            Ok::<_, EngineError>((old, new))
        })?;

        self.publish(vec![AuditEntry::updated(
            entity::TRANSACTION,
            &new.id,
            &ctx.user_id,
            &new.account_id,
            &old,
            &new,
        )])
        .await;
        Ok(new)
    }

    /// Delete a transaction (ADMIN or OWNER).
    pub async fn delete_transaction(
        &self,
        ctx: &AuthContext,
        transaction_id: &str,
    ) -> ResultEngine<()> {
        let old = with_tx!(self, |db_tx| {
            let old = self
                .require_visible_transaction(&db_tx, ctx, transaction_id)
                .await?;
            self.require_role(
                &db_tx,
                &ctx.user_id,
                &old.account_id,
                policy::can_mutate_transaction,
                MUTATE_DENIED,
            )
            .await?;
            transactions::Entity::delete_by_id(old.id.clone())
                .exec(&db_tx)
                .await?;
            Ok::<_, EngineError>(old)
        })?;

        self.publish(vec![AuditEntry::deleted(
            entity::TRANSACTION,
            &old.id,
            &ctx.user_id,
            &old.account_id,
            &old,
        )])
        .await;
        Ok(())
    }
}
