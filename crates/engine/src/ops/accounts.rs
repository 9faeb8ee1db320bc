use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    Account, AccountChanges, AccountRole, AuditEntry, AuthContext, Currency, EngineError, Member,
    Membership, ResultEngine, accounts, audit::entity, invites, memberships, policy, saving_goals,
    transactions,
};

use super::{Engine, normalize_optional_text, normalize_required_text, with_tx};

/// An account as seen by one of its members.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountDetail {
    pub account: Account,
    pub role: AccountRole,
    pub members: Vec<Member>,
}

impl Engine {
    /// Accounts the caller belongs to, with the caller's role, newest first.
    pub async fn list_accounts(&self, ctx: &AuthContext) -> ResultEngine<Vec<(Account, AccountRole)>> {
        let rows = memberships::Entity::find()
            .filter(memberships::Column::UserId.eq(ctx.user_id.clone()))
            .find_also_related(accounts::Entity)
            .order_by_desc(memberships::Column::CreatedAt)
            .all(&self.database)
            .await?;

        let mut out = Vec::with_capacity(rows.len());
        for (membership, account) in rows {
            let Some(account) = account else { continue };
            let membership = Membership::try_from(membership)?;
            out.push((Account::try_from(account)?, membership.role));
        }
        Ok(out)
    }

    pub async fn get_account(
        &self,
        ctx: &AuthContext,
        account_id: &str,
    ) -> ResultEngine<AccountDetail> {
        let membership = self
            .require_membership(&self.database, &ctx.user_id, account_id)
            .await?;
        let account = self.require_account(&self.database, account_id).await?;
        let members = self.load_members(&self.database, account_id).await?;
        Ok(AccountDetail {
            account: Account::try_from(account)?,
            role: membership.role,
            members,
        })
    }

    /// Create an account; the caller becomes its first OWNER.
    pub async fn create_account(
        &self,
        ctx: &AuthContext,
        name: &str,
        description: Option<&str>,
        currency: Option<Currency>,
    ) -> ResultEngine<Account> {
        let name = normalize_required_text(name, "Account name")?;
        let account = Account::new(
            name,
            normalize_optional_text(description),
            currency.unwrap_or_default(),
        );
        let owner = Membership::new(&ctx.user_id, &account.id, AccountRole::Owner);

        with_tx!(self, |db_tx| {
            accounts::ActiveModel::from(&account).insert(&db_tx).await?;
            memberships::ActiveModel::from(&owner).insert(&db_tx).await?;
            Ok::<_, EngineError>(())
        })?;

        self.publish(vec![AuditEntry::created(
            entity::ACCOUNT,
            &account.id,
            &ctx.user_id,
            &account.id,
            &account,
        )])
        .await;
        Ok(account)
    }

    /// Update name, description or currency (ADMIN or OWNER).
    pub async fn update_account(
        &self,
        ctx: &AuthContext,
        account_id: &str,
        changes: AccountChanges,
    ) -> ResultEngine<Account> {
        if changes.is_empty() {
            return Err(EngineError::InvalidInput("No changes provided.".to_string()));
        }
        let name = changes
            .name
            .as_deref()
            .map(|name| normalize_required_text(name, "Account name"))
            .transpose()?;

        let (old, new) = with_tx!(self, |db_tx| {
            self.require_role(
                &db_tx,
                &ctx.user_id,
                account_id,
                policy::can_update_account,
                "Only OWNER or ADMIN can update the account.",
            )
            .await?;
            let old = Account::try_from(self.require_account(&db_tx, account_id).await?)?;

            let mut new = old.clone();
            if let Some(name) = name {
                new.name = name;
            }
            if let Some(description) = changes.description.as_deref() {
                new.description = normalize_optional_text(Some(description));
            }
            if let Some(currency) = changes.currency {
                new.currency = currency;
            }
            new.updated_at = chrono::Utc::now();
            accounts::ActiveModel::from(&new).update(&db_tx).await?;
            Ok::<_, EngineError>((old, new))
        })?;

        self.publish(vec![AuditEntry::updated(
            entity::ACCOUNT,
            &new.id,
            &ctx.user_id,
            &new.id,
            &old,
            &new,
        )])
        .await;
        Ok(new)
    }

    /// Delete an account and everything scoped to it (OWNER only).
    pub async fn delete_account(&self, ctx: &AuthContext, account_id: &str) -> ResultEngine<()> {
        let old = with_tx!(self, |db_tx| {
            self.require_role(
                &db_tx,
                &ctx.user_id,
                account_id,
                policy::can_delete_account,
                "Only OWNER can delete the account.",
            )
            .await?;
            let old = Account::try_from(self.require_account(&db_tx, account_id).await?)?;

            transactions::Entity::delete_many()
                .filter(transactions::Column::AccountId.eq(account_id.to_string()))
                .exec(&db_tx)
                .await?;
            saving_goals::Entity::delete_many()
                .filter(saving_goals::Column::AccountId.eq(account_id.to_string()))
                .exec(&db_tx)
                .await?;
            invites::Entity::delete_many()
                .filter(invites::Column::AccountId.eq(account_id.to_string()))
                .exec(&db_tx)
                .await?;
            memberships::Entity::delete_many()
                .filter(memberships::Column::AccountId.eq(account_id.to_string()))
                .exec(&db_tx)
                .await?;
            accounts::Entity::delete_by_id(account_id.to_string())
                .exec(&db_tx)
                .await?;
            Ok::<_, EngineError>(old)
        })?;

        tracing::info!(account_id, "account deleted");
        self.publish(vec![AuditEntry::deleted(
            entity::ACCOUNT,
            &old.id,
            &ctx.user_id,
            &old.id,
            &old,
        )])
        .await;
        Ok(())
    }
}
