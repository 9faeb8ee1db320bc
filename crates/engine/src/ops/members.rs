use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    AccountRole, AuditEntry, AuthContext, EngineError, Member, Membership, ResultEngine,
    audit::entity, memberships, policy, users,
};

use super::{Engine, access::NOT_A_MEMBER, with_tx};

impl Engine {
    pub(super) async fn load_members<C: ConnectionTrait>(
        &self,
        db: &C,
        account_id: &str,
    ) -> ResultEngine<Vec<Member>> {
        let rows = memberships::Entity::find()
            .filter(memberships::Column::AccountId.eq(account_id.to_string()))
            .find_also_related(users::Entity)
            .order_by_asc(memberships::Column::CreatedAt)
            .all(db)
            .await?;

        rows.into_iter()
            .map(|(membership, user)| {
                let (name, email) = user.map(|u| (u.name, u.email)).unwrap_or_default();
                Ok(Member {
                    membership: Membership::try_from(membership)?,
                    name,
                    email,
                })
            })
            .collect()
    }

    /// Members of an account, oldest first.
    pub async fn list_members(
        &self,
        ctx: &AuthContext,
        account_id: &str,
    ) -> ResultEngine<Vec<Member>> {
        self.require_membership(&self.database, &ctx.user_id, account_id)
            .await?;
        self.load_members(&self.database, account_id).await
    }

    async fn require_target<C: ConnectionTrait>(
        &self,
        db: &C,
        account_id: &str,
        member_id: &str,
    ) -> ResultEngine<Membership> {
        memberships::Entity::find_by_id(member_id.to_string())
            .filter(memberships::Column::AccountId.eq(account_id.to_string()))
            .one(db)
            .await?
            .map(Membership::try_from)
            .transpose()?
            .ok_or_else(|| EngineError::KeyNotFound("Member".to_string()))
    }

    /// Change the role of membership `member_id`.
    pub async fn change_member_role(
        &self,
        ctx: &AuthContext,
        account_id: &str,
        member_id: &str,
        role: &str,
    ) -> ResultEngine<Membership> {
        let new_role = AccountRole::try_from(role)?;

        let (old, new) = with_tx!(self, |db_tx| {
            let actor = self
                .find_membership(&db_tx, &ctx.user_id, account_id)
                .await?
                .ok_or_else(|| EngineError::Forbidden(NOT_A_MEMBER.to_string()))?;
            let target = self.require_target(&db_tx, account_id, member_id).await?;
            let owners = self.owner_count(&db_tx, account_id).await?;
            policy::can_change_role(&actor, &target, new_role, owners)?;

            let mut updated = target.clone();
            updated.role = new_role;
            memberships::ActiveModel::from(&updated)
                .update(&db_tx)
                .await?;
            Ok::<_, EngineError>((target, updated))
        })?;

        self.publish(vec![AuditEntry::updated(
            entity::ACCOUNT_MEMBER,
            &new.id,
            &ctx.user_id,
            account_id,
            &old,
            &new,
        )])
        .await;
        Ok(new)
    }

    /// Remove membership `member_id` from the account.
    pub async fn remove_member(
        &self,
        ctx: &AuthContext,
        account_id: &str,
        member_id: &str,
    ) -> ResultEngine<()> {
        let removed = with_tx!(self, |db_tx| {
            let actor = self
                .find_membership(&db_tx, &ctx.user_id, account_id)
                .await?
                .ok_or_else(|| EngineError::Forbidden(NOT_A_MEMBER.to_string()))?;
            let target = self.require_target(&db_tx, account_id, member_id).await?;
            let owners = self.owner_count(&db_tx, account_id).await?;
            policy::can_remove_member(&actor, &target, owners)?;

            memberships::Entity::delete_by_id(target.id.clone())
                .exec(&db_tx)
                .await?;
            Ok::<_, EngineError>(target)
        })?;

        self.publish(vec![AuditEntry::deleted(
            entity::ACCOUNT_MEMBER,
            &removed.id,
            &ctx.user_id,
            account_id,
            &removed,
        )])
        .await;
        Ok(())
    }
}
