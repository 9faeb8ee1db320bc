use sea_orm::{ConnectionTrait, PaginatorTrait, QueryFilter, prelude::*};

use crate::{
    AccountRole, EngineError, Membership, ResultEngine, accounts, memberships, users,
};

use super::Engine;

pub(super) const NOT_A_MEMBER: &str = "You are not a member of this account.";

impl Engine {
    /// Membership Resolver: the caller's membership in `account_id`, if any.
    pub async fn membership(
        &self,
        user_id: &str,
        account_id: &str,
    ) -> ResultEngine<Option<Membership>> {
        self.find_membership(&self.database, user_id, account_id)
            .await
    }

    pub(super) async fn find_membership<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
        account_id: &str,
    ) -> ResultEngine<Option<Membership>> {
        memberships::Entity::find()
            .filter(memberships::Column::UserId.eq(user_id.to_string()))
            .filter(memberships::Column::AccountId.eq(account_id.to_string()))
            .one(db)
            .await?
            .map(Membership::try_from)
            .transpose()
    }

    /// Missing membership is an authorization failure, never a not-found.
    pub(super) async fn require_membership<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
        account_id: &str,
    ) -> ResultEngine<Membership> {
        self.find_membership(db, user_id, account_id)
            .await?
            .ok_or_else(|| EngineError::Forbidden(NOT_A_MEMBER.to_string()))
    }

    pub(super) async fn require_role<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
        account_id: &str,
        allowed: fn(AccountRole) -> bool,
        message: &str,
    ) -> ResultEngine<Membership> {
        let membership = self.require_membership(db, user_id, account_id).await?;
        if !allowed(membership.role) {
            return Err(EngineError::Forbidden(message.to_string()));
        }
        Ok(membership)
    }

    pub(super) async fn owner_count<C: ConnectionTrait>(
        &self,
        db: &C,
        account_id: &str,
    ) -> ResultEngine<u64> {
        memberships::Entity::find()
            .filter(memberships::Column::AccountId.eq(account_id.to_string()))
            .filter(memberships::Column::Role.eq(AccountRole::Owner.as_str()))
            .count(db)
            .await
            .map_err(Into::into)
    }

    pub(super) async fn require_account<C: ConnectionTrait>(
        &self,
        db: &C,
        account_id: &str,
    ) -> ResultEngine<accounts::Model> {
        accounts::Entity::find_by_id(account_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("Account".to_string()))
    }

    pub(super) async fn require_user<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("User".to_string()))
    }
}
