use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr,
};

use crate::{
    AccountRole, AuditEntry, AuthContext, Currency, EngineError, Invite, InviteAccount,
    InviteDetail, InviteEvent, InviteSender, InviteStatus, Membership, ResultEngine, accounts,
    audit::entity, invites, memberships, policy, users,
};

use super::{Engine, normalize_email, with_tx};

/// Which invites a lazy expiry sweep touches.
#[derive(Clone, Copy, Debug)]
enum SweepBy<'a> {
    Recipient(&'a str),
    Inviter(&'a str),
}

impl Engine {
    /// Flip every pending invite of `by` whose expiry has passed to EXPIRED.
    ///
    /// Runs in one statement and is not audited.
    async fn sweep_expired_invites<C: ConnectionTrait>(
        &self,
        db: &C,
        by: SweepBy<'_>,
    ) -> ResultEngine<u64> {
        let now = Utc::now();
        let mut query = invites::Entity::update_many()
            .col_expr(
                invites::Column::Status,
                Expr::value(InviteStatus::Expired.as_str()),
            )
            .col_expr(invites::Column::UpdatedAt, Expr::value(now))
            .filter(invites::Column::Status.eq(InviteStatus::Pending.as_str()))
            .filter(invites::Column::ExpiresAt.lt(now));
        query = match by {
            SweepBy::Recipient(email) => query.filter(invites::Column::Email.eq(email.to_string())),
            SweepBy::Inviter(user_id) => {
                query.filter(invites::Column::InvitedById.eq(user_id.to_string()))
            }
        };
        let swept = query.exec(db).await?.rows_affected;
        if swept > 0 {
            tracing::debug!(?by, swept, "expired stale invites");
        }
        Ok(swept)
    }

    async fn find_invite_by_token<C: ConnectionTrait>(
        &self,
        db: &C,
        token: &str,
    ) -> ResultEngine<Option<Invite>> {
        invites::Entity::find()
            .filter(invites::Column::Token.eq(token.to_string()))
            .one(db)
            .await?
            .map(Invite::try_from)
            .transpose()
    }

    async fn find_invite_by_id<C: ConnectionTrait>(
        &self,
        db: &C,
        invite_id: &str,
    ) -> ResultEngine<Option<Invite>> {
        invites::Entity::find_by_id(invite_id.to_string())
            .one(db)
            .await?
            .map(Invite::try_from)
            .transpose()
    }

    /// Invite `email` to join `account_id` with `role` (OWNER only).
    ///
    /// A dead invite for the same (email, account) is reissued in place: same
    /// id, new token, new expiry.
    pub async fn send_invite(
        &self,
        ctx: &AuthContext,
        account_id: &str,
        email: &str,
        role: &str,
    ) -> ResultEngine<Invite> {
        let email = normalize_email(email)?;
        let role = AccountRole::try_from(role)?;

        self.require_role(
            &self.database,
            &ctx.user_id,
            account_id,
            policy::can_send_invite,
            "Only OWNER can invite members.",
        )
        .await?;
        self.sweep_expired_invites(&self.database, SweepBy::Recipient(&email))
            .await?;

        let (previous, invite) = with_tx!(self, |db_tx| {
            let existing = invites::Entity::find()
                .filter(invites::Column::Email.eq(email.clone()))
                .filter(invites::Column::AccountId.eq(account_id.to_string()))
                .one(&db_tx)
                .await?
                .map(Invite::try_from)
                .transpose()?;
            if existing
                .as_ref()
                .is_some_and(|invite| invite.is_live(Utc::now()))
            {
                return Err(EngineError::Conflict("Invite already exists.".to_string()));
            }

            let invitee = users::Entity::find()
                .filter(users::Column::Email.eq(email.clone()))
                .one(&db_tx)
                .await?;
            if let Some(invitee) = invitee
                && self
                    .find_membership(&db_tx, &invitee.id, account_id)
                    .await?
                    .is_some()
            {
                return Err(EngineError::Conflict(
                    "User is already a member of this account.".to_string(),
                ));
            }

            match existing {
                Some(dead) => {
                    let reissued = dead.reissue(role, &ctx.user_id);
                    invites::ActiveModel::from(&reissued)
                        .update(&db_tx)
                        .await?;
                    Ok::<_, EngineError>((Some(dead), reissued))
                }
                None => {
                    let invite = Invite::new(&email, account_id, role, &ctx.user_id);
                    invites::ActiveModel::from(&invite).insert(&db_tx).await?;
                    Ok((None, invite))
                }
            }
        })?;

        let entry = match &previous {
            Some(old) => AuditEntry::updated(
                entity::ACCOUNT_INVITE,
                &invite.id,
                &ctx.user_id,
                account_id,
                old,
                &invite,
            ),
            None => AuditEntry::created(
                entity::ACCOUNT_INVITE,
                &invite.id,
                &ctx.user_id,
                account_id,
                &invite,
            ),
        };
        self.publish(vec![entry]).await;
        Ok(invite)
    }

    /// Accept the invite identified by `token` as the caller.
    ///
    /// Membership creation and the ACCEPTED transition commit together.
    pub async fn accept_invite(&self, ctx: &AuthContext, token: &str) -> ResultEngine<Membership> {
        let invite = self
            .find_invite_by_token(&self.database, token)
            .await?
            .filter(|invite| invite.status == InviteStatus::Pending)
            .ok_or_else(|| EngineError::Conflict("Invalid invite.".to_string()))?;
        if !invite.email.eq_ignore_ascii_case(ctx.email.trim()) {
            return Err(EngineError::Forbidden("This invite is not yours.".to_string()));
        }

        if invite.is_past_expiry(Utc::now()) {
            let expired = invite.transition(InviteEvent::Expire)?;
            invites::ActiveModel::from(&expired)
                .update(&self.database)
                .await?;
            self.publish(vec![AuditEntry::updated(
                entity::ACCOUNT_INVITE,
                &invite.id,
                &ctx.user_id,
                &invite.account_id,
                &invite,
                &expired,
            )])
            .await;
            return Err(EngineError::Conflict("Invite expired.".to_string()));
        }

        let (membership, accepted) = with_tx!(self, |db_tx| {
            if self
                .find_membership(&db_tx, &ctx.user_id, &invite.account_id)
                .await?
                .is_some()
            {
                return Err(EngineError::Conflict("Already a member.".to_string()));
            }
            let membership = Membership::new(&ctx.user_id, &invite.account_id, invite.role);
            memberships::ActiveModel::from(&membership)
                .insert(&db_tx)
                .await?;

            let accepted = invite.transition(InviteEvent::Accept)?;
            invites::ActiveModel::from(&accepted)
                .update(&db_tx)
                .await?;
            Ok::<_, EngineError>((membership, accepted))
        })?;

        tracing::info!(
            account_id = %invite.account_id,
            user_id = %ctx.user_id,
            "invite accepted"
        );
        self.publish(vec![
            AuditEntry::created(
                entity::ACCOUNT_MEMBER,
                &membership.id,
                &ctx.user_id,
                &membership.account_id,
                &membership,
            ),
            AuditEntry::updated(
                entity::ACCOUNT_INVITE,
                &invite.id,
                &ctx.user_id,
                &invite.account_id,
                &invite,
                &accepted,
            ),
        ])
        .await;
        Ok(membership)
    }

    /// Decline an invite addressed to the caller. Ends in CANCELLED.
    pub async fn reject_invite(&self, ctx: &AuthContext, token: &str) -> ResultEngine<Invite> {
        let invite = self
            .find_invite_by_token(&self.database, token)
            .await?
            .filter(|invite| invite.email.eq_ignore_ascii_case(ctx.email.trim()))
            .ok_or_else(|| EngineError::Forbidden("Not allowed.".to_string()))?;
        self.store_transition(ctx, invite, InviteEvent::Reject).await
    }

    /// Manually expire a pending invite the caller sent.
    pub async fn expire_invite(&self, ctx: &AuthContext, invite_id: &str) -> ResultEngine<Invite> {
        let invite = self
            .find_invite_by_id(&self.database, invite_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("Invite".to_string()))?;
        if invite.invited_by_id != ctx.user_id {
            return Err(EngineError::Forbidden("Not allowed.".to_string()));
        }
        self.store_transition(ctx, invite, InviteEvent::Expire).await
    }

    /// Cancel an invite the caller sent, whatever its state.
    pub async fn cancel_invite(&self, ctx: &AuthContext, invite_id: &str) -> ResultEngine<Invite> {
        let invite = self
            .find_invite_by_id(&self.database, invite_id)
            .await?
            .filter(|invite| invite.invited_by_id == ctx.user_id)
            .ok_or_else(|| EngineError::Forbidden("Not allowed.".to_string()))?;
        self.store_transition(ctx, invite, InviteEvent::Cancel).await
    }

    async fn store_transition(
        &self,
        ctx: &AuthContext,
        invite: Invite,
        event: InviteEvent,
    ) -> ResultEngine<Invite> {
        let next = invite.transition(event)?;
        invites::ActiveModel::from(&next)
            .update(&self.database)
            .await?;
        self.publish(vec![AuditEntry::updated(
            entity::ACCOUNT_INVITE,
            &next.id,
            &ctx.user_id,
            &next.account_id,
            &invite,
            &next,
        )])
        .await;
        Ok(next)
    }

    /// Pending invites addressed to the caller, newest first.
    pub async fn received_invites(&self, ctx: &AuthContext) -> ResultEngine<Vec<InviteDetail>> {
        let email = ctx.email.trim().to_lowercase();
        self.sweep_expired_invites(&self.database, SweepBy::Recipient(&email))
            .await?;
        let rows = invites::Entity::find()
            .filter(invites::Column::Email.eq(email))
            .filter(invites::Column::Status.eq(InviteStatus::Pending.as_str()))
            .find_also_related(accounts::Entity)
            .order_by_desc(invites::Column::CreatedAt)
            .all(&self.database)
            .await?;
        self.invite_details(rows, true).await
    }

    /// Every invite the caller sent, newest first.
    pub async fn sent_invites(&self, ctx: &AuthContext) -> ResultEngine<Vec<InviteDetail>> {
        self.sweep_expired_invites(&self.database, SweepBy::Inviter(&ctx.user_id))
            .await?;
        let rows = invites::Entity::find()
            .filter(invites::Column::InvitedById.eq(ctx.user_id.clone()))
            .find_also_related(accounts::Entity)
            .order_by_desc(invites::Column::CreatedAt)
            .all(&self.database)
            .await?;
        self.invite_details(rows, false).await
    }

    /// Expired invites the caller sent, most recently expired first.
    pub async fn expired_invites(&self, ctx: &AuthContext) -> ResultEngine<Vec<InviteDetail>> {
        self.sweep_expired_invites(&self.database, SweepBy::Inviter(&ctx.user_id))
            .await?;
        let rows = invites::Entity::find()
            .filter(invites::Column::InvitedById.eq(ctx.user_id.clone()))
            .filter(invites::Column::Status.eq(InviteStatus::Expired.as_str()))
            .find_also_related(accounts::Entity)
            .order_by_desc(invites::Column::UpdatedAt)
            .all(&self.database)
            .await?;
        self.invite_details(rows, false).await
    }

    async fn invite_details(
        &self,
        rows: Vec<(invites::Model, Option<accounts::Model>)>,
        with_sender: bool,
    ) -> ResultEngine<Vec<InviteDetail>> {
        let senders: HashMap<String, users::Model> = if with_sender {
            let ids: Vec<String> = rows.iter().map(|(i, _)| i.invited_by_id.clone()).collect();
            users::Entity::find()
                .filter(users::Column::Id.is_in(ids))
                .all(&self.database)
                .await?
                .into_iter()
                .map(|u| (u.id.clone(), u))
                .collect()
        } else {
            HashMap::new()
        };

        rows.into_iter()
            .map(|(invite, account)| {
                let invited_by = senders.get(&invite.invited_by_id).map(|u| InviteSender {
                    id: u.id.clone(),
                    name: u.name.clone(),
                    email: u.email.clone(),
                });
                let account = account
                    .map(|a| -> ResultEngine<InviteAccount> {
                        Ok(InviteAccount {
                            currency: Currency::try_from(a.currency.as_str())?,
                            id: a.id,
                            name: a.name,
                        })
                    })
                    .transpose()?;
                Ok(InviteDetail {
                    invite: Invite::try_from(invite)?,
                    account,
                    invited_by,
                })
            })
            .collect()
    }
}
