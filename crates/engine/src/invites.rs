//! Account invites and their lifecycle.
//!
//! ```text
//!            accept            expire / sweep          reject / cancel
//! PENDING ──────────▶ ACCEPTED   PENDING ──▶ EXPIRED   ANY ──▶ CANCELLED
//! ```
//!
//! `ACCEPTED`, `EXPIRED` and `CANCELLED` are terminal for accept and expire.
//! Reject and cancel carry no status precondition and always land on
//! `CANCELLED`; there is no separate rejected state.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, ResultEngine, policy::AccountRole};

/// How long a freshly sent invite stays acceptable.
pub const INVITE_TTL_DAYS: i64 = 7;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InviteStatus {
    Pending,
    Accepted,
    Expired,
    Cancelled,
}

impl InviteStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Apply a lifecycle event and return the next status.
    pub fn apply(self, event: InviteEvent) -> ResultEngine<InviteStatus> {
        match (event, self) {
            (InviteEvent::Accept, Self::Pending) => Ok(Self::Accepted),
            (InviteEvent::Accept, _) => {
                Err(EngineError::Conflict("Invalid invite.".to_string()))
            }
            (InviteEvent::Expire, Self::Pending) => Ok(Self::Expired),
            (InviteEvent::Expire, _) => Err(EngineError::Conflict(
                "Only pending invites can be expired.".to_string(),
            )),
            (InviteEvent::Reject | InviteEvent::Cancel, _) => Ok(Self::Cancelled),
        }
    }
}

impl TryFrom<&str> for InviteStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "expired" => Ok(Self::Expired),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(EngineError::InvalidInput(format!(
                "invalid invite status: {other}"
            ))),
        }
    }
}

/// Events that move an invite between states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InviteEvent {
    Accept,
    Expire,
    Reject,
    Cancel,
}

/// An invitation for `email` to join `account_id` with `role`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
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
}

impl Invite {
    pub fn new(email: &str, account_id: &str, role: AccountRole, invited_by_id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            account_id: account_id.to_string(),
            role,
            token: generate_token(),
            status: InviteStatus::Pending,
            expires_at: now + Duration::days(INVITE_TTL_DAYS),
            invited_by_id: invited_by_id.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Pending and not yet past its expiry.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.status == InviteStatus::Pending && self.expires_at >= now
    }

    pub fn is_past_expiry(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    /// Reuse a dead invite row for a new send: same id, fresh credentials.
    pub fn reissue(&self, role: AccountRole, invited_by_id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: self.id.clone(),
            email: self.email.clone(),
            account_id: self.account_id.clone(),
            role,
            token: generate_token(),
            status: InviteStatus::Pending,
            expires_at: now + Duration::days(INVITE_TTL_DAYS),
            invited_by_id: invited_by_id.to_string(),
            created_at: self.created_at,
            updated_at: now,
        }
    }

    /// Copy of the invite after `event`, or the transition error.
    pub fn transition(&self, event: InviteEvent) -> ResultEngine<Self> {
        let status = self.status.apply(event)?;
        Ok(Self {
            status,
            updated_at: Utc::now(),
            ..self.clone()
        })
    }
}

/// Account summary shown next to an invite.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteAccount {
    pub id: String,
    pub name: String,
    pub currency: Currency,
}

/// Inviter summary shown to the recipient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteSender {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// An invite with the context needed by listing endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteDetail {
    pub invite: Invite,
    pub account: Option<InviteAccount>,
    pub invited_by: Option<InviteSender>,
}

/// Opaque, unguessable invite credential (256 random bits).
pub fn generate_token() -> String {
    let mut bytes = Vec::with_capacity(32);
    bytes.extend_from_slice(Uuid::new_v4().as_bytes());
    bytes.extend_from_slice(Uuid::new_v4().as_bytes());
    URL_SAFE_NO_PAD.encode(bytes)
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "account_invites")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub email: String,
    pub account_id: String,
    pub role: String,
    #[sea_orm(unique)]
    pub token: String,
    pub status: String,
    pub expires_at: DateTimeUtc,
    pub invited_by_id: String,
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

impl From<&Invite> for ActiveModel {
    fn from(value: &Invite) -> Self {
        Self {
            id: ActiveValue::Set(value.id.clone()),
            email: ActiveValue::Set(value.email.clone()),
            account_id: ActiveValue::Set(value.account_id.clone()),
            role: ActiveValue::Set(value.role.as_str().to_string()),
            token: ActiveValue::Set(value.token.clone()),
            status: ActiveValue::Set(value.status.as_str().to_string()),
            expires_at: ActiveValue::Set(value.expires_at),
            invited_by_id: ActiveValue::Set(value.invited_by_id.clone()),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl TryFrom<Model> for Invite {
    type Error = EngineError;

    fn try_from(value: Model) -> ResultEngine<Self> {
        Ok(Self {
            role: AccountRole::try_from(value.role.as_str())?,
            status: InviteStatus::try_from(value.status.as_str())?,
            id: value.id,
            email: value.email,
            account_id: value.account_id,
            token: value.token,
            expires_at: value.expires_at,
            invited_by_id: value.invited_by_id,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> Invite {
        Invite::new("bob@example.com", "acc", AccountRole::Member, "alice")
    }

    #[test]
    fn new_invite_is_live_for_seven_days() {
        let invite = pending();
        let now = Utc::now();
        assert!(invite.is_live(now));
        assert!(invite.is_live(now + Duration::days(6)));
        assert!(!invite.is_live(now + Duration::days(8)));
    }

    #[test]
    fn accept_and_expire_need_pending() {
        assert_eq!(
            InviteStatus::Pending.apply(InviteEvent::Accept).unwrap(),
            InviteStatus::Accepted
        );
        assert_eq!(
            InviteStatus::Pending.apply(InviteEvent::Expire).unwrap(),
            InviteStatus::Expired
        );
        for terminal in [
            InviteStatus::Accepted,
            InviteStatus::Expired,
            InviteStatus::Cancelled,
        ] {
            assert!(terminal.is_terminal());
            assert!(terminal.apply(InviteEvent::Accept).is_err());
            assert!(terminal.apply(InviteEvent::Expire).is_err());
        }
    }

    #[test]
    fn reject_and_cancel_have_no_precondition() {
        for status in [
            InviteStatus::Pending,
            InviteStatus::Accepted,
            InviteStatus::Expired,
            InviteStatus::Cancelled,
        ] {
            assert_eq!(
                status.apply(InviteEvent::Reject).unwrap(),
                InviteStatus::Cancelled
            );
            assert_eq!(
                status.apply(InviteEvent::Cancel).unwrap(),
                InviteStatus::Cancelled
            );
        }
    }

    #[test]
    fn reissue_keeps_id_and_rotates_token() {
        let invite = pending();
        let expired = invite.transition(InviteEvent::Expire).unwrap();
        assert!(!expired.is_live(Utc::now()));

        let again = expired.reissue(AccountRole::Admin, "carol");
        assert_eq!(again.id, invite.id);
        assert_ne!(again.token, invite.token);
        assert_eq!(again.status, InviteStatus::Pending);
        assert_eq!(again.role, AccountRole::Admin);
        assert_eq!(again.invited_by_id, "carol");
    }

    #[test]
    fn tokens_are_url_safe_and_distinct() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
