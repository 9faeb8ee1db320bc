//! Domain core of the shared-finances service.
//!
//! Every operation takes an explicit [`AuthContext`] and goes through the
//! same steps: resolve the caller's membership, ask the [`policy`], validate,
//! persist, then publish audit records once the write has committed.

pub use accounts::{Account, AccountChanges};
pub use analytics::{CategoryTotal, Dashboard, Summary};
pub use audit::{
    AuditAction, AuditEntry, AuditLog, AuditLogDetail, AuditLogFilter, AuditPerformer, AuditSink,
    DatabaseAuditSink,
};
pub use context::AuthContext;
pub use currency::Currency;
pub use error::EngineError;
pub use invites::{Invite, InviteAccount, InviteDetail, InviteEvent, InviteSender, InviteStatus};
pub use memberships::{Member, Membership};
pub use ops::{AccountDetail, Engine, EngineBuilder};
pub use period::Period;
pub use policy::{AccountRole, PolicyViolation};
pub use saving_goals::{MoveKind, SavingGoal, SavingGoalChanges};
pub use transactions::{NewTransaction, Transaction, TransactionChanges, TransactionKind};
pub use users::{NewUser, PasswordHasher, Provider, User, UserChanges};

pub mod accounts;
pub mod analytics;
pub mod audit;
mod context;
mod currency;
mod error;
pub mod invites;
pub mod memberships;
mod ops;
mod period;
pub mod policy;
pub mod saving_goals;
pub mod transactions;
pub mod users;

pub type ResultEngine<T> = Result<T, EngineError>;
