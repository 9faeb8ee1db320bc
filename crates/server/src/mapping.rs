//! Conversions between engine values and wire bodies.

use api_types::{
    UserSummary,
    account::Account as AccountView,
    analytics::{CategoryTotal as CategoryView, Dashboard as DashboardView, Summary as SummaryView},
    audit::{AuditAction as ActionView, AuditLog as AuditLogView},
    invite::{Invite as InviteView, InviteAccount as InviteAccountView, InviteStatus as StatusView},
    member::Member as MemberView,
    saving_goal::{MoveType, SavingGoal as SavingGoalView},
    transaction::{Transaction as TransactionView, TransactionType},
    user::{Provider as ProviderView, User as UserView},
};
use engine::{
    Account, AccountRole, AuditAction, AuditLogDetail, CategoryTotal, Currency, Dashboard, Invite,
    InviteDetail, InviteStatus, Member, MoveKind, Provider, SavingGoal, Summary, Transaction,
    TransactionKind, User,
};

pub fn role(role: AccountRole) -> api_types::AccountRole {
    match role {
        AccountRole::Owner => api_types::AccountRole::Owner,
        AccountRole::Admin => api_types::AccountRole::Admin,
        AccountRole::Member => api_types::AccountRole::Member,
    }
}

pub fn currency(currency: Currency) -> api_types::Currency {
    match currency {
        Currency::Eur => api_types::Currency::Eur,
        Currency::Usd => api_types::Currency::Usd,
        Currency::Gbp => api_types::Currency::Gbp,
        Currency::Brl => api_types::Currency::Brl,
    }
}

pub fn currency_in(currency: api_types::Currency) -> Currency {
    match currency {
        api_types::Currency::Eur => Currency::Eur,
        api_types::Currency::Usd => Currency::Usd,
        api_types::Currency::Gbp => Currency::Gbp,
        api_types::Currency::Brl => Currency::Brl,
    }
}

pub fn user(user: User) -> UserView {
    UserView {
        id: user.id,
        name: user.name,
        email: user.email,
        gender: user.gender,
        provider: match user.provider {
            Provider::Local => ProviderView::Local,
            Provider::Google => ProviderView::Google,
        },
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}

pub fn account(account: Account, caller_role: Option<AccountRole>) -> AccountView {
    AccountView {
        id: account.id,
        name: account.name,
        description: account.description,
        currency: currency(account.currency),
        role: caller_role.map(role),
        created_at: account.created_at,
        updated_at: account.updated_at,
    }
}

pub fn member(member: Member) -> MemberView {
    MemberView {
        id: member.membership.id,
        account_id: member.membership.account_id,
        role: role(member.membership.role),
        user: UserSummary {
            id: member.membership.user_id,
            name: member.name,
            email: member.email,
        },
        created_at: member.membership.created_at,
    }
}

fn invite_status(status: InviteStatus) -> StatusView {
    match status {
        InviteStatus::Pending => StatusView::Pending,
        InviteStatus::Accepted => StatusView::Accepted,
        InviteStatus::Expired => StatusView::Expired,
        InviteStatus::Cancelled => StatusView::Cancelled,
    }
}

pub fn invite(invite: Invite) -> InviteView {
    InviteView {
        id: invite.id,
        email: invite.email,
        account_id: invite.account_id,
        role: role(invite.role),
        token: invite.token,
        status: invite_status(invite.status),
        expires_at: invite.expires_at,
        invited_by_id: invite.invited_by_id,
        created_at: invite.created_at,
        updated_at: invite.updated_at,
        account: None,
        invited_by: None,
    }
}

pub fn invite_detail(detail: InviteDetail) -> InviteView {
    InviteView {
        account: detail.account.map(|a| InviteAccountView {
            id: a.id,
            name: a.name,
            currency: currency(a.currency),
        }),
        invited_by: detail.invited_by.map(|s| UserSummary {
            id: s.id,
            name: s.name,
            email: s.email,
        }),
        ..invite(detail.invite)
    }
}

pub fn kind(kind: TransactionKind) -> TransactionType {
    match kind {
        TransactionKind::Income => TransactionType::Income,
        TransactionKind::Expense => TransactionType::Expense,
    }
}

pub fn kind_in(kind: TransactionType) -> TransactionKind {
    match kind {
        TransactionType::Income => TransactionKind::Income,
        TransactionType::Expense => TransactionKind::Expense,
    }
}

pub fn transaction(tx: Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        account_id: tx.account_id,
        title: tx.title,
        amount: tx.amount_minor,
        kind: kind(tx.kind),
        category: tx.category,
        notes: tx.notes,
        date: tx.date,
        created_by_id: tx.created_by_id,
        updated_by_id: tx.updated_by_id,
        created_at: tx.created_at,
        updated_at: tx.updated_at,
    }
}

pub fn move_kind(kind: MoveType) -> MoveKind {
    match kind {
        MoveType::Add => MoveKind::Add,
        MoveType::Remove => MoveKind::Remove,
    }
}

pub fn saving_goal(goal: SavingGoal) -> SavingGoalView {
    SavingGoalView {
        id: goal.id,
        account_id: goal.account_id,
        title: goal.title,
        target_amount: goal.target_amount,
        current_amount: goal.current_amount,
        deadline: goal.deadline,
        notes: goal.notes,
        created_by_id: goal.created_by_id,
        updated_by_id: goal.updated_by_id,
        created_at: goal.created_at,
        updated_at: goal.updated_at,
    }
}

pub fn summary(summary: Summary) -> SummaryView {
    SummaryView {
        total_income: summary.total_income,
        total_expense: summary.total_expense,
        balance: summary.balance,
        transaction_count: summary.transaction_count,
        period: summary.period,
    }
}

pub fn category(total: CategoryTotal) -> CategoryView {
    CategoryView {
        category: total.category,
        total: total.total,
        percentage: total.percentage,
    }
}

pub fn dashboard(dashboard: Dashboard) -> DashboardView {
    DashboardView {
        summary: summary(dashboard.summary),
        categories: dashboard.categories.into_iter().map(category).collect(),
        recent_transactions: dashboard.recent.into_iter().map(transaction).collect(),
    }
}

pub fn audit_action_in(action: ActionView) -> AuditAction {
    match action {
        ActionView::Create => AuditAction::Create,
        ActionView::Update => AuditAction::Update,
        ActionView::Delete => AuditAction::Delete,
    }
}

pub fn audit_log(detail: AuditLogDetail) -> AuditLogView {
    let log = detail.log;
    AuditLogView {
        id: log.id,
        action: match log.action {
            AuditAction::Create => ActionView::Create,
            AuditAction::Update => ActionView::Update,
            AuditAction::Delete => ActionView::Delete,
        },
        entity_type: log.entity_type,
        entity_id: log.entity_id,
        performed_by_id: log.performed_by_id,
        account_id: log.account_id,
        old_data: log.old_data,
        new_data: log.new_data,
        created_at: log.created_at,
        performed_by: detail.performed_by.map(|p| UserSummary {
            id: p.id,
            name: p.name,
            email: p.email,
        }),
    }
}
