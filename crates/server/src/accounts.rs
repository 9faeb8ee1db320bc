//! Accounts, their members and their audit trail.

use api_types::{
    Message,
    account::{Account, AccountDetail, AccountNew, AccountUpdate},
    audit::{AuditLog, AuditQuery},
    member::{Member, RoleUpdate},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use engine::{AccountChanges, AccountRole, AuditLogFilter, AuthContext};

use crate::{
    ServerError,
    extract::{ApiJson, ApiQuery},
    mapping,
    server::ServerState,
};

pub async fn list(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<Account>>, ServerError> {
    let accounts = state
        .engine
        .list_accounts(&ctx)
        .await?
        .into_iter()
        .map(|(account, role)| mapping::account(account, Some(role)))
        .collect();
    Ok(Json(accounts))
}

pub async fn get(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<ServerState>,
    Path(account_id): Path<String>,
) -> Result<Json<AccountDetail>, ServerError> {
    let detail = state.engine.get_account(&ctx, &account_id).await?;
    Ok(Json(AccountDetail {
        account: mapping::account(detail.account, Some(detail.role)),
        members: detail.members.into_iter().map(mapping::member).collect(),
    }))
}

pub async fn create(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<AccountNew>,
) -> Result<(StatusCode, Json<Account>), ServerError> {
    let account = state
        .engine
        .create_account(
            &ctx,
            &payload.name,
            payload.description.as_deref(),
            payload.currency.map(mapping::currency_in),
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(mapping::account(account, Some(AccountRole::Owner))),
    ))
}

pub async fn update(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<ServerState>,
    Path(account_id): Path<String>,
    ApiJson(payload): ApiJson<AccountUpdate>,
) -> Result<Json<Account>, ServerError> {
    let account = state
        .engine
        .update_account(
            &ctx,
            &account_id,
            AccountChanges {
                name: payload.name,
                description: payload.description,
                currency: payload.currency.map(mapping::currency_in),
            },
        )
        .await?;
    Ok(Json(mapping::account(account, None)))
}

pub async fn delete(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<ServerState>,
    Path(account_id): Path<String>,
) -> Result<Json<Message>, ServerError> {
    state.engine.delete_account(&ctx, &account_id).await?;
    Ok(Json(Message::new("Account deleted successfully.")))
}

pub async fn members(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<ServerState>,
    Path(account_id): Path<String>,
) -> Result<Json<Vec<Member>>, ServerError> {
    let members = state
        .engine
        .list_members(&ctx, &account_id)
        .await?
        .into_iter()
        .map(mapping::member)
        .collect();
    Ok(Json(members))
}

pub async fn change_role(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<ServerState>,
    Path((account_id, member_id)): Path<(String, String)>,
    ApiJson(payload): ApiJson<RoleUpdate>,
) -> Result<Json<Member>, ServerError> {
    let membership = state
        .engine
        .change_member_role(&ctx, &account_id, &member_id, &payload.role)
        .await?;
    let member = state
        .engine
        .list_members(&ctx, &account_id)
        .await?
        .into_iter()
        .find(|m| m.membership.id == membership.id)
        .ok_or_else(|| engine::EngineError::KeyNotFound("Member".to_string()))?;
    Ok(Json(mapping::member(member)))
}

pub async fn remove_member(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<ServerState>,
    Path((account_id, member_id)): Path<(String, String)>,
) -> Result<Json<Message>, ServerError> {
    state
        .engine
        .remove_member(&ctx, &account_id, &member_id)
        .await?;
    Ok(Json(Message::new("Member removed.")))
}

pub async fn audit_logs(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<ServerState>,
    Path(account_id): Path<String>,
    ApiQuery(query): ApiQuery<AuditQuery>,
) -> Result<Json<Vec<AuditLog>>, ServerError> {
    let filter = AuditLogFilter {
        action: query.action.map(mapping::audit_action_in),
        entity_type: query.entity_type,
        start_date: query.start_date,
        end_date: query.end_date,
    };
    let logs = state
        .engine
        .list_audit_logs(&ctx, &account_id, filter)
        .await?
        .into_iter()
        .map(mapping::audit_log)
        .collect();
    Ok(Json(logs))
}

pub async fn audit_log(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<ServerState>,
    Path((account_id, log_id)): Path<(String, String)>,
) -> Result<Json<AuditLog>, ServerError> {
    let log = state
        .engine
        .get_audit_log(&ctx, &account_id, &log_id)
        .await?;
    Ok(Json(mapping::audit_log(log)))
}
