//! Invite endpoints. Accept and reject address the invite by token, the
//! inviter-side actions by id.

use api_types::{
    Message,
    invite::{Invite, InviteNew},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use engine::AuthContext;

use crate::{ServerError, extract::ApiJson, mapping, server::ServerState};

pub async fn send(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<InviteNew>,
) -> Result<(StatusCode, Json<Invite>), ServerError> {
    let invite = state
        .engine
        .send_invite(&ctx, &payload.account_id, &payload.email, &payload.role)
        .await?;
    Ok((StatusCode::CREATED, Json(mapping::invite(invite))))
}

pub async fn received(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<Invite>>, ServerError> {
    let invites = state.engine.received_invites(&ctx).await?;
    Ok(Json(invites.into_iter().map(mapping::invite_detail).collect()))
}

pub async fn sent(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<Invite>>, ServerError> {
    let invites = state.engine.sent_invites(&ctx).await?;
    Ok(Json(invites.into_iter().map(mapping::invite_detail).collect()))
}

pub async fn expired(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<Invite>>, ServerError> {
    let invites = state.engine.expired_invites(&ctx).await?;
    Ok(Json(invites.into_iter().map(mapping::invite_detail).collect()))
}

pub async fn accept(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<ServerState>,
    Path(token): Path<String>,
) -> Result<Json<Message>, ServerError> {
    state.engine.accept_invite(&ctx, &token).await?;
    Ok(Json(Message::new("Invite accepted.")))
}

pub async fn reject(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<ServerState>,
    Path(token): Path<String>,
) -> Result<Json<Message>, ServerError> {
    state.engine.reject_invite(&ctx, &token).await?;
    Ok(Json(Message::new("Invite rejected.")))
}

pub async fn expire(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<ServerState>,
    Path(invite_id): Path<String>,
) -> Result<Json<Message>, ServerError> {
    state.engine.expire_invite(&ctx, &invite_id).await?;
    Ok(Json(Message::new("Invite expired.")))
}

pub async fn cancel(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<ServerState>,
    Path(invite_id): Path<String>,
) -> Result<Json<Message>, ServerError> {
    state.engine.cancel_invite(&ctx, &invite_id).await?;
    Ok(Json(Message::new("Invite cancelled.")))
}
