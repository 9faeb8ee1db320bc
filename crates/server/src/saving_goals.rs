//! Saving goal endpoints.

use api_types::{
    Message,
    saving_goal::{MoveMoney, SavingGoal, SavingGoalNew, SavingGoalUpdate},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use engine::{AuthContext, SavingGoalChanges};

use crate::{ServerError, extract::ApiJson, mapping, server::ServerState};

pub async fn create(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<SavingGoalNew>,
) -> Result<(StatusCode, Json<SavingGoal>), ServerError> {
    let goal = state
        .engine
        .create_saving_goal(
            &ctx,
            &payload.account_id,
            &payload.title,
            payload.target_amount,
            payload.deadline,
            payload.notes.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(mapping::saving_goal(goal))))
}

pub async fn list(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<ServerState>,
    Path(account_id): Path<String>,
) -> Result<Json<Vec<SavingGoal>>, ServerError> {
    let goals = state
        .engine
        .list_saving_goals(&ctx, &account_id)
        .await?
        .into_iter()
        .map(mapping::saving_goal)
        .collect();
    Ok(Json(goals))
}

pub async fn get(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<ServerState>,
    Path(goal_id): Path<String>,
) -> Result<Json<SavingGoal>, ServerError> {
    let goal = state.engine.get_saving_goal(&ctx, &goal_id).await?;
    Ok(Json(mapping::saving_goal(goal)))
}

pub async fn update(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<ServerState>,
    Path(goal_id): Path<String>,
    ApiJson(payload): ApiJson<SavingGoalUpdate>,
) -> Result<Json<SavingGoal>, ServerError> {
    let goal = state
        .engine
        .update_saving_goal(
            &ctx,
            &goal_id,
            SavingGoalChanges {
                title: payload.title,
                target_amount: payload.target_amount,
                deadline: payload.deadline,
                notes: payload.notes,
            },
        )
        .await?;
    Ok(Json(mapping::saving_goal(goal)))
}

pub async fn move_money(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<ServerState>,
    Path(goal_id): Path<String>,
    ApiJson(payload): ApiJson<MoveMoney>,
) -> Result<Json<SavingGoal>, ServerError> {
    let goal = state
        .engine
        .move_money(&ctx, &goal_id, mapping::move_kind(payload.kind), payload.amount)
        .await?;
    Ok(Json(mapping::saving_goal(goal)))
}

pub async fn delete(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<ServerState>,
    Path(goal_id): Path<String>,
) -> Result<Json<Message>, ServerError> {
    state.engine.delete_saving_goal(&ctx, &goal_id).await?;
    Ok(Json(Message::new("Saving goal deleted successfully.")))
}
