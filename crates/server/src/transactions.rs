//! Transactions API endpoints and the analytics computed over them.

use api_types::{
    Message,
    analytics::{CategoryTotal, Dashboard, PeriodQuery, Summary},
    transaction::{Transaction, TransactionNew, TransactionUpdate},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use engine::{AuthContext, NewTransaction, Period, TransactionChanges};

use crate::{
    ServerError,
    extract::{ApiJson, ApiQuery},
    mapping,
    server::ServerState,
};

fn period(query: &PeriodQuery) -> Result<Period, ServerError> {
    Ok(Period::from_query(
        query.month.as_deref(),
        query.year.as_deref(),
    )?)
}

pub async fn create(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<TransactionNew>,
) -> Result<(StatusCode, Json<Transaction>), ServerError> {
    let tx = state
        .engine
        .create_transaction(
            &ctx,
            NewTransaction {
                account_id: payload.account_id,
                title: payload.title,
                amount_minor: payload.amount,
                kind: mapping::kind_in(payload.kind),
                category: payload.category,
                notes: payload.notes,
                date: payload.date,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(mapping::transaction(tx))))
}

pub async fn list(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<ServerState>,
    Path(account_id): Path<String>,
) -> Result<Json<Vec<Transaction>>, ServerError> {
    let txs = state
        .engine
        .list_transactions(&ctx, &account_id)
        .await?
        .into_iter()
        .map(mapping::transaction)
        .collect();
    Ok(Json(txs))
}

pub async fn get(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<String>,
) -> Result<Json<Transaction>, ServerError> {
    let tx = state.engine.get_transaction(&ctx, &transaction_id).await?;
    Ok(Json(mapping::transaction(tx)))
}

pub async fn update(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<String>,
    ApiJson(payload): ApiJson<TransactionUpdate>,
) -> Result<Json<Transaction>, ServerError> {
    let tx = state
        .engine
        .update_transaction(
            &ctx,
            &transaction_id,
            TransactionChanges {
                title: payload.title,
                amount_minor: payload.amount,
                kind: payload.kind.map(mapping::kind_in),
                category: payload.category,
                notes: payload.notes,
                date: payload.date,
            },
        )
        .await?;
    Ok(Json(mapping::transaction(tx)))
}

pub async fn delete(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<String>,
) -> Result<Json<Message>, ServerError> {
    state
        .engine
        .delete_transaction(&ctx, &transaction_id)
        .await?;
    Ok(Json(Message::new("Transaction deleted successfully.")))
}

pub async fn summary(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<ServerState>,
    Path(account_id): Path<String>,
    ApiQuery(query): ApiQuery<PeriodQuery>,
) -> Result<Json<Summary>, ServerError> {
    let summary = state
        .engine
        .summary(&ctx, &account_id, period(&query)?)
        .await?;
    Ok(Json(mapping::summary(summary)))
}

pub async fn analytics(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<ServerState>,
    Path(account_id): Path<String>,
    ApiQuery(query): ApiQuery<PeriodQuery>,
) -> Result<Json<Vec<CategoryTotal>>, ServerError> {
    let categories = state
        .engine
        .category_analytics(&ctx, &account_id, period(&query)?)
        .await?
        .into_iter()
        .map(mapping::category)
        .collect();
    Ok(Json(categories))
}

pub async fn dashboard(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<ServerState>,
    Path(account_id): Path<String>,
    ApiQuery(query): ApiQuery<PeriodQuery>,
) -> Result<Json<Dashboard>, ServerError> {
    let dashboard = state
        .engine
        .dashboard(&ctx, &account_id, period(&query)?)
        .await?;
    Ok(Json(mapping::dashboard(dashboard)))
}
