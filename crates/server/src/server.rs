use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use std::sync::Arc;

use crate::{
    ServerError,
    accounts, invites, saving_goals, transactions, users,
    auth::{IdentityVerifier, JwtIssuer},
};
use engine::{Engine, PasswordHasher};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub tokens: Arc<JwtIssuer>,
    pub hasher: Arc<dyn PasswordHasher>,
    /// `None` when no external identity provider is configured.
    pub identity: Option<Arc<dyn IdentityVerifier>>,
}

/// Resolves the bearer token into an [`engine::AuthContext`] extension.
async fn auth(
    auth_header: Option<TypedHeader<Authorization<Bearer>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(TypedHeader(Authorization(bearer))) = auth_header else {
        return ServerError::Unauthorized("Access denied. No token provided.".to_string())
            .into_response();
    };
    let Some(ctx) = state.tokens.verify(bearer.token()) else {
        return ServerError::Unauthorized("Invalid token.".to_string()).into_response();
    };

    request.extensions_mut().insert(ctx);
    next.run(request).await
}

fn protected(state: ServerState) -> Router<ServerState> {
    Router::new()
        .route(
            "/users/me",
            get(users::me).put(users::update).delete(users::delete),
        )
        .route("/accounts", get(accounts::list).post(accounts::create))
        .route(
            "/accounts/{account_id}",
            get(accounts::get)
                .put(accounts::update)
                .delete(accounts::delete),
        )
        .route("/accounts/{account_id}/members", get(accounts::members))
        .route(
            "/accounts/{account_id}/members/{member_id}",
            patch(accounts::change_role).delete(accounts::remove_member),
        )
        .route("/accounts/{account_id}/audit-logs", get(accounts::audit_logs))
        .route(
            "/accounts/{account_id}/audit-logs/{log_id}",
            get(accounts::audit_log),
        )
        .route("/invites", post(invites::send))
        .route("/invites/received", get(invites::received))
        .route("/invites/sent", get(invites::sent))
        .route("/invites/expired", get(invites::expired))
        .route(
            "/invites/{id}",
            post(invites::cancel).delete(invites::cancel),
        )
        .route("/invites/{id}/accept", post(invites::accept))
        .route("/invites/{id}/reject", post(invites::reject))
        .route("/invites/{id}/expire", patch(invites::expire))
        .route("/invites/{id}/cancel", patch(invites::cancel))
        .route("/transactions", post(transactions::create))
        .route("/transactions/account/{account_id}", get(transactions::list))
        .route(
            "/transactions/summary/{account_id}",
            get(transactions::summary),
        )
        .route(
            "/transactions/analytics/{account_id}",
            get(transactions::analytics),
        )
        .route(
            "/transactions/dashboard/{account_id}",
            get(transactions::dashboard),
        )
        .route(
            "/transactions/{id}",
            get(transactions::get)
                .put(transactions::update)
                .delete(transactions::delete),
        )
        .route("/saving-goals", post(saving_goals::create))
        .route("/saving-goals/account/{account_id}", get(saving_goals::list))
        .route(
            "/saving-goals/{id}",
            get(saving_goals::get)
                .put(saving_goals::update)
                .delete(saving_goals::delete),
        )
        .route("/saving-goals/{id}/move-money", post(saving_goals::move_money))
        .route_layer(middleware::from_fn_with_state(state, auth))
}

pub fn router(state: ServerState) -> Router {
    let api = Router::new()
        .route("/auth/register", post(users::register))
        .route("/auth/login", post(users::login))
        .route("/auth/google", post(users::google))
        .merge(protected(state.clone()));

    Router::new().nest("/api", api).with_state(state)
}

pub async fn run_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(state)).await
}
