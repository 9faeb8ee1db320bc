//! Registration, login and the caller's own profile.

use api_types::{
    Message,
    auth::{AuthResponse, GoogleLogin, Login, Register},
    user::{User, UserDelete, UserUpdate},
};
use axum::{Extension, Json, body::Bytes, extract::State, http::StatusCode};

use engine::{AuthContext, NewUser, UserChanges};

use crate::{ServerError, extract::ApiJson, mapping, server::ServerState};

fn session(state: &ServerState, user: engine::User) -> Result<AuthResponse, ServerError> {
    let token = state.tokens.issue(&user.id, &user.email)?;
    Ok(AuthResponse {
        token,
        user: mapping::user(user),
    })
}

pub async fn register(
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<Register>,
) -> Result<(StatusCode, Json<AuthResponse>), ServerError> {
    let user = state
        .engine
        .register(
            NewUser {
                name: payload.name,
                email: payload.email,
                password: payload.password,
                confirm_password: payload.confirm_password,
                gender: payload.gender,
            },
            state.hasher.as_ref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(session(&state, user)?)))
}

pub async fn login(
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<Login>,
) -> Result<Json<AuthResponse>, ServerError> {
    let user = state
        .engine
        .authenticate(&payload.email, &payload.password, state.hasher.as_ref())
        .await?;

    Ok(Json(session(&state, user)?))
}

pub async fn google(
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<GoogleLogin>,
) -> Result<Json<AuthResponse>, ServerError> {
    if payload.id_token.trim().is_empty() {
        return Err(ServerError::Generic("Google token is required.".to_string()));
    }
    let Some(verifier) = state.identity.as_ref() else {
        return Err(ServerError::Generic(
            "Google login is not configured.".to_string(),
        ));
    };
    let identity = verifier.verify(&payload.id_token).await?;
    let user = state
        .engine
        .google_user(&identity.email, &identity.name)
        .await?;

    Ok(Json(session(&state, user)?))
}

pub async fn me(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<ServerState>,
) -> Result<Json<User>, ServerError> {
    let user = state.engine.current_user(&ctx).await?;
    Ok(Json(mapping::user(user)))
}

pub async fn update(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<UserUpdate>,
) -> Result<Json<User>, ServerError> {
    let user = state
        .engine
        .update_user(
            &ctx,
            UserChanges {
                name: payload.name,
                gender: payload.gender,
                current_password: payload.current_password,
                new_password: payload.new_password,
                confirm_new_password: payload.confirm_new_password,
            },
            state.hasher.as_ref(),
        )
        .await?;
    Ok(Json(mapping::user(user)))
}

pub async fn delete(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<ServerState>,
    body: Bytes,
) -> Result<Json<Message>, ServerError> {
    // The confirmation body is optional for DELETE.
    let payload: UserDelete = if body.is_empty() {
        UserDelete::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|err| ServerError::Generic(format!("Invalid request body: {err}")))?
    };
    let password = payload.password;
    state
        .engine
        .delete_user(&ctx, password.as_deref(), state.hasher.as_ref())
        .await?;
    Ok(Json(Message::new("User deleted successfully.")))
}
