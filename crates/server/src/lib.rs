use api_types::ErrorBody;
use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

pub use auth::{
    Argon2Hasher, GoogleVerifier, IdentityVerifier, JwtIssuer, TokenClaims, VerifiedIdentity,
};
pub use extract::{ApiJson, ApiQuery};
pub use server::{ServerState, router, run_with_listener};

mod accounts;
mod auth;
mod extract;
mod invites;
mod mapping;
mod saving_goals;
mod server;
mod transactions;
mod users;

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
    Unauthorized(String),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::Database(_) | EngineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InvalidInput(_)
        | EngineError::InvalidRole(_)
        | EngineError::InvalidAmount(_)
        | EngineError::InsufficientFunds(_)
        | EngineError::TargetExceeded(_)
        | EngineError::Conflict(_) => StatusCode::BAD_REQUEST,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "Internal server error".to_string()
        }
        // Logged where it was raised.
        EngineError::Internal(_) => "Internal server error".to_string(),
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
            ServerError::Unauthorized(err) => (StatusCode::UNAUTHORIZED, err),
        };

        (status, Json(ErrorBody { message })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_forbidden_maps_to_403() {
        let res = ServerError::from(EngineError::Forbidden("forbidden".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn business_rule_violations_map_to_400() {
        for err in [
            EngineError::Conflict("x".to_string()),
            EngineError::InvalidRole("x".to_string()),
            EngineError::InsufficientFunds("x".to_string()),
            EngineError::TargetExceeded("x".to_string()),
            EngineError::InvalidAmount("x".to_string()),
        ] {
            let res = ServerError::from(err).into_response();
            assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn bad_credentials_map_to_401() {
        let res =
            ServerError::from(EngineError::Unauthorized("Invalid credentials.".to_string()))
                .into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let res = ServerError::Unauthorized("Access denied.".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn database_errors_hide_details() {
        let err = EngineError::Database(sea_orm_err());
        assert_eq!(
            message_for_engine_error(err),
            "Internal server error".to_string()
        );
    }

    #[test]
    fn internal_failures_map_to_500_without_details() {
        let err = EngineError::Internal("password hashing failed: bad params".to_string());
        assert_eq!(status_for_engine_error(&err), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message_for_engine_error(err), "Internal server error");

        let res = ServerError::from(EngineError::Internal("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    fn sea_orm_err() -> sea_orm::DbErr {
        sea_orm::DbErr::Custom("disk on fire".to_string())
    }
}
