//! The module contains the errors the engine can throw.
//!
//! Every business-rule violation is detected where it happens and returned
//! as a typed variant; the server maps each variant to an HTTP status.
//!
//! - [`InvalidInput`], [`InvalidRole`], [`InvalidAmount`],
//!   [`InsufficientFunds`], [`TargetExceeded`] and [`Conflict`] are caller
//!   mistakes or rule violations.
//! - [`Unauthorized`] is a failed credential check.
//! - [`Forbidden`] means the caller is authenticated but lacks membership or
//!   role.
//! - [`KeyNotFound`] means the entity is absent or out of the caller's scope.
//! - [`Internal`] is a failure the caller cannot fix, such as a broken
//!   password hasher.
//!
//!  [`InvalidInput`]: EngineError::InvalidInput
//!  [`InvalidRole`]: EngineError::InvalidRole
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`InsufficientFunds`]: EngineError::InsufficientFunds
//!  [`TargetExceeded`]: EngineError::TargetExceeded
//!  [`Conflict`]: EngineError::Conflict
//!  [`Unauthorized`]: EngineError::Unauthorized
//!  [`Forbidden`]: EngineError::Forbidden
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`Internal`]: EngineError::Internal
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    InvalidRole(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("Target amount exceeded: {0}")]
    TargetExceeded(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0} not found")]
    KeyNotFound(String),
    #[error("{0}")]
    Internal(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::InvalidRole(a), Self::InvalidRole(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::TargetExceeded(a), Self::TargetExceeded(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::Unauthorized(a), Self::Unauthorized(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::Internal(a), Self::Internal(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
