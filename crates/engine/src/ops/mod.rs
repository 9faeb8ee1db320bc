use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{AuditEntry, AuditSink, DatabaseAuditSink, EngineError, ResultEngine};

mod access;
mod accounts;
mod analytics;
mod audit_logs;
mod invites;
mod members;
mod saving_goals;
mod transactions;
mod users;

pub use accounts::AccountDetail;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    audit: Arc<dyn AuditSink>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Hand committed audit records to the sink. Failures are logged only.
    async fn publish(&self, entries: Vec<AuditEntry>) {
        for entry in entries {
            if let Err(err) = self.audit.write(&entry).await {
                tracing::warn!(
                    action = entry.action.as_str(),
                    entity_type = %entry.entity_type,
                    entity_id = %entry.entity_id,
                    "failed to write audit record: {err}"
                );
            }
        }
    }
}

fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidInput(format!(
            "{label} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

fn normalize_email(value: &str) -> ResultEngine<String> {
    let email = value.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(EngineError::InvalidInput("Invalid email.".to_string()));
    }
    Ok(email)
}

fn require_positive(amount: i64, label: &str) -> ResultEngine<i64> {
    if amount <= 0 {
        return Err(EngineError::InvalidAmount(format!(
            "{label} must be greater than zero"
        )));
    }
    Ok(amount)
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    audit: Option<Arc<dyn AuditSink>>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Replace the default audit sink (the `audit_logs` table).
    pub fn audit_sink(mut self, sink: Arc<dyn AuditSink>) -> EngineBuilder {
        self.audit = Some(sink);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let audit = match self.audit {
            Some(sink) => sink,
            None => Arc::new(DatabaseAuditSink::new(self.database.clone())),
        };
        Ok(Engine {
            database: self.database,
            audit,
        })
    }
}
