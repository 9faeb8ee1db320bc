#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{Database, DatabaseConnection};

use engine::{
    AuditEntry, AuditSink, AuthContext, Engine, EngineError, NewUser, PasswordHasher,
    ResultEngine,
};
use migration::MigratorTrait;

/// Stores passwords with a visible prefix. Good enough for tests only.
#[derive(Debug)]
pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, password: &str) -> ResultEngine<String> {
        Ok(format!("plain:{password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> ResultEngine<bool> {
        Ok(hash == format!("plain:{password}"))
    }
}

/// Audit sink that always fails.
#[derive(Debug)]
pub struct FailingSink;

#[async_trait]
impl AuditSink for FailingSink {
    async fn write(&self, _entry: &AuditEntry) -> ResultEngine<()> {
        Err(EngineError::InvalidInput("audit store unavailable".to_string()))
    }
}

pub async fn migrated_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    db
}

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = migrated_db().await;
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

pub async fn engine_with_sink(sink: Arc<dyn AuditSink>) -> (Engine, DatabaseConnection) {
    let db = migrated_db().await;
    let engine = Engine::builder()
        .database(db.clone())
        .audit_sink(sink)
        .build()
        .await
        .unwrap();
    (engine, db)
}

/// Register a local user with password `secret` and return their context.
pub async fn user(engine: &Engine, name: &str) -> AuthContext {
    let email = format!("{}@example.com", name.to_lowercase());
    let user = engine
        .register(
            NewUser {
                name: name.to_string(),
                email: email.clone(),
                password: "secret".to_string(),
                confirm_password: "secret".to_string(),
                gender: None,
            },
            &PlainHasher,
        )
        .await
        .unwrap();
    AuthContext::new(user.id, user.email)
}
