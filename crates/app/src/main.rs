use std::sync::Arc;

use migration::{Migrator, MigratorTrait};
use server::{Argon2Hasher, GoogleVerifier, IdentityVerifier, JwtIssuer, ServerState};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "tally={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.server.database).await?;
    let engine = engine::Engine::builder().database(db).build().await?;

    let identity = settings.auth.google_client_id.as_deref().map(|client_id| {
        tracing::info!("Google login enabled");
        Arc::new(GoogleVerifier::new(client_id)) as Arc<dyn IdentityVerifier>
    });
    let state = ServerState {
        engine: Arc::new(engine),
        tokens: Arc::new(JwtIssuer::new(
            &settings.auth.token_secret,
            settings.auth.token_ttl_days,
        )),
        hasher: Arc::new(Argon2Hasher),
        identity,
    };

    let bind = settings
        .server
        .bind
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, settings.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    server::run_with_listener(state, listener).await?;

    Ok(())
}

async fn parse_database(
    config: &Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    tracing::info!("database ready");
    Ok(database)
}
