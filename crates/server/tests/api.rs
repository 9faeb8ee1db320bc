use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::{Engine, PasswordHasher, ResultEngine};
use migration::MigratorTrait;
use server::{IdentityVerifier, JwtIssuer, ServerError, ServerState, VerifiedIdentity, router};

#[derive(Debug)]
struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, password: &str) -> ResultEngine<String> {
        Ok(format!("plain:{password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> ResultEngine<bool> {
        Ok(hash == format!("plain:{password}"))
    }
}

/// Accepts `good-token` as Gina's Google identity.
struct StubVerifier;

#[async_trait]
impl IdentityVerifier for StubVerifier {
    async fn verify(&self, id_token: &str) -> Result<VerifiedIdentity, ServerError> {
        if id_token == "good-token" {
            Ok(VerifiedIdentity {
                email: "gina@example.com".to_string(),
                name: "Gina".to_string(),
            })
        } else {
            Err(ServerError::Unauthorized("Invalid Google token.".to_string()))
        }
    }
}

async fn app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();

    router(ServerState {
        engine: Arc::new(engine),
        tokens: Arc::new(JwtIssuer::new("test-secret", 7)),
        hasher: Arc::new(PlainHasher),
        identity: Some(Arc::new(StubVerifier)),
    })
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Register `name` and return a session token.
async fn signup(app: &Router, name: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "name": name,
            "email": format!("{}@example.com", name.to_lowercase()),
            "password": "secret",
            "confirmPassword": "secret",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["token"].as_str().unwrap().to_string()
}

async fn new_account(app: &Router, token: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/accounts",
        Some(token),
        Some(json!({ "name": "Household", "currency": "EUR" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["role"], "OWNER");
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn protected_routes_require_a_bearer_token() {
    let app = app().await;

    let (status, body) = call(&app, Method::GET, "/api/accounts", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].is_string());

    let (status, _) = call(&app, Method::GET, "/api/users/me", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let foreign = JwtIssuer::new("another-secret", 7)
        .issue("someone", "someone@example.com")
        .ok()
        .unwrap();
    let (status, _) = call(&app, Method::GET, "/api/users/me", Some(&foreign), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_login_and_profile() {
    let app = app().await;
    let token = signup(&app, "Alice").await;

    let (status, me) = call(&app, Method::GET, "/api/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "alice@example.com");
    assert_eq!(me["provider"], "local");
    assert!(me.get("password").is_none());

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials.");

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "secret" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "name": "Alice",
            "email": "alice@example.com",
            "password": "secret",
            "confirmPassword": "secret",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid credentials.");

    let (status, updated) = call(
        &app,
        Method::PUT,
        "/api/users/me",
        Some(&token),
        Some(json!({ "name": "Alice Liddell" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Alice Liddell");

    let (status, _) = call(
        &app,
        Method::DELETE,
        "/api/users/me",
        Some(&token),
        Some(json!({ "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(
        &app,
        Method::DELETE,
        "/api/users/me",
        Some(&token),
        Some(json!({ "password": "secret" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User deleted successfully.");

    let (status, _) = call(&app, Method::GET, "/api/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn google_login_creates_and_reuses_the_user() {
    let app = app().await;

    let (status, first) = call(
        &app,
        Method::POST,
        "/api/auth/google",
        None,
        Some(json!({ "idToken": "good-token" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["user"]["provider"], "google");

    let (_, second) = call(
        &app,
        Method::POST,
        "/api/auth/google",
        None,
        Some(json!({ "idToken": "good-token" })),
    )
    .await;
    assert_eq!(first["user"]["id"], second["user"]["id"]);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/auth/google",
        None,
        Some(json!({ "idToken": "forged" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = first["token"].as_str().unwrap();
    let (status, body) = call(
        &app,
        Method::DELETE,
        "/api/users/me",
        Some(token),
        Some(json!({ "password": "anything" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "OAuth users must confirm identity via Google.");
    let (status, _) = call(&app, Method::GET, "/api/users/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn outsiders_are_forbidden_and_missing_things_are_404() {
    let app = app().await;
    let alice = signup(&app, "Alice").await;
    let mallory = signup(&app, "Mallory").await;
    let account_id = new_account(&app, &alice).await;

    let uri = format!("/api/accounts/{account_id}");
    let (status, body) = call(&app, Method::GET, &uri, Some(&mallory), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["message"].is_string());

    let uri = format!("/api/transactions/account/{account_id}");
    let (status, _) = call(&app, Method::GET, &uri, Some(&mallory), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(
        &app,
        Method::GET,
        "/api/transactions/does-not-exist",
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invite_flow_end_to_end() {
    let app = app().await;
    let alice = signup(&app, "Alice").await;
    let bob = signup(&app, "Bob").await;
    let account_id = new_account(&app, &alice).await;

    let (status, invite) = call(
        &app,
        Method::POST,
        "/api/invites",
        Some(&alice),
        Some(json!({ "accountId": account_id, "email": "bob@example.com", "role": "ADMIN" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{invite}");
    assert_eq!(invite["status"], "PENDING");
    let token = invite["token"].as_str().unwrap().to_string();

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/invites",
        Some(&alice),
        Some(json!({ "accountId": account_id, "email": "bob@example.com", "role": "ADMIN" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("already exists"));

    let (status, received) =
        call(&app, Method::GET, "/api/invites/received", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(received.as_array().unwrap().len(), 1);
    assert_eq!(received[0]["account"]["name"], "Household");
    assert_eq!(received[0]["invitedBy"]["email"], "alice@example.com");

    // Only the addressee may accept.
    let uri = format!("/api/invites/{token}/accept");
    let (status, _) = call(&app, Method::POST, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&app, Method::POST, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, Method::POST, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!("/api/accounts/{account_id}/members");
    let (status, members) = call(&app, Method::GET, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    let roles: Vec<_> = members
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["role"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(roles, vec!["OWNER".to_string(), "ADMIN".to_string()]);

    let uri = format!("/api/accounts/{account_id}/audit-logs?entityType=AccountMember");
    let (status, logs) = call(&app, Method::GET, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(logs[0]["action"], "CREATE");
    assert_eq!(logs[0]["performedBy"]["email"], "bob@example.com");

    let bob_member_id = members[1]["id"].as_str().unwrap();
    let uri = format!("/api/accounts/{account_id}/members/{bob_member_id}");
    let (status, member) = call(
        &app,
        Method::PATCH,
        &uri,
        Some(&alice),
        Some(json!({ "role": "MEMBER" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{member}");
    assert_eq!(member["role"], "MEMBER");
    assert_eq!(member["user"]["email"], "bob@example.com");
    let (status, _) = call(
        &app,
        Method::PUT,
        &uri,
        Some(&alice),
        Some(json!({ "role": "ADMIN" })),
    )
    .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, invite) = call(
        &app,
        Method::POST,
        "/api/invites",
        Some(&alice),
        Some(json!({ "accountId": account_id, "email": "carol@example.com", "role": "MEMBER" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{invite}");
    let uri = format!("/api/invites/{}", invite["id"].as_str().unwrap());
    let (status, _) = call(&app, Method::POST, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = call(&app, Method::POST, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Invite cancelled.");
}

#[tokio::test]
async fn malformed_payloads_and_queries_are_json_400s() {
    let app = app().await;
    let alice = signup(&app, "Alice").await;
    let account_id = new_account(&app, &alice).await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/transactions",
        Some(&alice),
        Some(json!({
            "accountId": account_id,
            "amount": 1_000,
            "type": "EXPENSE",
            "category": "Food",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("title"), "{body}");

    let (status, goal) = call(
        &app,
        Method::POST,
        "/api/saving-goals",
        Some(&alice),
        Some(json!({ "accountId": account_id, "title": "Bike", "targetAmount": 100 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{goal}");
    let uri = format!("/api/saving-goals/{}/move-money", goal["id"].as_str().unwrap());
    let (status, body) = call(
        &app,
        Method::POST,
        &uri,
        Some(&alice),
        Some(json!({ "amount": 10, "type": "SIDEWAYS" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let uri = format!("/api/accounts/{account_id}/audit-logs?startDate=not-a-date");
    let (status, body) = call(&app, Method::GET, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn transactions_goals_and_dashboard() {
    let app = app().await;
    let alice = signup(&app, "Alice").await;
    let account_id = new_account(&app, &alice).await;

    for (title, amount, kind, category) in [
        ("Salary", 300_000, "INCOME", "Work"),
        ("Rent", 100_000, "EXPENSE", "Housing"),
        ("Groceries", 50_000, "EXPENSE", "Food"),
    ] {
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/transactions",
            Some(&alice),
            Some(json!({
                "accountId": account_id,
                "title": title,
                "amount": amount,
                "type": kind,
                "category": category,
                "date": "2025-03-10T12:00:00Z",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    let uri = format!("/api/transactions/summary/{account_id}?month=3&year=2025");
    let (status, summary) = call(&app, Method::GET, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["balance"], 150_000);
    assert_eq!(summary["period"], "3/2025");

    let uri = format!("/api/transactions/summary/{account_id}?month=13&year=2025");
    let (status, _) = call(&app, Method::GET, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!("/api/transactions/dashboard/{account_id}");
    let (status, dashboard) = call(&app, Method::GET, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["summary"]["period"], "all-time");
    assert_eq!(dashboard["categories"][0]["category"], "Housing");
    assert_eq!(dashboard["recentTransactions"].as_array().unwrap().len(), 3);

    let (status, goal) = call(
        &app,
        Method::POST,
        "/api/saving-goals",
        Some(&alice),
        Some(json!({ "accountId": account_id, "title": "Bike", "targetAmount": 100 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{goal}");
    let goal_id = goal["id"].as_str().unwrap().to_string();

    let uri = format!("/api/saving-goals/{goal_id}/move-money");
    let (status, goal) = call(
        &app,
        Method::POST,
        &uri,
        Some(&alice),
        Some(json!({ "amount": 80, "type": "ADD" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(goal["currentAmount"], 80);

    let (status, body) = call(
        &app,
        Method::POST,
        &uri,
        Some(&alice),
        Some(json!({ "amount": 30, "type": "ADD" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let uri = format!("/api/saving-goals/{goal_id}");
    let (status, body) = call(&app, Method::DELETE, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Saving goal deleted successfully.");
}
