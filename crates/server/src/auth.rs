//! Credentials: password hashing, session tokens and external identity.

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use engine::{AuthContext, EngineError, PasswordHasher, ResultEngine};

use crate::ServerError;

const GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Argon2id with the crate's default cost parameters.
#[derive(Debug, Default)]
pub struct Argon2Hasher;

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> ResultEngine<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| {
                tracing::error!("password hashing failed: {err}");
                EngineError::Internal(format!("password hashing failed: {err}"))
            })
    }

    fn verify(&self, password: &str, hash: &str) -> ResultEngine<bool> {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!("stored password hash is malformed: {err}");
                return Ok(false);
            }
        };
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

/// Payload of a session token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    pub user_id: String,
    pub email: String,
    pub exp: i64,
}

/// Issues and checks HS256 session tokens.
#[derive(Clone)]
pub struct JwtIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtIssuer {
    pub fn new(secret: &str, ttl_days: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::days(ttl_days),
        }
    }

    pub fn issue(&self, user_id: &str, email: &str) -> Result<String, ServerError> {
        let claims = TokenClaims {
            user_id: user_id.to_string(),
            email: email.to_string(),
            exp: (Utc::now() + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|err| {
            tracing::error!("failed to sign session token: {err}");
            ServerError::Generic("Could not create session.".to_string())
        })
    }

    /// Identity carried by a valid, unexpired token.
    pub fn verify(&self, token: &str) -> Option<AuthContext> {
        let validation = Validation::new(Algorithm::HS256);
        match decode::<TokenClaims>(token, &self.decoding, &validation) {
            Ok(data) => Some(AuthContext::new(data.claims.user_id, data.claims.email)),
            Err(err) => {
                tracing::debug!("rejected session token: {err}");
                None
            }
        }
    }
}

/// Identity asserted by an external provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub email: String,
    pub name: String,
}

/// Verifies third-party ID tokens.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<VerifiedIdentity, ServerError>;
}

/// Checks Google ID tokens against the tokeninfo endpoint.
pub struct GoogleVerifier {
    client: reqwest::Client,
    client_id: String,
}

impl GoogleVerifier {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id: client_id.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    email: Option<String>,
    email_verified: Option<serde_json::Value>,
    name: Option<String>,
}

impl TokenInfo {
    fn email_verified(&self) -> bool {
        match &self.email_verified {
            Some(serde_json::Value::Bool(flag)) => *flag,
            Some(serde_json::Value::String(flag)) => flag == "true",
            _ => false,
        }
    }

    fn into_identity(self, client_id: &str) -> Result<VerifiedIdentity, ServerError> {
        let invalid = || ServerError::Unauthorized("Invalid Google token.".to_string());
        if self.aud != client_id || !self.email_verified() {
            return Err(invalid());
        }
        let email = self.email.ok_or_else(invalid)?;
        let name = self
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| email.clone());
        Ok(VerifiedIdentity { email, name })
    }
}

#[async_trait]
impl IdentityVerifier for GoogleVerifier {
    async fn verify(&self, id_token: &str) -> Result<VerifiedIdentity, ServerError> {
        let invalid = || ServerError::Unauthorized("Invalid Google token.".to_string());
        let response = self
            .client
            .get(GOOGLE_TOKENINFO_URL)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|err| {
                tracing::warn!("google tokeninfo request failed: {err}");
                invalid()
            })?;
        if !response.status().is_success() {
            return Err(invalid());
        }
        let info: TokenInfo = response.json().await.map_err(|err| {
            tracing::warn!("google tokeninfo response unreadable: {err}");
            invalid()
        })?;
        info.into_identity(&self.client_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argon2_hash_round_trip() {
        let hasher = Argon2Hasher;
        let hash = hasher.hash("hunter2").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("hunter2", &hash).unwrap());
        assert!(!hasher.verify("hunter3", &hash).unwrap());
        assert!(!hasher.verify("hunter2", "not-a-hash").unwrap());
    }

    #[test]
    fn tokens_carry_identity() {
        let issuer = JwtIssuer::new("test-secret", 7);
        let token = issuer.issue("user-1", "alice@example.com").ok().unwrap();
        let ctx = issuer.verify(&token).unwrap();
        assert_eq!(ctx.user_id, "user-1");
        assert_eq!(ctx.email, "alice@example.com");

        let other = JwtIssuer::new("other-secret", 7);
        assert!(other.verify(&token).is_none());
        assert!(issuer.verify("garbage").is_none());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let issuer = JwtIssuer::new("test-secret", -1);
        let token = issuer.issue("user-1", "alice@example.com").ok().unwrap();
        assert!(issuer.verify(&token).is_none());
    }

    #[test]
    fn tokeninfo_requires_matching_audience_and_verified_email() {
        let info = |aud: &str, verified: serde_json::Value| TokenInfo {
            aud: aud.to_string(),
            email: Some("gina@example.com".to_string()),
            email_verified: Some(verified),
            name: None,
        };

        let identity = info("client", serde_json::json!("true"))
            .into_identity("client")
            .ok()
            .unwrap();
        assert_eq!(identity.email, "gina@example.com");
        assert_eq!(identity.name, "gina@example.com");

        assert!(info("client", serde_json::json!(true)).into_identity("client").is_ok());
        assert!(info("other", serde_json::json!(true)).into_identity("client").is_err());
        assert!(info("client", serde_json::json!("false")).into_identity("client").is_err());
    }
}
