//! Users and the password-hash port.
//!
//! Users are identified by a UUID and authenticate either with a local
//! password or through an external identity provider. The hashing primitive
//! is not implemented here: callers inject a [`PasswordHasher`].

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// How a user signs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Provider {
    Local,
    Google,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Google => "google",
        }
    }
}

impl TryFrom<&str> for Provider {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "local" => Ok(Self::Local),
            "google" => Ok(Self::Google),
            other => Err(EngineError::InvalidInput(format!(
                "invalid provider: {other}"
            ))),
        }
    }
}

/// Password hashing primitive.
///
/// Implementations must be slow, salted one-way hashes; the engine only
/// stores and compares what they return.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> ResultEngine<String>;
    fn verify(&self, password: &str, hash: &str) -> ResultEngine<bool>;
}

/// Public view of a user (never carries the password hash).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub gender: Option<String>,
    pub provider: Provider,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for a local registration.
#[derive(Clone, Debug, Default)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub gender: Option<String>,
}

/// Partial profile update. A password change needs all three password
/// fields.
#[derive(Clone, Debug, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub gender: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    pub confirm_new_password: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password: Option<String>,
    pub gender: Option<String>,
    pub provider: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::memberships::Entity")]
    Memberships,
}

impl Related<super::memberships::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Memberships.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for User {
    type Error = EngineError;

    fn try_from(value: Model) -> ResultEngine<Self> {
        Ok(Self {
            provider: Provider::try_from(value.provider.as_str())?,
            id: value.id,
            name: value.name,
            email: value.email,
            gender: value.gender,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

pub(crate) fn new_active_user(
    name: String,
    email: String,
    password: Option<String>,
    gender: Option<String>,
    provider: Provider,
) -> ActiveModel {
    let now = Utc::now();
    ActiveModel {
        id: ActiveValue::Set(Uuid::new_v4().to_string()),
        name: ActiveValue::Set(name),
        email: ActiveValue::Set(email),
        password: ActiveValue::Set(password),
        gender: ActiveValue::Set(gender),
        provider: ActiveValue::Set(provider.as_str().to_string()),
        created_at: ActiveValue::Set(now),
        updated_at: ActiveValue::Set(now),
    }
}
