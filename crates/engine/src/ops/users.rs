use chrono::Utc;
use sea_orm::{ActiveValue, IntoActiveModel, QueryFilter, TransactionTrait, prelude::*};

use crate::{
    AccountRole, AuthContext, EngineError, NewUser, PasswordHasher, Provider, ResultEngine, User,
    UserChanges, memberships, users,
};

use super::{Engine, normalize_email, normalize_optional_text, with_tx};

const INVALID_CREDENTIALS: &str = "Invalid credentials.";

fn required(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

impl Engine {
    async fn find_user_by_email(&self, email: &str) -> ResultEngine<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email.to_string()))
            .one(&self.database)
            .await
            .map_err(Into::into)
    }

    /// Register a local user.
    pub async fn register(
        &self,
        input: NewUser,
        hasher: &dyn PasswordHasher,
    ) -> ResultEngine<User> {
        let (Some(name), Some(email), Some(_), Some(_)) = (
            required(&input.name),
            required(&input.email),
            required(&input.password),
            required(&input.confirm_password),
        ) else {
            return Err(EngineError::InvalidInput("All fields are required.".to_string()));
        };
        if input.password != input.confirm_password {
            return Err(EngineError::InvalidInput("Passwords do not match.".to_string()));
        }
        let email = normalize_email(email)?;
        if self.find_user_by_email(&email).await?.is_some() {
            return Err(EngineError::Conflict(INVALID_CREDENTIALS.to_string()));
        }

        let hash = hasher.hash(&input.password)?;
        let model = users::new_active_user(
            name.to_string(),
            email,
            Some(hash),
            normalize_optional_text(input.gender.as_deref()),
            Provider::Local,
        )
        .insert(&self.database)
        .await?;
        tracing::info!(user_id = %model.id, "user registered");
        User::try_from(model)
    }

    /// Check a local user's email and password.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
        hasher: &dyn PasswordHasher,
    ) -> ResultEngine<User> {
        let (Some(email), Some(_)) = (required(email), required(password)) else {
            return Err(EngineError::InvalidInput(
                "Email and password are required.".to_string(),
            ));
        };
        let model = self
            .find_user_by_email(&email.to_lowercase())
            .await?
            .ok_or_else(|| EngineError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;
        if Provider::try_from(model.provider.as_str())? == Provider::Google {
            return Err(EngineError::InvalidInput(
                "Use Google login for this account.".to_string(),
            ));
        }
        let hash = model
            .password
            .as_deref()
            .ok_or_else(|| EngineError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;
        if !hasher.verify(password, hash)? {
            return Err(EngineError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }
        User::try_from(model)
    }

    /// Find or create the user behind a verified Google identity.
    pub async fn google_user(&self, email: &str, name: &str) -> ResultEngine<User> {
        let email = normalize_email(email)?;
        if let Some(model) = self.find_user_by_email(&email).await? {
            if Provider::try_from(model.provider.as_str())? != Provider::Google {
                return Err(EngineError::InvalidInput(
                    "Use email and password to log in.".to_string(),
                ));
            }
            return User::try_from(model);
        }

        let name = required(name)
            .map(ToString::to_string)
            .unwrap_or_else(|| email.clone());
        let model = users::new_active_user(name, email, None, None, Provider::Google)
            .insert(&self.database)
            .await?;
        tracing::info!(user_id = %model.id, "google user created");
        User::try_from(model)
    }

    pub async fn current_user(&self, ctx: &AuthContext) -> ResultEngine<User> {
        User::try_from(self.require_user(&self.database, &ctx.user_id).await?)
    }

    /// Update the caller's profile and, optionally, their password.
    pub async fn update_user(
        &self,
        ctx: &AuthContext,
        changes: UserChanges,
        hasher: &dyn PasswordHasher,
    ) -> ResultEngine<User> {
        let wants_password = changes.current_password.is_some()
            || changes.new_password.is_some()
            || changes.confirm_new_password.is_some();
        if changes.name.is_none() && changes.gender.is_none() && !wants_password {
            return Err(EngineError::InvalidInput("No changes provided.".to_string()));
        }

        let model = self.require_user(&self.database, &ctx.user_id).await?;
        let stored_hash = model.password.clone();
        let mut active = model.into_active_model();

        if let Some(name) = changes.name.as_deref() {
            let name = required(name)
                .ok_or_else(|| EngineError::InvalidInput("Name must not be empty.".to_string()))?;
            active.name = ActiveValue::Set(name.to_string());
        }
        if let Some(gender) = changes.gender.as_deref() {
            active.gender = ActiveValue::Set(normalize_optional_text(Some(gender)));
        }
        if wants_password {
            let (Some(current), Some(new), Some(confirm)) = (
                changes.current_password.as_deref(),
                changes.new_password.as_deref().and_then(required),
                changes.confirm_new_password.as_deref(),
            ) else {
                return Err(EngineError::InvalidInput(
                    "Current password, new password and confirmation are required.".to_string(),
                ));
            };
            if new != confirm {
                return Err(EngineError::InvalidInput("Passwords do not match.".to_string()));
            }
            let hash = stored_hash.as_deref().ok_or_else(|| {
                EngineError::InvalidInput("This account has no password to change.".to_string())
            })?;
            if !hasher.verify(current, hash)? {
                return Err(EngineError::InvalidInput(
                    "Current password is incorrect.".to_string(),
                ));
            }
            active.password = ActiveValue::Set(Some(hasher.hash(new)?));
        }
        active.updated_at = ActiveValue::Set(Utc::now());

        User::try_from(active.update(&self.database).await?)
    }

    /// Delete the caller. Refused while they are the only OWNER of an account.
    pub async fn delete_user(
        &self,
        ctx: &AuthContext,
        password: Option<&str>,
        hasher: &dyn PasswordHasher,
    ) -> ResultEngine<()> {
        let password = password.and_then(required).ok_or_else(|| {
            EngineError::InvalidInput("Password confirmation is required.".to_string())
        })?;
        let model = self.require_user(&self.database, &ctx.user_id).await?;
        // Google users have no local password to confirm with.
        let Some(hash) = model.password.as_deref() else {
            return Err(EngineError::InvalidInput(
                "OAuth users must confirm identity via Google.".to_string(),
            ));
        };
        if !hasher.verify(password, hash)? {
            return Err(EngineError::Unauthorized("Incorrect password.".to_string()));
        }

        with_tx!(self, |db_tx| {
            let owned = memberships::Entity::find()
                .filter(memberships::Column::UserId.eq(ctx.user_id.clone()))
                .filter(memberships::Column::Role.eq(AccountRole::Owner.as_str()))
                .all(&db_tx)
                .await?;
            for membership in owned {
                if self.owner_count(&db_tx, &membership.account_id).await? <= 1 {
                    return Err(EngineError::Conflict(
                        "Transfer ownership before deleting your user.".to_string(),
                    ));
                }
            }
            memberships::Entity::delete_many()
                .filter(memberships::Column::UserId.eq(ctx.user_id.clone()))
                .exec(&db_tx)
                .await?;
            users::Entity::delete_by_id(ctx.user_id.clone())
                .exec(&db_tx)
                .await?;
            Ok::<_, EngineError>(())
        })?;

        tracing::info!(user_id = %ctx.user_id, "user deleted");
        Ok(())
    }
}
