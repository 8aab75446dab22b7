use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Duration;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{user, user_token};
use crate::error::{ServiceError, ServiceResult};
use crate::permissions;
use crate::repository;
use crate::services::{now, Checks};

/// The authenticated principal of a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
}

impl CurrentUser {
    pub fn has(&self, permission: &str) -> bool {
        permissions::role_has(&self.role, permission)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserDto {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
}

impl From<user::Model> for UserDto {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            name: model.name,
            role: model.role,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegisterRequest {
    #[serde(alias = "email")]
    pub email: Option<String>,
    #[serde(alias = "password")]
    pub password: Option<String>,
    #[serde(alias = "name")]
    pub name: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoginRequest {
    #[serde(alias = "email")]
    pub email: String,
    #[serde(alias = "password")]
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TokenDto {
    pub token: String,
    pub expires_at: chrono::NaiveDateTime,
    pub user: UserDto,
}

#[derive(Clone)]
pub struct IdentityService {
    db: DatabaseConnection,
    token_ttl_hours: i64,
    bootstrap_admin_email: Option<String>,
}

impl IdentityService {
    pub fn new(
        db: DatabaseConnection,
        token_ttl_hours: i64,
        bootstrap_admin_email: Option<String>,
    ) -> Self {
        Self {
            db,
            token_ttl_hours,
            bootstrap_admin_email: bootstrap_admin_email.map(|e| e.trim().to_lowercase()),
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> ServiceResult<UserDto> {
        let mut checks = Checks::default();
        let email = checks.required("Email", request.email.as_deref()).to_lowercase();
        let password = request.password.unwrap_or_default();
        let name = checks.required("Name", request.name.as_deref()).to_string();
        checks.check(email.is_empty() || email.contains('@'), "Email is not valid");
        checks.check(password.len() >= 8, "Password must be at least 8 characters");
        checks.finish()?;

        let taken = user::Entity::find()
            .filter(user::Column::Email.eq(email.as_str()))
            .one(&self.db)
            .await?;
        if taken.is_some() {
            tracing::Span::current().record("error", "duplicate_email");
            return Err(ServiceError::validation("Email already exists"));
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|_| ServiceError::validation("Failed to hash password"))?
            .to_string();

        let role = if self.bootstrap_admin_email.as_deref() == Some(email.as_str()) {
            permissions::ROLE_ADMIN
        } else {
            permissions::ROLE_PARENT
        };
        let model = user::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            email: Set(email),
            password_hash: Set(password_hash),
            name: Set(name),
            role: Set(role.to_string()),
            created_at: Set(now()),
        }
        .insert(&self.db)
        .await?;

        tracing::Span::current()
            .record("table", "users")
            .record("action", "register_user")
            .record("user_id", model.id.as_str());
        metrics::counter!("schoolhub_users_registered_total").increment(1);
        Ok(model.into())
    }

    /// `Ok(None)` when the credentials do not match a user.
    pub async fn login(&self, request: LoginRequest) -> ServiceResult<Option<TokenDto>> {
        let found = user::Entity::find()
            .filter(user::Column::Email.eq(request.email.trim().to_lowercase()))
            .one(&self.db)
            .await?;
        let Some(user) = found else {
            return Ok(None);
        };
        let Ok(parsed_hash) = PasswordHash::new(&user.password_hash) else {
            tracing::error!(user_id = %user.id, "stored password hash is unreadable");
            return Ok(None);
        };
        if Argon2::default()
            .verify_password(request.password.as_bytes(), &parsed_hash)
            .is_err()
        {
            return Ok(None);
        }

        let issued = now();
        let expires_at = issued + Duration::hours(self.token_ttl_hours);
        let token = user_token::ActiveModel {
            token: Set(format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())),
            user_id: Set(user.id.clone()),
            expires_at: Set(expires_at),
            created_at: Set(issued),
        }
        .insert(&self.db)
        .await?;

        tracing::Span::current()
            .record("table", "user_tokens")
            .record("action", "login_user")
            .record("user_id", user.id.as_str());
        Ok(Some(TokenDto {
            token: token.token,
            expires_at,
            user: user.into(),
        }))
    }

    /// Resolves a bearer token. Expired and unknown tokens resolve to `None`.
    pub async fn authenticate(&self, token: &str) -> ServiceResult<Option<CurrentUser>> {
        let found = user_token::Entity::find_by_id(token.to_string())
            .find_also_related(user::Entity)
            .one(&self.db)
            .await?;
        Ok(match found {
            Some((token, Some(user))) if token.expires_at > now() => Some(CurrentUser {
                id: user.id,
                email: user.email,
                name: user.name,
                role: user.role,
            }),
            _ => None,
        })
    }

    pub async fn logout(&self, token: &str) -> ServiceResult<()> {
        user_token::Entity::delete_by_id(token.to_string())
            .exec(&self.db)
            .await?;
        Ok(())
    }

    pub async fn set_role(&self, user_id: &str, role: &str) -> ServiceResult<UserDto> {
        if !permissions::is_known_role(role) {
            return Err(ServiceError::validation(format!("Unknown role {role}")));
        }
        let existing = repository::get::<user::Entity, _>(&self.db, user_id, "User").await?;
        let mut active = existing.into_active_model();
        active.role = Set(role.to_string());
        let model = active.update(&self.db).await?;
        tracing::info!(user_id = %model.id, role = %model.role, "user role changed");
        Ok(model.into())
    }
}
