use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Duration;
use db::{
    DatabaseConnection,
    models::user::{CreateUser, User, UserSummary},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utils::jwt::{AccessClaims, TokenKeys};
use uuid::Uuid;
use validator::Validate;

use super::{
    error::ServiceError,
    validation::{LoginRequest, RegisterRequest},
};

/// Identity of the caller, resolved from the bearer token for every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CurrentUser {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

impl From<&CurrentUser> for UserSummary {
    fn from(user: &CurrentUser) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| ServiceError::Unknown(format!("password hashing failed: {err}")))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

async fn run_blocking<T, F>(task: F) -> Result<T, ServiceError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| ServiceError::Unknown(err.to_string()))
}

#[derive(Clone)]
pub struct AuthService {
    db: DatabaseConnection,
    keys: TokenKeys,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(db: DatabaseConnection, jwt_secret: &SecretString, token_ttl: Duration) -> Self {
        Self {
            db,
            keys: TokenKeys::from_secret(jwt_secret.expose_secret().as_bytes()),
            token_ttl,
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<User, ServiceError> {
        request.validate()?;
        if User::find_by_email(&self.db, &request.email).await?.is_some() {
            return Err(ServiceError::Conflict("Email already in use".to_string()));
        }

        let password = request.password;
        let password_hash = run_blocking(move || hash_password(&password)).await??;
        let name = request
            .name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        let user = User::create(
            &self.db,
            &CreateUser {
                name,
                email: request.email,
                password_hash,
            },
        )
        .await
        .map_err(|err| match ServiceError::from(err) {
            ServiceError::Conflict(_) => ServiceError::Conflict("Email already in use".to_string()),
            other => other,
        })?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, ServiceError> {
        request.validate()?;
        let Some((user, hash)) = User::find_with_password_hash(&self.db, &request.email).await?
        else {
            tracing::warn!("login attempt for unknown email");
            return Err(ServiceError::Unauthorized);
        };

        let password = request.password;
        let valid = run_blocking(move || verify_password(&password, &hash)).await?;
        if !valid {
            tracing::warn!(user_id = %user.id, "login attempt with invalid password");
            return Err(ServiceError::Unauthorized);
        }

        let claims = AccessClaims::new(user.id, &user.email, self.token_ttl);
        let token = self
            .keys
            .issue(&claims)
            .map_err(|err| ServiceError::Unknown(err.to_string()))?;
        Ok(LoginResponse { token, user })
    }

    /// Resolves a bearer token to the user it was issued for.
    pub async fn current_user(&self, token: &str) -> Result<CurrentUser, ServiceError> {
        let claims = self.keys.verify(token).map_err(|err| {
            tracing::debug!(error = %err, "rejected access token");
            ServiceError::Unauthorized
        })?;
        let user_id = claims.user_id().map_err(|_| ServiceError::Unauthorized)?;
        let user = User::find_by_id(&self.db, user_id)
            .await?
            .ok_or(ServiceError::Unauthorized)?;
        Ok(user.into())
    }
}
