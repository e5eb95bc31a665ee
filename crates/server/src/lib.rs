use std::sync::Arc;

use chrono::Duration;
use db::{DBService, DbErr};
use rand::{Rng, distributions::Alphanumeric};
use secrecy::SecretString;
use services::services::{
    activity::ActivityRecorder,
    auth::AuthService,
    catalog::CatalogService,
    config::{Config, ConfigError, load_config_from_file, save_config_to_file},
    email::{SharedTransport, TransportError, transport_from_config},
    notification::OverdueNotifier,
    share::ShareService,
    todo::TodoService,
};
use thiserror::Error;
use tokio::sync::RwLock;
use utils::assets::{config_path, ensure_asset_dir};

pub mod error;
pub mod http;
pub mod routes;
pub mod scheduler;

#[derive(Debug, Error)]
pub enum AppStateError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Everything a request handler needs, cheap to clone.
#[derive(Clone)]
pub struct AppState {
    config: Arc<RwLock<Config>>,
    auth: AuthService,
    todos: TodoService,
    catalog: CatalogService,
    shares: ShareService,
    activity: ActivityRecorder,
    notifier: OverdueNotifier,
}

impl AppState {
    /// Loads `config.json` from the asset directory, applies env overrides,
    /// connects to the database and wires up the email transport.
    pub async fn new() -> Result<Self, AppStateError> {
        ensure_asset_dir()?;
        let path = config_path();
        let file_config = load_config_from_file(&path).await;
        if !path.exists() {
            save_config_to_file(&file_config, &path).await?;
        }
        let config = file_config.with_env_overrides();
        config.validate()?;

        let db = DBService::new().await?;
        let transport = transport_from_config(&config.email)?;
        Ok(Self::from_parts(db, config, transport))
    }

    pub fn from_parts(db: DBService, config: Config, transport: SharedTransport) -> Self {
        let jwt_secret = match config.auth.jwt_secret.clone() {
            Some(secret) => SecretString::from(secret),
            None => {
                tracing::warn!(
                    "No JWT secret configured, using a random one; tokens will not survive a restart"
                );
                SecretString::from(random_secret())
            }
        };
        let token_ttl = Duration::hours(config.auth.token_ttl_hours);

        let pool = db.pool;
        let activity = ActivityRecorder::new(pool.clone());
        Self {
            auth: AuthService::new(pool.clone(), &jwt_secret, token_ttl),
            todos: TodoService::new(pool.clone(), activity.clone()),
            catalog: CatalogService::new(pool.clone()),
            shares: ShareService::new(pool.clone(), activity.clone()),
            notifier: OverdueNotifier::new(pool, transport, activity.clone(), config.app_url.clone()),
            activity,
            config: Arc::new(RwLock::new(config)),
        }
    }

    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.config
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn todos(&self) -> &TodoService {
        &self.todos
    }

    pub fn catalog(&self) -> &CatalogService {
        &self.catalog
    }

    pub fn shares(&self) -> &ShareService {
        &self.shares
    }

    pub fn activity(&self) -> &ActivityRecorder {
        &self.activity
    }

    pub fn notifier(&self) -> &OverdueNotifier {
        &self.notifier
    }
}

fn random_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect()
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use db::DBService;
    use services::services::{config::Config, email::LogTransport};

    use super::AppState;

    pub async fn test_state(config: Config) -> AppState {
        let db = DBService::connect("sqlite::memory:").await.unwrap();
        AppState::from_parts(db, config, Arc::new(LogTransport))
    }
}

#[cfg(test)]
mod tests {
    use test_support::TestAssets;

    use super::*;

    #[tokio::test]
    async fn new_writes_default_config_and_honours_env() {
        let assets = TestAssets::new().unwrap();
        assets.env.set("CRON_SECRET", "from-env");
        assets.env.set("APP_URL", "https://todo.example.com/");

        let state = AppState::new().await.unwrap();

        let config = state.config().read().await;
        assert_eq!(config.cron_secret.as_deref(), Some("from-env"));
        assert_eq!(config.app_url, "https://todo.example.com");
        assert!(assets.path().join("config.json").exists());
        assert!(assets.path().join("db.sqlite").exists());
    }

    #[tokio::test]
    async fn new_rejects_incomplete_email_setup() {
        let assets = TestAssets::new().unwrap();
        assets.env.set("EMAIL_SERVICE", "resend");

        let err = AppState::new().await.err().expect("config error");
        assert!(matches!(err, AppStateError::Config(ConfigError::ValidationError(_))));
    }
}
