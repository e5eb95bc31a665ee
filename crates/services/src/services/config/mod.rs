use std::path::PathBuf;

use thiserror::Error;

mod schema;

pub use schema::{
    AuthConfig, CURRENT_CONFIG_VERSION, Config, EmailConfig, EmailProvider, NotificationConfig,
    SmtpConfig,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Will always return config, falling back to defaults on missing/invalid files.
pub async fn load_config_from_file(config_path: &PathBuf) -> Config {
    match tokio::fs::read_to_string(config_path).await {
        Ok(raw_config) => Config::from_raw(&raw_config),
        Err(err) => {
            if err.kind() == std::io::ErrorKind::NotFound {
                tracing::info!("No config file found, creating one");
            } else {
                tracing::warn!("Failed to read config file: {}", err);
            }
            Config::default()
        }
    }
}

/// Saves the config to the given path
pub async fn save_config_to_file(
    config: &Config,
    config_path: &PathBuf,
) -> Result<(), ConfigError> {
    let normalized = config.clone().normalized();
    let raw_config = serde_json::to_string_pretty(&normalized)?;
    tokio::fs::write(config_path, raw_config).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_yields_defaults_and_save_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = load_config_from_file(&path).await;
        assert_eq!(config.app_url, "http://localhost:3000");

        let mut config = config;
        config.notifications.upcoming_enabled = true;
        config.email.provider = EmailProvider::Smtp;
        save_config_to_file(&config, &path).await.unwrap();

        let reloaded = load_config_from_file(&path).await;
        assert!(reloaded.notifications.upcoming_enabled);
        assert_eq!(reloaded.email.provider, EmailProvider::Smtp);
    }
}
