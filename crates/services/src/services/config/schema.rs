use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

use super::ConfigError;

pub const CURRENT_CONFIG_VERSION: &str = "v1";

pub const APP_URL_ENV: &str = "APP_URL";
pub const CRON_SECRET_ENV: &str = "CRON_SECRET";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const EMAIL_SERVICE_ENV: &str = "EMAIL_SERVICE";
pub const EMAIL_FROM_ENV: &str = "EMAIL_FROM";
pub const RESEND_API_KEY_ENV: &str = "RESEND_API_KEY";
pub const SMTP_HOST_ENV: &str = "SMTP_HOST";
pub const SMTP_PORT_ENV: &str = "SMTP_PORT";
pub const SMTP_SECURE_ENV: &str = "SMTP_SECURE";
pub const SMTP_USER_ENV: &str = "SMTP_USER";
pub const SMTP_PASSWORD_ENV: &str = "SMTP_PASSWORD";
pub const NOTIFICATION_INTERVAL_ENV: &str = "NOTIFICATION_INTERVAL_SECS";

fn default_app_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_from_address() -> String {
    "Todo App <noreply@todoapp.com>".to_string()
}

fn default_token_ttl_hours() -> i64 {
    24 * 7
}

fn default_smtp_port() -> u16 {
    587
}

fn default_interval_secs() -> u64 {
    60 * 60
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, EnumString, Display, Default)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EmailProvider {
    /// Writes messages to the log instead of sending them.
    #[default]
    Log,
    Smtp,
    Resend,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(default)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: u16,
    /// Implicit TLS. When false the connection is upgraded with STARTTLS.
    pub secure: bool,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: default_smtp_port(),
            secure: false,
            user: None,
            password: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(default)]
pub struct EmailConfig {
    pub provider: EmailProvider,
    pub from: String,
    #[serde(alias = "resendApiKey")]
    pub resend_api_key: Option<String>,
    pub smtp: SmtpConfig,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            provider: EmailProvider::Log,
            from: default_from_address(),
            resend_api_key: None,
            smtp: SmtpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(default)]
pub struct AuthConfig {
    #[serde(alias = "jwtSecret")]
    pub jwt_secret: Option<String>,
    #[serde(alias = "tokenTtlHours")]
    pub token_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_hours: default_token_ttl_hours(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(default)]
pub struct NotificationConfig {
    /// Runs the overdue scan on a timer inside the server process.
    pub enabled: bool,
    #[serde(alias = "intervalSecs")]
    pub interval_secs: u64,
    #[serde(alias = "upcomingEnabled")]
    pub upcoming_enabled: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_interval_secs(),
            upcoming_enabled: false,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, TS)]
#[serde(default)]
pub struct Config {
    #[serde(alias = "configVersion")]
    pub config_version: String,
    #[serde(alias = "appUrl")]
    pub app_url: String,
    #[serde(alias = "cronSecret")]
    pub cron_secret: Option<String>,
    pub auth: AuthConfig,
    pub email: EmailConfig,
    pub notifications: NotificationConfig,
}

impl Config {
    pub fn from_raw(raw_config: &str) -> Self {
        match serde_json::from_str::<Config>(raw_config) {
            Ok(config) => config.normalized(),
            Err(e) => {
                tracing::warn!(
                    "Failed to parse config (line {}, column {}): {}, using default",
                    e.line(),
                    e.column(),
                    e
                );
                Self::default()
            }
        }
    }

    pub fn normalized(mut self) -> Self {
        self.config_version = CURRENT_CONFIG_VERSION.to_string();

        let app_url = self.app_url.trim().trim_end_matches('/');
        self.app_url = if app_url.is_empty() {
            default_app_url()
        } else {
            app_url.to_string()
        };

        if self.email.from.trim().is_empty() {
            self.email.from = default_from_address();
        }

        for value in [
            &mut self.cron_secret,
            &mut self.auth.jwt_secret,
            &mut self.email.resend_api_key,
            &mut self.email.smtp.host,
            &mut self.email.smtp.user,
            &mut self.email.smtp.password,
        ] {
            if matches!(value.as_deref(), Some(v) if v.trim().is_empty()) {
                *value = None;
            }
        }

        if self.auth.token_ttl_hours <= 0 {
            tracing::warn!(
                "Invalid token TTL '{}', resetting to default",
                self.auth.token_ttl_hours
            );
            self.auth.token_ttl_hours = default_token_ttl_hours();
        }

        if self.notifications.interval_secs == 0 {
            self.notifications.interval_secs = default_interval_secs();
        }

        self
    }

    /// Applies process environment overrides on top of the file values.
    pub fn with_env_overrides(self) -> Self {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(url) = lookup(APP_URL_ENV) {
            self.app_url = url;
        }
        if let Some(secret) = lookup(CRON_SECRET_ENV) {
            self.cron_secret = Some(secret);
        }
        if let Some(secret) = lookup(JWT_SECRET_ENV) {
            self.auth.jwt_secret = Some(secret);
        }
        if let Some(provider) = lookup(EMAIL_SERVICE_ENV) {
            match provider.trim().parse::<EmailProvider>() {
                Ok(provider) => self.email.provider = provider,
                Err(_) => tracing::warn!("Unknown email service '{}', ignoring", provider),
            }
        }
        if let Some(from) = lookup(EMAIL_FROM_ENV) {
            self.email.from = from;
        }
        if let Some(key) = lookup(RESEND_API_KEY_ENV) {
            self.email.resend_api_key = Some(key);
        }
        if let Some(host) = lookup(SMTP_HOST_ENV) {
            self.email.smtp.host = Some(host);
        }
        if let Some(port) = lookup(SMTP_PORT_ENV) {
            match port.trim().parse::<u16>() {
                Ok(port) => self.email.smtp.port = port,
                Err(_) => tracing::warn!("Invalid SMTP port '{}', ignoring", port),
            }
        }
        if let Some(secure) = lookup(SMTP_SECURE_ENV) {
            self.email.smtp.secure = matches!(secure.trim(), "true" | "1" | "yes");
        }
        if let Some(user) = lookup(SMTP_USER_ENV) {
            self.email.smtp.user = Some(user);
        }
        if let Some(password) = lookup(SMTP_PASSWORD_ENV) {
            self.email.smtp.password = Some(password);
        }
        if let Some(interval) = lookup(NOTIFICATION_INTERVAL_ENV) {
            match interval.trim().parse::<u64>() {
                Ok(secs) => self.notifications.interval_secs = secs,
                Err(_) => tracing::warn!("Invalid notification interval '{}', ignoring", interval),
            }
        }

        self.normalized()
    }

    /// Checks that the selected email provider has what it needs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.email.provider {
            EmailProvider::Log => {}
            EmailProvider::Smtp => {
                if self.email.smtp.host.is_none() {
                    return Err(ConfigError::ValidationError(
                        "SMTP email provider requires smtp.host".to_string(),
                    ));
                }
                if self.email.smtp.user.is_some() != self.email.smtp.password.is_some() {
                    return Err(ConfigError::ValidationError(
                        "SMTP credentials need both user and password".to_string(),
                    ));
                }
            }
            EmailProvider::Resend => {
                if self.email.resend_api_key.is_none() {
                    return Err(ConfigError::ValidationError(
                        "Resend email provider requires an API key".to_string(),
                    ));
                }
            }
        }
        if !self.app_url.starts_with("http://") && !self.app_url.starts_with("https://") {
            return Err(ConfigError::ValidationError(format!(
                "app_url must be an http(s) URL, got '{}'",
                self.app_url
            )));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: CURRENT_CONFIG_VERSION.to_string(),
            app_url: default_app_url(),
            cron_secret: None,
            auth: AuthConfig::default(),
            email: EmailConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_apply_for_empty_config() {
        let config = Config::from_raw("{}");

        assert_eq!(config.config_version, CURRENT_CONFIG_VERSION);
        assert_eq!(config.app_url, default_app_url());
        assert_eq!(config.email.provider, EmailProvider::Log);
        assert_eq!(config.email.smtp.port, 587);
        assert!(config.notifications.enabled);
        assert!(!config.notifications.upcoming_enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_json_falls_back_to_default() {
        let config = Config::from_raw("{invalid json");

        assert_eq!(config.config_version, CURRENT_CONFIG_VERSION);
        assert_eq!(config.auth.token_ttl_hours, default_token_ttl_hours());
    }

    #[test]
    fn aliases_and_normalization_are_applied() {
        let raw = r#"{
            "configVersion": "v0",
            "appUrl": "https://todo.example.com/",
            "cronSecret": "  ",
            "auth": { "tokenTtlHours": -3 }
        }"#;

        let config = Config::from_raw(raw);

        assert_eq!(config.config_version, CURRENT_CONFIG_VERSION);
        assert_eq!(config.app_url, "https://todo.example.com");
        assert!(config.cron_secret.is_none());
        assert_eq!(config.auth.token_ttl_hours, default_token_ttl_hours());
    }

    #[test]
    fn env_overrides_win_over_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            (EMAIL_SERVICE_ENV, "SMTP"),
            (SMTP_HOST_ENV, "smtp.example.com"),
            (SMTP_PORT_ENV, "465"),
            (SMTP_SECURE_ENV, "true"),
            (CRON_SECRET_ENV, "s3cret"),
            (SMTP_USER_ENV, ""),
        ]);
        let config =
            Config::default().apply_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.email.provider, EmailProvider::Smtp);
        assert_eq!(config.email.smtp.host.as_deref(), Some("smtp.example.com"));
        assert_eq!(config.email.smtp.port, 465);
        assert!(config.email.smtp.secure);
        assert!(config.email.smtp.user.is_none());
        assert_eq!(config.cron_secret.as_deref(), Some("s3cret"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_incomplete_providers() {
        let mut config = Config::default();
        config.email.provider = EmailProvider::Resend;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));

        config.email.provider = EmailProvider::Smtp;
        config.email.smtp.host = Some("smtp.example.com".to_string());
        config.email.smtp.user = Some("mailer".to_string());
        assert!(config.validate().is_err());
    }
}
