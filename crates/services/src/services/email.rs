use std::sync::Arc;

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use thiserror::Error;

use super::config::{EmailConfig, EmailProvider};

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Email transport misconfigured: {0}")]
    Config(String),
    #[error("Invalid email address: {0}")]
    Address(String),
    #[error("Failed to build email: {0}")]
    Message(String),
    #[error("SMTP delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("Email API request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Email API rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), TransportError>;
}

pub type SharedTransport = Arc<dyn EmailTransport>;

/// Builds the transport selected in the configuration.
pub fn transport_from_config(config: &EmailConfig) -> Result<SharedTransport, TransportError> {
    let transport: SharedTransport = match config.provider {
        EmailProvider::Log => Arc::new(LogTransport),
        EmailProvider::Smtp => Arc::new(SmtpTransport::new(config)?),
        EmailProvider::Resend => {
            let api_key = config
                .resend_api_key
                .clone()
                .ok_or_else(|| TransportError::Config("missing Resend API key".to_string()))?;
            Arc::new(ResendTransport::new(
                config.from.clone(),
                SecretString::from(api_key),
            ))
        }
    };
    tracing::info!(provider = %config.provider, "email transport ready");
    Ok(transport)
}

/// Development transport: the message is logged and counted as delivered.
pub struct LogTransport;

#[async_trait]
impl EmailTransport for LogTransport {
    async fn send(&self, message: &EmailMessage) -> Result<(), TransportError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            "email not sent, log transport in use"
        );
        tracing::debug!(body = %message.text, "email body");
        Ok(())
    }
}

pub struct SmtpTransport {
    from: Mailbox,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpTransport {
    pub fn new(config: &EmailConfig) -> Result<Self, TransportError> {
        let smtp = &config.smtp;
        let host = smtp
            .host
            .as_deref()
            .ok_or_else(|| TransportError::Config("missing SMTP host".to_string()))?;
        let from = parse_mailbox(&config.from)?;

        let builder = if smtp.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
        };
        let mut builder = builder.port(smtp.port);
        if let (Some(user), Some(password)) = (&smtp.user, &smtp.password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        Ok(Self {
            from,
            mailer: builder.build(),
        })
    }
}

#[async_trait]
impl EmailTransport for SmtpTransport {
    async fn send(&self, message: &EmailMessage) -> Result<(), TransportError> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(parse_mailbox(&message.to)?)
            .subject(message.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                message.text.clone(),
                message.html.clone(),
            ))
            .map_err(|err| TransportError::Message(err.to_string()))?;

        self.mailer.send(email).await?;
        Ok(())
    }
}

#[derive(Serialize)]
struct ResendPayload<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

pub struct ResendTransport {
    client: reqwest::Client,
    from: String,
    api_key: SecretString,
    endpoint: String,
}

impl ResendTransport {
    pub fn new(from: String, api_key: SecretString) -> Self {
        Self {
            client: reqwest::Client::new(),
            from,
            api_key,
            endpoint: RESEND_ENDPOINT.to_string(),
        }
    }
}

#[async_trait]
impl EmailTransport for ResendTransport {
    async fn send(&self, message: &EmailMessage) -> Result<(), TransportError> {
        let payload = ResendPayload {
            from: &self.from,
            to: [&message.to],
            subject: &message.subject,
            html: &message.html,
            text: &message.text,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, TransportError> {
    address
        .parse::<Mailbox>()
        .map_err(|_| TransportError::Address(address.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::config::SmtpConfig;

    #[tokio::test]
    async fn log_transport_always_succeeds() {
        let message = EmailMessage {
            to: "ada@example.com".to_string(),
            subject: "Hello".to_string(),
            html: "<p>Hello</p>".to_string(),
            text: "Hello".to_string(),
        };
        assert!(LogTransport.send(&message).await.is_ok());
    }

    #[test]
    fn incomplete_provider_configs_are_rejected() {
        let config = EmailConfig {
            provider: EmailProvider::Resend,
            ..Default::default()
        };
        assert!(matches!(
            transport_from_config(&config),
            Err(TransportError::Config(_))
        ));

        let config = EmailConfig {
            provider: EmailProvider::Smtp,
            smtp: SmtpConfig::default(),
            ..Default::default()
        };
        assert!(matches!(
            transport_from_config(&config),
            Err(TransportError::Config(_))
        ));
    }

    #[test]
    fn mailbox_parsing_accepts_display_names() {
        assert!(parse_mailbox("Todo App <noreply@todoapp.com>").is_ok());
        assert!(matches!(
            parse_mailbox("not an address"),
            Err(TransportError::Address(_))
        ));
    }
}
