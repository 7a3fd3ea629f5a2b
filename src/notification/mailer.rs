use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;
use tracing::info;

use crate::config::{MailConfig, Secrets};
use crate::errors::{ConfigError, MailError};
use crate::traits::Mailer;
use crate::watch::WatchRule;

use super::email::EmailMessage;

/// SMTP delivery through lettre.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig, secrets: &Secrets) -> Result<Self, ConfigError> {
        let sender = config
            .default_sender
            .as_deref()
            .ok_or_else(|| ConfigError::ValidationError {
                reason: "mail.default_sender (or MAIL_DEFAULT_SENDER) is not set".to_string(),
            })
            .and_then(|sender| {
                parse_mailbox(sender).map_err(|e| ConfigError::ValidationError {
                    reason: e.to_string(),
                })
            })?;

        let mut builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server).map_err(|e| {
                ConfigError::ValidationError {
                    reason: format!("cannot use TLS with {}: {}", config.server, e),
                }
            })?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.server)
        };
        builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout_sec)));

        if let (Some(username), Some(password)) = (&secrets.mail_username, &secrets.mail_password)
        {
            builder = builder.credentials(Credentials::new(
                username.clone(),
                password.expose_secret().clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            sender,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let email = build_message(&self.sender, message)?;
        self.transport.send(email).await?;

        info!(
            "Sent \"{}\" to {}",
            message.subject,
            message.recipients.join(", ")
        );
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .parse::<Mailbox>()
        .map_err(|source| MailError::InvalidAddress {
            address: address.to_string(),
            source,
        })
}

/// Every recipient of every rule must parse as a mailbox.
pub fn validate_recipients(rules: &[WatchRule]) -> Result<(), ConfigError> {
    for rule in rules {
        for recipient in rule.recipients() {
            parse_mailbox(recipient).map_err(|e| ConfigError::ValidationError {
                reason: format!("watch rule {}: {}", rule.key(), e),
            })?;
        }
    }
    Ok(())
}

/// Plain-text message from `sender` to every recipient.
pub fn build_message(sender: &Mailbox, message: &EmailMessage) -> Result<Message, MailError> {
    let mut builder = Message::builder()
        .from(sender.clone())
        .subject(message.subject.as_str())
        .header(ContentType::TEXT_PLAIN);

    for recipient in &message.recipients {
        builder = builder.to(parse_mailbox(recipient)?);
    }

    Ok(builder.body(message.body.clone())?)
}
