//! Email Delivery
//!
//! Sends verification codes over SMTP. With no SMTP host configured the
//! mailer runs in no-op mode and only logs, which keeps local development
//! usable without mail infrastructure.

use async_trait::async_trait;
use lettre::message::{header, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::EmailSettings;

/// Mail delivery errors
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Email configuration error: {0}")]
    Configuration(String),

    #[error("Invalid recipient address: {0}")]
    InvalidRecipient(String),

    #[error("Email delivery failed: {0}")]
    Delivery(String),
}

/// Delivers one-time verification codes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OtpMailer: Send + Sync {
    /// Send `code` to `recipient`, valid for `ttl_minutes`.
    async fn send_otp(&self, recipient: &str, code: &str, ttl_minutes: i64)
        -> Result<(), MailError>;
}

/// SMTP mailer (or no-op when no host is configured)
#[derive(Clone)]
pub struct SmtpMailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build the mailer from configuration.
    pub fn new(settings: &EmailSettings) -> Result<Self, MailError> {
        let from = settings
            .from
            .parse::<Mailbox>()
            .map_err(|e| MailError::Configuration(format!("Invalid sender address: {}", e)))?;

        let transport = if settings.smtp_host.trim().is_empty() {
            tracing::warn!("SMTP host not configured; OTP mails will only be logged");
            None
        } else {
            let builder = if settings.use_starttls {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_host)
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.smtp_host)
            }
            .map_err(|e| MailError::Configuration(format!("SMTP transport: {}", e)))?
            .port(settings.smtp_port);

            let builder = match (&settings.smtp_username, &settings.smtp_password) {
                (Some(user), Some(pass)) => {
                    builder.credentials(Credentials::new(user.clone(), pass.clone()))
                }
                _ => builder,
            };

            Some(builder.build())
        };

        Ok(Self { transport, from })
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }
}

#[async_trait]
impl OtpMailer for SmtpMailer {
    async fn send_otp(
        &self,
        recipient: &str,
        code: &str,
        ttl_minutes: i64,
    ) -> Result<(), MailError> {
        let Some(transport) = &self.transport else {
            tracing::info!(
                recipient,
                otp = code,
                "Mailer in no-op mode; OTP not delivered"
            );
            return Ok(());
        };

        let to = recipient
            .parse::<Mailbox>()
            .map_err(|e| MailError::InvalidRecipient(e.to_string()))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject("Email Verification OTP")
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(otp_text(code, ttl_minutes)),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(otp_html(code, ttl_minutes)),
                    ),
            )
            .map_err(|e| MailError::Delivery(format!("Failed to build message: {}", e)))?;

        transport
            .send(email)
            .await
            .map_err(|e| MailError::Delivery(e.to_string()))?;

        tracing::info!(recipient, "OTP email sent");
        Ok(())
    }
}

fn otp_text(code: &str, ttl_minutes: i64) -> String {
    format!(
        "Email Verification\n\nYour OTP is: {}\n\nThis OTP is valid for {} minutes.",
        code, ttl_minutes
    )
}

fn otp_html(code: &str, ttl_minutes: i64) -> String {
    format!(
        r#"<div style="font-family: Arial, sans-serif;">
  <h2>Email Verification</h2>
  <p>Your OTP is:</p>
  <h1>{code}</h1>
  <p>This OTP is valid for <b>{ttl_minutes} minutes</b>.</p>
</div>"#
    )
}
