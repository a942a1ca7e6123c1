use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
};
use thiserror::Error;

use crate::config;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("SMTP transport not configured")]
    NotConfigured,

    #[error("Invalid mail address or message: {0}")]
    Invalid(String),

    #[error("SMTP send failed: {0}")]
    Transport(String),
}

/// Plain-text outbound mail
#[derive(Debug, Clone)]
pub struct Mail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Send through the configured SMTP relay. In development with no SMTP host
/// the message is logged instead, so password-reset flows stay testable.
pub async fn send(mail: Mail) -> Result<(), MailError> {
    let smtp = &config::config().smtp;

    if smtp.host.is_empty() {
        if crate::is_development!() {
            tracing::info!(to = %mail.to, subject = %mail.subject, body = %mail.body, "SMTP not configured, logging mail instead");
            return Ok(());
        }
        return Err(MailError::NotConfigured);
    }

    let from = format!("{} <{}>", smtp.from_name, smtp.from_email);
    let message = lettre::Message::builder()
        .from(from.parse().map_err(|e| MailError::Invalid(format!("{e}")))?)
        .to(mail
            .to
            .parse()
            .map_err(|e| MailError::Invalid(format!("{e}")))?)
        .subject(mail.subject)
        .header(ContentType::TEXT_PLAIN)
        .body(mail.body)
        .map_err(|e| MailError::Invalid(e.to_string()))?;

    let mut transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)
        .map_err(|e| MailError::Transport(e.to_string()))?
        .port(smtp.port);

    if !smtp.username.is_empty() {
        transport = transport.credentials(Credentials::new(
            smtp.username.clone(),
            smtp.password.clone(),
        ));
    }

    transport
        .build()
        .send(message)
        .await
        .map_err(|e| MailError::Transport(e.to_string()))?;

    Ok(())
}
