use crate::{config::MailSettings, utils::error::AppError};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// Outbound notification channel used by the SOS dispatcher.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), AppError>;
}

/// Sends through a JSON transactional mail API
/// (`POST {api_url}` with `{from, to, subject, text}` and a bearer key).
pub struct HttpMailer {
    client: reqwest::Client,
    settings: MailSettings,
}

impl HttpMailer {
    pub fn new(settings: MailSettings, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, settings })
    }
}

#[derive(Serialize)]
struct MailPayload<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
}

#[async_trait]
impl Notifier for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), AppError> {
        let payload = MailPayload {
            from: &self.settings.from,
            to: [message.to.as_str()],
            subject: &message.subject,
            text: &message.text,
        };

        let response = self
            .client
            .post(&self.settings.api_url)
            .bearer_auth(&self.settings.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalError(format!(
                "Mail API error {}: {}",
                status, body
            )));
        }

        log::debug!("📧 Email sent to {}", message.to);
        Ok(())
    }
}

/// Used when no mail API is configured: messages only go to the log.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<(), AppError> {
        log::info!(
            "📧 [mail disabled] to={} subject=\"{}\"",
            message.to,
            message.subject
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_notifier_always_succeeds() {
        let message = EmailMessage {
            to: "donor@example.com".into(),
            subject: "s".into(),
            text: "t".into(),
        };
        assert!(LogNotifier.send(&message).await.is_ok());
    }

    #[test]
    fn test_mail_payload_shape() {
        let payload = MailPayload {
            from: "HemoLink <no-reply@hemolink.app>",
            to: ["donor@example.com"],
            subject: "Urgent",
            text: "Hello",
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["to"][0], "donor@example.com");
        assert_eq!(json["from"], "HemoLink <no-reply@hemolink.app>");
    }
}
