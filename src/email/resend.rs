use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::metrics::UpstreamMetrics;

use super::{EmailContent, EmailError, EmailSender};

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

/// Resend HTTP API sender
pub struct ResendSender {
    client: reqwest::Client,
    emails_url: String,
    api_key: String,
    from: String,
}

impl ResendSender {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        from: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            emails_url: format!("{}/emails", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            from: from.into(),
        })
    }
}

#[async_trait]
impl EmailSender for ResendSender {
    #[tracing::instrument(name = "email.send", skip_all, fields(subject = %content.subject))]
    async fn send(&self, to: &str, content: &EmailContent) -> Result<(), EmailError> {
        let request = SendEmailRequest {
            from: &self.from,
            to: [to],
            subject: &content.subject,
            html: &content.html,
            text: &content.text,
        };

        let response = self
            .client
            .post(&self.emails_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                UpstreamMetrics::record_failure("email");
                EmailError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            UpstreamMetrics::record_failure("email");
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), body = %detail, "Email provider rejected message");
            return Err(EmailError::Rejected {
                status: status.as_u16(),
            });
        }

        UpstreamMetrics::record_success("email");
        tracing::info!("Support email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = SendEmailRequest {
            from: "Waylo Support <support@waylo.app>",
            to: ["ana@example.com"],
            subject: "Ticket Resolved: Refund",
            html: "<p>hi</p>",
            text: "hi",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["to"][0], "ana@example.com");
        assert_eq!(json["from"], "Waylo Support <support@waylo.app>");
        assert_eq!(json["text"], "hi");
    }

    #[tokio::test]
    async fn test_unreachable_provider() {
        let sender = ResendSender::new(
            "http://127.0.0.1:9",
            "key",
            "support@waylo.app",
            Duration::from_millis(200),
        )
        .unwrap();
        let content = EmailContent {
            subject: "s".to_string(),
            html: "h".to_string(),
            text: "t".to_string(),
        };
        assert!(matches!(
            sender.send("a@example.com", &content).await,
            Err(EmailError::Transport(_))
        ));
    }
}
