//! Transactional email client
//!
//! Sends rendered emails through a Resend-compatible HTTP API. With
//! `email.enabled = false` nothing leaves the process; the message is logged
//! and reported as delivered without a provider id.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::email::RenderedEmail;

use crate::config::EmailConfig;
use crate::error::{AppError, AppResult};

/// Email API client
#[derive(Clone)]
pub struct EmailClient {
    client: Client,
    api_key: String,
    base_url: String,
    from_address: String,
    enabled: bool,
}

/// Outcome of a successful send
#[derive(Debug, Clone, PartialEq)]
pub struct EmailReceipt {
    /// Message id assigned by the provider; `None` when sending is disabled
    pub provider_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: String,
}

impl EmailClient {
    pub fn new(config: &EmailConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            base_url: config.api_endpoint.trim_end_matches('/').to_string(),
            from_address: config.from_address.clone(),
            enabled: config.enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Send one email to one recipient
    pub async fn send(&self, to: &str, email: &RenderedEmail) -> AppResult<EmailReceipt> {
        if !self.enabled {
            tracing::info!(
                to = %to,
                subject = %email.subject,
                "Email sending disabled, not delivering"
            );
            return Ok(EmailReceipt { provider_id: None });
        }

        let request = SendEmailRequest {
            from: &self.from_address,
            to: [to],
            subject: &email.subject,
            html: &email.html,
            text: &email.text,
        };

        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::EmailDelivery(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::EmailDelivery(format!("{} - {}", status, body)));
        }

        let data: SendEmailResponse = response
            .json()
            .await
            .map_err(|e| AppError::EmailDelivery(format!("unexpected response: {}", e)))?;

        tracing::debug!(to = %to, provider_id = %data.id, "Email delivered");

        Ok(EmailReceipt {
            provider_id: Some(data.id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;

    fn email() -> RenderedEmail {
        RenderedEmail {
            subject: "Reminder: Mow on Saturday, June 1".to_string(),
            html: "<p>Mow</p>".to_string(),
            text: "Mow".to_string(),
        }
    }

    #[test]
    fn test_disabled_client_does_not_send() {
        let client = EmailClient::new(&test_config().email);
        assert!(!client.is_enabled());

        let receipt = tokio_test::block_on(client.send("owner@example.com", &email())).unwrap();
        assert_eq!(receipt, EmailReceipt { provider_id: None });
    }

    #[test]
    fn test_request_body_shape() {
        let rendered = email();
        let request = SendEmailRequest {
            from: "LawnSync <n@lawnsync.test>",
            to: ["owner@example.com"],
            subject: &rendered.subject,
            html: &rendered.html,
            text: &rendered.text,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["to"][0], "owner@example.com");
        assert_eq!(value["subject"], "Reminder: Mow on Saturday, June 1");
    }
}
