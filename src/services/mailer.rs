use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

const RESEND_API_URL: &str = "https://api.resend.com/emails";
const FROM_ADDRESS: &str = "Macrolog <macrolog@resend.dev>";

/// Outbound notification channel. Both warning and recap messages go through
/// the same plain-text send.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, subject: &str, body: &str) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct SendEmailRequest {
    from: String,
    to: Vec<String>,
    subject: String,
    text: String,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: Option<String>,
}

pub struct ResendMailer {
    client: Client,
    api_key: String,
    recipient: String,
}

impl ResendMailer {
    pub fn new(api_key: String, recipient: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            api_key,
            recipient,
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, subject: &str, body: &str) -> Result<()> {
        let request = SendEmailRequest {
            from: FROM_ADDRESS.to_string(),
            to: vec![self.recipient.clone()],
            subject: subject.to_string(),
            text: body.to_string(),
        };

        let response = self
            .client
            .post(RESEND_API_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AppError::MailerApi(format!("API error: {}", error_text)));
        }

        let email_response: SendEmailResponse = response.json().await?;
        tracing::debug!(
            "Sent email {:?} to {}: {}",
            email_response.id,
            self.recipient,
            subject
        );

        Ok(())
    }
}
