use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::SmsConfig;

/// Itexmo broadcast client. One recipient per call; the platform sends
/// individual notices, not bulk campaigns.
#[derive(Clone)]
pub struct ItexmoSmsClient {
    base_url: String,
    api_code: String,
    email: String,
    password: String,
    sender_id: String,
    client: reqwest::Client,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SmsError {
    #[error("SMS API error: {0}")]
    ApiError(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("SMS gateway is not configured")]
    NotConfigured,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct BroadcastRequest<'a> {
    email: &'a str,
    password: &'a str,
    api_code: &'a str,
    recipients: Vec<&'a str>,
    message: &'a str,
    sender_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct BroadcastResponse {
    error: bool,
    message: Option<String>,
    reference_id: Option<String>,
}

impl ItexmoSmsClient {
    pub fn new(config: &SmsConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: config.base_url.clone(),
            api_code: config.api_code.clone(),
            email: config.email.clone(),
            password: config.password.clone(),
            sender_id: config.sender_id.clone(),
            client,
        }
    }

    /// Sends one SMS and returns the gateway reference id when it supplies
    /// one.
    pub async fn send(&self, recipient: &str, message: &str) -> Result<Option<String>, SmsError> {
        if self.api_code.is_empty() {
            return Err(SmsError::NotConfigured);
        }

        let request = BroadcastRequest {
            email: &self.email,
            password: &self.password,
            api_code: &self.api_code,
            recipients: vec![recipient],
            message,
            sender_id: &self.sender_id,
        };

        let response = self
            .client
            .post(format!("{}/broadcast", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| SmsError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SmsError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            return Err(SmsError::ApiError(format!("HTTP {status}: {body}")));
        }

        let parsed: BroadcastResponse =
            serde_json::from_str(&body).map_err(|e| SmsError::ParseError(e.to_string()))?;

        if parsed.error {
            return Err(SmsError::ApiError(
                parsed.message.unwrap_or_else(|| "broadcast rejected".to_string()),
            ));
        }

        Ok(parsed.reference_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_request_uses_gateway_field_names() {
        let request = BroadcastRequest {
            email: "ops@isp.test",
            password: "secret",
            api_code: "code",
            recipients: vec!["09170000000"],
            message: "hello",
            sender_id: "ISP",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["ApiCode"], "code");
        assert_eq!(json["Recipients"][0], "09170000000");
        assert_eq!(json["SenderId"], "ISP");
    }
}
