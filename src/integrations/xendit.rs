use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::XenditConfig;

/// Internal status a webhook event resolves to. Anything Xendit sends that
/// is not covered here is acknowledged and ignored.
pub const STATUS_PENDING: &str = "PENDING";
pub const STATUS_PAID: &str = "PAID";
pub const STATUS_EXPIRED: &str = "EXPIRED";
pub const STATUS_FAILED: &str = "FAILED";

#[derive(Clone)]
pub struct XenditClient {
    secret_key: String,
    callback_token: String,
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Clone)]
pub enum XenditError {
    ApiError(String),
    NetworkError(String),
    ParseError(String),
    NotConfigured,
}

impl std::fmt::Display for XenditError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiError(e) => write!(f, "Xendit API error: {e}"),
            Self::NetworkError(e) => write!(f, "Network error: {e}"),
            Self::ParseError(e) => write!(f, "Parse error: {e}"),
            Self::NotConfigured => write!(f, "Xendit is not configured"),
        }
    }
}

impl std::error::Error for XenditError {}

#[derive(Debug, Clone)]
pub struct CreateInvoiceParams {
    pub external_id: String,
    pub amount: f64,
    pub description: String,
    pub payer_email: Option<String>,
    pub success_redirect_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XenditInvoice {
    pub id: String,
    pub external_id: String,
    pub status: String,
    pub amount: f64,
    pub invoice_url: String,
    pub expiry_date: Option<String>,
}

/// Body Xendit POSTs to the invoice callback URL. Only the fields the
/// reconciliation flow reads are modeled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XenditWebhookPayload {
    pub id: Option<String>,
    pub external_id: String,
    pub status: String,
    pub amount: Option<f64>,
    pub paid_at: Option<String>,
    pub payment_channel: Option<String>,
    pub payment_method: Option<String>,
}

/// Maps a Xendit invoice status string to the internal payment status.
/// Returns `None` for statuses the flow does not act on.
pub fn map_webhook_status(status: &str) -> Option<&'static str> {
    match status.to_ascii_uppercase().as_str() {
        "PAID" | "SETTLED" => Some(STATUS_PAID),
        "EXPIRED" => Some(STATUS_EXPIRED),
        "FAILED" => Some(STATUS_FAILED),
        _ => None,
    }
}

impl XenditClient {
    pub fn new(config: &XenditConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            secret_key: config.secret_key.clone(),
            callback_token: config.callback_token.clone(),
            client,
            base_url: config.base_url.clone(),
        }
    }

    /// Shared-secret check for the inbound webhook. An unconfigured token
    /// rejects everything rather than accepting everything.
    pub fn verify_callback_token(&self, provided: &str) -> bool {
        !self.callback_token.is_empty() && self.callback_token == provided
    }

    pub async fn create_invoice(
        &self,
        params: CreateInvoiceParams,
    ) -> Result<XenditInvoice, XenditError> {
        if self.secret_key.is_empty() {
            return Err(XenditError::NotConfigured);
        }

        let mut body = serde_json::json!({
            "external_id": params.external_id,
            "amount": params.amount,
            "description": params.description,
            "currency": "PHP",
        });
        if let Some(email) = params.payer_email {
            body["payer_email"] = serde_json::Value::String(email);
        }
        if let Some(url) = params.success_redirect_url {
            body["success_redirect_url"] = serde_json::Value::String(url);
        }

        let response = self
            .client
            .post(format!("{}/v2/invoices", self.base_url))
            .basic_auth(&self.secret_key, Option::<&str>::None)
            .json(&body)
            .send()
            .await
            .map_err(|e| XenditError::NetworkError(e.to_string()))?;

        self.handle_response(response).await
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, XenditError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| XenditError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            #[derive(Deserialize)]
            struct XenditApiError {
                error_code: Option<String>,
                message: Option<String>,
            }

            if let Ok(error) = serde_json::from_str::<XenditApiError>(&body) {
                let code = error.error_code.unwrap_or_else(|| status.to_string());
                let message = error.message.unwrap_or_default();
                return Err(XenditError::ApiError(format!("{code}: {message}")));
            }

            return Err(XenditError::ApiError(format!("HTTP {status}: {body}")));
        }

        serde_json::from_str(&body).map_err(|e| XenditError::ParseError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paid_and_settled_map_to_paid() {
        assert_eq!(map_webhook_status("PAID"), Some(STATUS_PAID));
        assert_eq!(map_webhook_status("SETTLED"), Some(STATUS_PAID));
        assert_eq!(map_webhook_status("paid"), Some(STATUS_PAID));
    }

    #[test]
    fn expired_and_failed_map_through() {
        assert_eq!(map_webhook_status("EXPIRED"), Some(STATUS_EXPIRED));
        assert_eq!(map_webhook_status("FAILED"), Some(STATUS_FAILED));
    }

    #[test]
    fn unknown_statuses_are_ignored() {
        assert_eq!(map_webhook_status("PENDING"), None);
        assert_eq!(map_webhook_status(""), None);
        assert_eq!(map_webhook_status("VOIDED"), None);
    }

    #[test]
    fn callback_token_must_match_and_be_configured() {
        let config = XenditConfig {
            base_url: "https://api.xendit.co".to_string(),
            secret_key: "sk_test".to_string(),
            callback_token: "shared-secret".to_string(),
            success_redirect_url: None,
        };
        let client = XenditClient::new(&config);
        assert!(client.verify_callback_token("shared-secret"));
        assert!(!client.verify_callback_token("wrong"));

        let unconfigured = XenditClient::new(&XenditConfig {
            callback_token: String::new(),
            ..config
        });
        assert!(!unconfigured.verify_callback_token(""));
    }
}
