use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::RadiusConfig;

/// Client for the external RADIUS operations service that owns subscriber
/// session state on the BRAS. All calls are synchronous best-effort; the
/// caller decides what a failure means for billing status.
#[derive(Clone)]
pub struct RadiusOpsClient {
    base_url: String,
    api_key: String,
    realm: String,
    client: reqwest::Client,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum RadiusError {
    #[error("RADIUS API error: {0}")]
    ApiError(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("RADIUS operations service is not configured")]
    NotConfigured,
}

#[derive(Debug, Serialize)]
struct OperationRequest<'a> {
    action: &'a str,
    username: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    profile: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OperationResult {
    pub success: bool,
    pub message: Option<String>,
}

impl RadiusOpsClient {
    pub fn new(config: &RadiusConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            realm: config.realm.clone(),
            client,
        }
    }

    /// Canonical PPPoE username for an account: `<account_no>@<realm>`,
    /// lowercased. Used when provisioning accounts that have no stored
    /// username yet.
    pub fn derive_username(&self, account_no: &str) -> String {
        format!("{}@{}", account_no.to_lowercase(), self.realm)
    }

    pub async fn reconnect(
        &self,
        username: &str,
        profile: &str,
    ) -> Result<OperationResult, RadiusError> {
        self.operation("reconnect", username, Some(profile)).await
    }

    pub async fn disconnect(&self, username: &str) -> Result<OperationResult, RadiusError> {
        self.operation("disconnect", username, None).await
    }

    /// Permanently removes the subscriber entry; used on pullout.
    pub async fn remove(&self, username: &str) -> Result<OperationResult, RadiusError> {
        self.operation("remove", username, None).await
    }

    /// Re-homes the subscriber onto a different service profile; used on
    /// migration.
    pub async fn change_profile(
        &self,
        username: &str,
        profile: &str,
    ) -> Result<OperationResult, RadiusError> {
        self.operation("change_profile", username, Some(profile))
            .await
    }

    async fn operation(
        &self,
        action: &str,
        username: &str,
        profile: Option<&str>,
    ) -> Result<OperationResult, RadiusError> {
        if self.api_key.is_empty() {
            return Err(RadiusError::NotConfigured);
        }

        let request = OperationRequest {
            action,
            username,
            profile,
        };

        let response = self
            .client
            .post(format!("{}/operations", self.base_url))
            .header("x-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| RadiusError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RadiusError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            return Err(RadiusError::ApiError(format!("HTTP {status}: {body}")));
        }

        serde_json::from_str(&body).map_err(|e| RadiusError::ParseError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> RadiusOpsClient {
        RadiusOpsClient::new(&RadiusConfig {
            base_url: "http://localhost:9090".to_string(),
            api_key: "key".to_string(),
            realm: "fiber.example.ph".to_string(),
        })
    }

    #[test]
    fn derived_username_is_lowercased_account_at_realm() {
        let client = test_client();
        assert_eq!(
            client.derive_username("ACC-000123"),
            "acc-000123@fiber.example.ph"
        );
    }

    #[test]
    fn operation_request_omits_profile_when_absent() {
        let request = OperationRequest {
            action: "disconnect",
            username: "acc-000123@fiber.example.ph",
            profile: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("profile").is_none());
        assert_eq!(json["action"], "disconnect");
    }
}
