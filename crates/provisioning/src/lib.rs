//! Credential Provider client.
//!
//! Fetches per-job warehouse credentials from the provisioning service.
//! The runner depends only on the [`CredentialProvider`] trait, so tests can
//! substitute an in-memory provider.

use std::time::Duration;

use async_trait::async_trait;
use lgr_core::credentials::Credentials;
use serde::Deserialize;
use serde_json::Value;

/// Warehouse backend whose credentials are requested.
pub const BACKEND_REDSHIFT: &str = "redshift";

/// Resource class used for transformation jobs.
pub const RESOURCE_TRANSFORMATIONS: &str = "transformations";

/// HTTP request timeout for a credentials request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors from the provisioning layer.
#[derive(Debug, thiserror::Error)]
pub enum ProvisioningError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Provisioning API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The response did not contain usable credentials.
    #[error("I cannot get credentials for Redshift database.")]
    MissingCredentials,

    /// The credentials object was present but incomplete.
    #[error("Malformed credentials: {0}")]
    Malformed(String),
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Source of warehouse credentials for a job.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Fetch credentials for `resource_class`.
    async fn credentials(&self, resource_class: &str) -> Result<Credentials, ProvisioningError>;
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// Response body of a credentials request.
#[derive(Debug, Deserialize)]
struct CredentialsResponse {
    #[serde(default)]
    credentials: Option<Value>,
}

/// HTTP client for the provisioning service.
pub struct ProvisioningClient {
    client: reqwest::Client,
    api_url: String,
    backend: String,
    token: String,
    run_id: String,
}

impl ProvisioningClient {
    /// Create a client for `backend` authenticated with `token`.
    ///
    /// * `api_url` - Base URL, e.g. `https://syrup.keboola.com/provisioning`.
    pub fn new(
        api_url: impl Into<String>,
        backend: impl Into<String>,
        token: impl Into<String>,
        run_id: impl Into<String>,
    ) -> Result<Self, ProvisioningError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            backend: backend.into(),
            token: token.into(),
            run_id: run_id.into(),
        })
    }

    /// Validate a raw credentials response.
    fn extract(response: CredentialsResponse) -> Result<Credentials, ProvisioningError> {
        let Some(raw) = response.credentials.filter(Value::is_object) else {
            return Err(ProvisioningError::MissingCredentials);
        };
        let has_host = raw
            .get("hostname")
            .and_then(Value::as_str)
            .is_some_and(|h| !h.is_empty());
        if !has_host {
            return Err(ProvisioningError::MissingCredentials);
        }
        serde_json::from_value(raw).map_err(|e| ProvisioningError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl CredentialProvider for ProvisioningClient {
    async fn credentials(&self, resource_class: &str) -> Result<Credentials, ProvisioningError> {
        tracing::debug!(backend = %self.backend, resource_class, "Requesting credentials");

        let response = self
            .client
            .get(format!("{}/{}", self.api_url, self.backend))
            .query(&[("type", resource_class)])
            .header("X-StorageApi-Token", &self.token)
            .header("X-KBC-RunId", &self.run_id)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ProvisioningError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let credentials = Self::extract(response.json::<CredentialsResponse>().await?)?;
        tracing::debug!(?credentials, "Credentials obtained");
        Ok(credentials)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
