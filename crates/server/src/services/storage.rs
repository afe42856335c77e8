//! Object-storage signing API client.
//!
//! The document bundles live in a private bucket behind an object-storage
//! service that can mint time-boxed signed download URLs. This client wraps
//! its signing endpoint. Errors here are always treated as per-item soft
//! failures by the link issuer, never as request-level failures.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;

use crate::config::StorageConfig;

/// Errors that can occur when requesting a signed URL.
#[derive(Debug, Error)]
pub enum StorageError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse the signing response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Anything that can mint a time-boxed signed URL for a storage object.
///
/// The production implementation is [`StorageClient`]; tests substitute a
/// stub so link-issuance behavior can be exercised without the collaborator.
pub trait SignedUrlProvider {
    /// Request a signed URL for `object_path`, valid for `ttl_seconds`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the signing request fails in any way.
    fn create_signed_url(
        &self,
        object_path: &str,
        ttl_seconds: u64,
    ) -> impl Future<Output = Result<String, StorageError>> + Send;
}

/// HTTP client for the object-storage signing API.
#[derive(Debug, Clone)]
pub struct StorageClient {
    client: reqwest::Client,
    api_url: String,
    bucket: String,
}

/// Signing endpoint response body.
#[derive(Debug, Deserialize)]
struct SignResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

impl StorageClient {
    /// Create a new storage API client.
    ///
    /// # Errors
    ///
    /// Returns error if the service key is not a valid header value or the
    /// HTTP client fails to build.
    pub fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.service_key.expose_secret());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value)
                .map_err(|e| StorageError::Parse(format!("Invalid service key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            bucket: config.bucket.clone(),
        })
    }

    /// Resolve a possibly-relative signed URL against the API base.
    fn absolute_url(&self, signed: &str) -> String {
        if signed.starts_with("http://") || signed.starts_with("https://") {
            signed.to_string()
        } else {
            format!("{}{signed}", self.api_url)
        }
    }
}

impl SignedUrlProvider for StorageClient {
    async fn create_signed_url(
        &self,
        object_path: &str,
        ttl_seconds: u64,
    ) -> Result<String, StorageError> {
        let url = format!(
            "{}/object/sign/{}/{object_path}",
            self.api_url, self.bucket
        );

        let body = serde_json::json!({ "expiresIn": ttl_seconds });

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StorageError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let signed: SignResponse = response
            .json()
            .await
            .map_err(|e| StorageError::Parse(e.to_string()))?;

        Ok(self.absolute_url(&signed.signed_url))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn test_config() -> StorageConfig {
        StorageConfig {
            api_url: "https://storage.example.com".to_string(),
            bucket: "compliance-documents".to_string(),
            service_key: SecretString::from("test-service-key-0123456789"),
        }
    }

    #[test]
    fn test_client_builds() {
        assert!(StorageClient::new(&test_config()).is_ok());
    }

    #[test]
    fn test_absolute_url_passthrough() {
        let client = StorageClient::new(&test_config()).unwrap();
        assert_eq!(
            client.absolute_url("https://cdn.example.com/x"),
            "https://cdn.example.com/x"
        );
    }

    #[test]
    fn test_absolute_url_joins_relative() {
        let client = StorageClient::new(&test_config()).unwrap();
        assert_eq!(
            client.absolute_url("/object/sign/compliance-documents/bundles/x.zip?token=abc"),
            "https://storage.example.com/object/sign/compliance-documents/bundles/x.zip?token=abc"
        );
    }
}
