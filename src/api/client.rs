//! API client for the ProfileKit backend
//!
//! Handles all HTTP communication with the backend API. Implements the
//! remote collaborator traits the flows are built against, so the flows
//! themselves never see HTTP.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::services::{MergePolicy, RecordStore, RemoteError, ReportService};

/// API base URL (can be overridden via environment variable)
const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

#[derive(Debug, Serialize)]
struct ReportRequestBody<'a> {
    image_url: &'a str,
    subject_user_id: &'a str,
    reason: &'a str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ReportResponseBody {
    #[serde(default = "default_accepted")]
    accepted: bool,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn default_accepted() -> bool {
    true
}

/// API errors
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

impl From<ApiError> for RemoteError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Network(err) => RemoteError::Network(err.to_string()),
            ApiError::Api { status, message } => RemoteError::Service { status, message },
        }
    }
}

/// API client for the ProfileKit backend
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client from config and environment
    pub fn new() -> Self {
        let config = Config::load().unwrap_or_default();

        let base_url = std::env::var("PROFILE_COMPANION_API_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| config.api.base_url.clone());

        let timeout_seconds = std::env::var("PROFILE_COMPANION_API_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or_else(|| config.api.timeout_seconds.max(1));

        let verify_ssl =
            parse_bool_env("PROFILE_COMPANION_API_VERIFY_SSL").unwrap_or(config.api.verify_ssl);

        Self::with_settings(base_url, timeout_seconds, verify_ssl)
    }

    /// Create with custom base URL
    #[allow(dead_code)]
    pub fn with_url(base_url: String) -> Self {
        Self::with_settings(base_url, DEFAULT_TIMEOUT_SECONDS, true)
    }

    fn with_settings(base_url: String, timeout_seconds: u64, verify_ssl: bool) -> Self {
        let timeout = Duration::from_secs(timeout_seconds.max(1));
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(!verify_ssl)
            .build()
            .unwrap_or_else(|_| Client::new());

        ApiClient {
            client,
            base_url: normalize_base_url(&base_url),
        }
    }

    /// Check if the API is reachable
    #[allow(dead_code)]
    pub async fn health_check(&self) -> Result<bool, ApiError> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        Ok(response.status().is_success())
    }

    async fn post_report(
        &self,
        image_url: &str,
        subject_user_id: &str,
        reason: &str,
        idempotency_key: &str,
    ) -> Result<ReportResponseBody, ApiError> {
        let url = format!("{}/api/v1/moderation/reports", self.base_url);
        let body = ReportRequestBody {
            image_url,
            subject_user_id,
            reason,
        };

        let response = self
            .client
            .post(&url)
            .header(IDEMPOTENCY_HEADER, idempotency_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let parsed: ReportResponseBody = response.json().await?;
            debug!(accepted = parsed.accepted, "report response received");
            return Ok(parsed);
        }

        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(ApiError::Api {
            status: status.as_u16(),
            message: error_body,
        })
    }

    async fn patch_record(
        &self,
        collection: &str,
        document_id: &str,
        fields: &Map<String, Value>,
        merge: MergePolicy,
    ) -> Result<(), ApiError> {
        let url = format!(
            "{}/api/v1/records/{}/{}",
            self.base_url, collection, document_id
        );

        let response = self
            .client
            .patch(&url)
            .query(&[("merge", merge_query_value(merge))])
            .json(fields)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(ApiError::Api {
            status: status.as_u16(),
            message: error_body,
        })
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReportService for ApiClient {
    async fn report_photo(
        &self,
        image_url: &str,
        subject_user_id: &str,
        reason: &str,
        idempotency_key: &str,
    ) -> Result<bool, RemoteError> {
        let response = self
            .post_report(image_url, subject_user_id, reason, idempotency_key)
            .await?;
        Ok(response.accepted)
    }
}

#[async_trait]
impl RecordStore for ApiClient {
    async fn upsert(
        &self,
        collection: &str,
        document_id: &str,
        fields: Map<String, Value>,
        merge: MergePolicy,
    ) -> Result<(), RemoteError> {
        self.patch_record(collection, document_id, &fields, merge)
            .await
            .map_err(RemoteError::from)
    }
}

fn merge_query_value(merge: MergePolicy) -> &'static str {
    match merge {
        MergePolicy::Merge => "true",
        MergePolicy::Replace => "false",
    }
}

fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return DEFAULT_API_URL.to_string();
    }
    trimmed.trim_end_matches('/').to_string()
}

fn parse_bool_env(key: &str) -> Option<bool> {
    let value = std::env::var(key).ok()?;
    parse_bool_value(&value)
}

fn parse_bool_value(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_url() {
        let client = ApiClient::with_url("https://api.example.com".to_string());
        assert_eq!(client.base_url, "https://api.example.com");
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("https://api.example.com/"),
            "https://api.example.com"
        );
        assert_eq!(normalize_base_url(""), DEFAULT_API_URL);
    }

    #[test]
    fn test_parse_bool_variants() {
        assert_eq!(parse_bool_value("true"), Some(true));
        assert_eq!(parse_bool_value("1"), Some(true));
        assert_eq!(parse_bool_value("no"), Some(false));
        assert_eq!(parse_bool_value("0"), Some(false));
        assert_eq!(parse_bool_value("maybe"), None);
    }

    #[test]
    fn test_merge_policy_query_mapping() {
        assert_eq!(merge_query_value(MergePolicy::Merge), "true");
        assert_eq!(merge_query_value(MergePolicy::Replace), "false");
    }

    #[test]
    fn report_response_defaults_to_accepted() {
        let parsed: ReportResponseBody = serde_json::from_str("{}").expect("parse failed");
        assert!(parsed.accepted);
        assert!(parsed.id.is_none());
    }
}
