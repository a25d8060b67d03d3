use reqwest::{multipart::Form, Method};
use serde_json::Value;
use std::sync::Arc;

use crate::config::Config;
use crate::errors::AppError;
use crate::rate_limiter::EndpointRateLimiter;
use crate::tiktok_models::ApiEnvelope;

/// Client for the TikTok Business API.
///
/// Every call takes one token from the bucket of its endpoint before it is
/// sent. No retries happen here; callers decide.
#[derive(Clone)]
pub struct TikTokClient {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
    limiter: Arc<EndpointRateLimiter>,
}

/// Raw platform answer: parsed envelope plus the body text it came from.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub envelope: ApiEnvelope,
    pub raw_body: String,
}

impl ApiResponse {
    /// Fail on a non-zero platform code, else parse `data` into `T`.
    pub fn into_data<T: serde::de::DeserializeOwned>(self) -> Result<T, AppError> {
        self.envelope.into_data(&self.raw_body)
    }
}

impl TikTokClient {
    /// Creates a new `TikTokClient`.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::Transport(format!("Failed to create TikTok client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            limiter: Arc::new(EndpointRateLimiter::from_config(config)),
        })
    }

    /// Calls `path` and returns the envelope, whatever its `code`.
    ///
    /// GET payload fields become query parameters (non-string values are
    /// JSON-encoded); other methods send the payload as a JSON body.
    /// Fails with `Transport` on network errors and `Api` on HTTP failures.
    pub async fn call(
        &self,
        path: &str,
        method: Method,
        payload: &Value,
    ) -> Result<ApiResponse, AppError> {
        self.limiter.acquire(path).await;

        let url = format!("{}{}", self.base_url, path);
        let request = self
            .client
            .request(method.clone(), &url)
            .header("Access-Token", &self.access_token);

        let request = if method == Method::GET {
            request.query(&query_pairs(payload))
        } else {
            request.json(payload)
        };

        tracing::debug!("TikTok API {} {}", method, path);
        let response = request.send().await.map_err(|e| {
            tracing::error!("TikTok API Error [{} {}]: {}", method, path, e);
            AppError::Transport(format!("{} {} failed: {}", method, path, e))
        })?;

        self.read_envelope(&method, path, response).await
    }

    /// Like `call`, but fails with `Api` unless the platform code is 0.
    pub async fn call_checked(
        &self,
        path: &str,
        method: Method,
        payload: &Value,
    ) -> Result<ApiResponse, AppError> {
        let response = self.call(path, method, payload).await?;
        if !response.envelope.is_success() {
            tracing::error!(
                "TikTok API Error [{}]: code {} {}",
                path,
                response.envelope.code,
                response.envelope.message
            );
            return Err(AppError::Api {
                status_code: None,
                platform_code: Some(response.envelope.code),
                message: response.envelope.message,
                raw_body: response.raw_body,
            });
        }
        Ok(response)
    }

    /// POSTs a multipart form (media uploads).
    pub async fn call_multipart(&self, path: &str, form: Form) -> Result<ApiResponse, AppError> {
        self.limiter.acquire(path).await;

        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .header("Access-Token", &self.access_token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("TikTok API Error [POST {}]: {}", path, e);
                AppError::Transport(format!("POST {} failed: {}", path, e))
            })?;

        self.read_envelope(&Method::POST, path, response).await
    }

    async fn read_envelope(
        &self,
        method: &Method,
        path: &str,
        response: reqwest::Response,
    ) -> Result<ApiResponse, AppError> {
        let status = response.status();
        let raw_body = response
            .text()
            .await
            .map_err(|e| AppError::Transport(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            tracing::error!(
                "TikTok API Error [{} {}]: HTTP {}: {}",
                method,
                path,
                status,
                raw_body
            );
            return Err(AppError::Api {
                status_code: Some(status.as_u16()),
                platform_code: None,
                message: status
                    .canonical_reason()
                    .unwrap_or("HTTP error")
                    .to_string(),
                raw_body,
            });
        }

        let envelope: ApiEnvelope = serde_json::from_str(&raw_body).map_err(|e| {
            AppError::Schema(format!("Failed to parse TikTok response for {}: {}", path, e))
        })?;

        Ok(ApiResponse { envelope, raw_body })
    }
}

/// Flatten a JSON object into query pairs. Strings pass through as-is.
fn query_pairs(payload: &Value) -> Vec<(String, String)> {
    match payload {
        Value::Object(map) => map
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| {
                let value = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), value)
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_client_creation() {
        let client = TikTokClient::new(&Config::dry_run("1"));
        assert!(client.is_ok());
    }

    #[test]
    fn test_query_pairs_json_encode_non_strings() {
        let pairs = query_pairs(&json!({
            "advertiser_id": "123",
            "page_size": 1000,
            "filtering": {"adgroup_ids": ["9"]},
            "skip": null
        }));

        assert!(pairs.contains(&("advertiser_id".to_string(), "123".to_string())));
        assert!(pairs.contains(&("page_size".to_string(), "1000".to_string())));
        assert!(pairs.contains(&("filtering".to_string(), r#"{"adgroup_ids":["9"]}"#.to_string())));
        assert_eq!(pairs.len(), 3);
    }
}
