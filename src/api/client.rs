use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Method, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::errors::ApiError;
use super::retry::RetryPolicy;
use crate::config::ApiConfig;

/// Characters left as-is inside a path segment
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// JSON REST client shared by the catalog and watch-state APIs.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
    auth_token: Option<String>,
    retry_policy: RetryPolicy,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.max(1)))
            .build()
            .map_err(|e| ApiError::Other(format!("Failed to create HTTP client: {}", e)))?;

        // Url::join drops the last segment unless the base ends with a slash
        let mut base = config.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| ApiError::InvalidRequest(format!("Bad API base URL {:?}: {}", base, e)))?;

        let retry_policy = RetryPolicy::with_retries(config.max_retries);

        Ok(Self {
            client,
            base_url,
            auth_token: config
                .auth_token
                .clone()
                .filter(|token| !token.trim().is_empty()),
            retry_policy,
        })
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_token.is_some()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn build_url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let path = segments
            .iter()
            .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
            .collect::<Vec<_>>()
            .join("/");
        self.base_url
            .join(&path)
            .map_err(|e| ApiError::InvalidRequest(format!("Bad path {:?}: {}", path, e)))
    }

    fn standard_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(token) = &self.auth_token {
            match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(e) => warn!("Auth token is not a valid header value: {}", e),
            }
        }

        headers
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        operation_name: &str,
    ) -> Result<T, ApiError> {
        let url = self.build_url(segments)?;
        let response = self
            .execute(Method::GET, &url, None::<&()>, operation_name)
            .await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::ParseError(format!("{}: {}", operation_name, e)))
    }

    pub(crate) async fn post<B: Serialize + Sync>(
        &self,
        segments: &[&str],
        body: Option<&B>,
        operation_name: &str,
    ) -> Result<(), ApiError> {
        let url = self.build_url(segments)?;
        self.execute(Method::POST, &url, body, operation_name)
            .await
            .map(|_| ())
    }

    /// Send a request with retries; non-success statuses become [`ApiError`].
    async fn execute<B: Serialize + Sync>(
        &self,
        method: Method,
        url: &Url,
        body: Option<&B>,
        operation_name: &str,
    ) -> Result<Response, ApiError> {
        let headers = self.standard_headers();

        self.retry_policy
            .execute(operation_name, || async {
                debug!("[{}] {} {}", operation_name, method, url);

                let mut request = self
                    .client
                    .request(method.clone(), url.clone())
                    .headers(headers.clone());
                if let Some(body) = body {
                    request = request.json(body);
                }

                let response = request.send().await.map_err(ApiError::from_reqwest)?;
                let status = response.status();
                debug!("[{}] Response: {}", operation_name, status);

                if status.is_success() {
                    return Ok(response);
                }

                let retry_after = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.trim().parse::<u64>().ok());
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<failed to read response body>".to_string());
                warn!(
                    "[{}] Error response - Status: {}, Body: {}",
                    operation_name,
                    status.as_u16(),
                    body
                );

                Err(ApiError::from_status(status.as_u16(), &body, retry_after))
            })
            .await
    }
}
