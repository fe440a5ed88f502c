//! API client for communicating with the postboard REST API.
//!
//! This module provides the `ApiClient` struct for user registration, login,
//! and the paginated post endpoints.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::models::{AuthData, LoginResponse, PostsPage};

use super::{ApiError, AuthBackend, PostsBackend};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// API client for the postboard backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client rooted at `base_url` (e.g. `http://host/api`)
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn user_url(&self, action: &str) -> String {
        format!("{}/user/{}", self.base_url, action)
    }

    fn posts_url(&self, posts_per_page: u32, page: u32) -> String {
        format!(
            "{}/posts?pagesize={}&page={}",
            self.base_url, posts_per_page, page
        )
    }

    fn post_url(&self, post_id: &str) -> String {
        format!("{}/posts/{}", self.base_url, post_id)
    }

    /// Bearer header for the caller's session token; empty without one.
    fn auth_headers(token: Option<&str>) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        Ok(headers)
    }

    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(
        response: reqwest::Response,
    ) -> Result<Option<reqwest::Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .with_context(|| format!("Failed to send GET request to {}", url))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    return response
                        .json()
                        .await
                        .with_context(|| format!("Failed to parse JSON response from {}", url));
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(url = url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                }
            }
        }
    }

    /// Send a request with an optional JSON body and return the raw response.
    /// Credentials are never retried, so this does not loop on 429.
    async fn send<B: Serialize>(
        &self,
        method: Method,
        url: &str,
        token: Option<&str>,
        body: Option<&B>,
    ) -> Result<reqwest::Response> {
        let mut request = self
            .client
            .request(method.clone(), url)
            .headers(Self::auth_headers(token)?);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to send {} request to {}", method, url))?;

        Self::check_response(response).await
    }
}

#[async_trait]
impl AuthBackend for ApiClient {
    async fn signup(&self, auth: &AuthData) -> Result<()> {
        let url = self.user_url("signup");
        debug!(url = %url, "Submitting signup");
        self.send(Method::POST, &url, None, Some(auth)).await?;
        Ok(())
    }

    async fn login(&self, auth: &AuthData) -> Result<LoginResponse> {
        let url = self.user_url("login");
        debug!(url = %url, "Submitting login");
        let response = self.send(Method::POST, &url, None, Some(auth)).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
            .context("Failed to parse login response")
    }
}

#[async_trait]
impl PostsBackend for ApiClient {
    async fn fetch_posts(&self, posts_per_page: u32, page: u32) -> Result<PostsPage> {
        let url = self.posts_url(posts_per_page, page);
        self.get(&url).await
    }

    async fn delete_post(&self, token: Option<&str>, post_id: &str) -> Result<()> {
        let url = self.post_url(post_id);
        debug!(url = %url, "Deleting post");
        self.send::<()>(Method::DELETE, &url, token, None).await?;
        Ok(())
    }
}
