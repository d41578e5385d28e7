// src/utils/http.rs

//! HTTP client utilities.
//!
//! Every outbound call goes through [`RateLimitedClient`], which logs the
//! exchange and replays requests answered with `429 Too Many Requests` when
//! the server names a usable `Retry-After` delay.

use std::time::{Duration, Instant};

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Request, Response, StatusCode};

use crate::error::{AppError, Result};
use crate::models::{HttpConfig, RateLimitConfig};

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &HttpConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(config.timeout())
        .build()?;
    Ok(client)
}

/// Create a client that sends `Authorization: Bearer <token>` on every request.
pub fn create_authorized_client(config: &HttpConfig, token: &str) -> Result<Client> {
    let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|_| AppError::auth("access token contains characters invalid in a header"))?;
    value.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, value);

    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(config.timeout())
        .default_headers(headers)
        .build()?;
    Ok(client)
}

/// HTTP client decorator retrying 429 responses with bounded backoff.
#[derive(Debug, Clone)]
pub struct RateLimitedClient {
    client: Client,
    max_retries: u32,
    max_retry_after: Duration,
}

impl RateLimitedClient {
    pub fn new(client: Client, policy: &RateLimitConfig) -> Self {
        Self {
            client,
            max_retries: policy.max_retries,
            max_retry_after: Duration::from_secs(policy.max_retry_after_secs),
        }
    }

    /// The wrapped client, for building requests.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Execute a request, honouring `Retry-After` on 429 responses.
    ///
    /// A 429 that cannot be retried (header missing, unparseable, above the
    /// bound, or retry budget spent) is returned as-is, not as an error.
    pub async fn execute(&self, request: Request) -> Result<Response> {
        let mut retries = 0;

        loop {
            // Streaming bodies cannot be replayed; send those exactly once.
            let Some(attempt) = request.try_clone() else {
                return self.send(request).await;
            };

            let response = self.send(attempt).await?;
            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }

            if retries >= self.max_retries {
                log::warn!(
                    "Max retries exceeded for rate limited request {} (retries: {})",
                    request.url(),
                    retries
                );
                return Ok(response);
            }

            let Some(delay) = self.retry_delay(&response) else {
                return Ok(response);
            };
            drop(response);

            retries += 1;
            log::info!(
                "Rate limited on {}, retrying in {}s (attempt {}/{})",
                request.url(),
                delay.as_secs(),
                retries,
                self.max_retries
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Delay requested by a 429 response, if it is one we honour.
    fn retry_delay(&self, response: &Response) -> Option<Duration> {
        let raw = response.headers().get(header::RETRY_AFTER)?;
        let Some(secs) = parse_retry_after(raw) else {
            log::warn!("Failed to parse Retry-After header: {:?}", raw);
            return None;
        };

        let delay = Duration::from_secs(secs);
        if delay > self.max_retry_after {
            log::warn!(
                "Retry-After of {}s for {} exceeds the {}s maximum",
                secs,
                response.url(),
                self.max_retry_after.as_secs()
            );
            return None;
        }
        Some(delay)
    }

    async fn send(&self, request: Request) -> Result<Response> {
        let method = request.method().clone();
        let url = request.url().clone();
        log::debug!("http request: {} {}", method, url);

        let started = Instant::now();
        let response = self.client.execute(request).await.map_err(|e| {
            log::debug!(
                "http failure: {} {} after {:?}: {}",
                method,
                url,
                started.elapsed(),
                e
            );
            e
        })?;

        log::debug!(
            "http response: {} {} -> {} in {:?}",
            method,
            url,
            response.status(),
            started.elapsed()
        );
        Ok(response)
    }
}

/// Parse a delta-seconds `Retry-After` value. HTTP-date values are not
/// supported.
fn parse_retry_after(value: &HeaderValue) -> Option<u64> {
    value.to_str().ok()?.trim().parse().ok()
}
