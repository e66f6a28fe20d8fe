use std::thread;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::redirect::Policy;

use crate::error::ReportError;

const TIMEOUT_SECS: u64 = 30;

/// Retry schedule for one fetch: `retries` attempts in total, sleeping
/// `backoff_base^attempt` seconds between them.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub retries: u32,
    pub backoff_base: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            backoff_base: 1.6,
        }
    }
}

/// One pooled HTTP session shared by every upstream client in the process.
/// `get` absorbs all transport errors: a request either yields a response
/// (any status outside the retryable set, 404 included) or, after the
/// retry budget is spent, `None`.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    policy: RetryPolicy,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, ReportError> {
        Self::with_policy(RetryPolicy::default())
    }

    pub fn with_policy(policy: RetryPolicy) -> Result<Self, ReportError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!(
                "chembl-bioactivity-report/{}",
                env!("CARGO_PKG_VERSION")
            ))
            .map_err(|err| ReportError::Http(err.to_string()))?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain;q=0.5"),
        );
        let client = Client::builder()
            .default_headers(headers)
            .redirect(Policy::limited(10))
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .map_err(|err| ReportError::Http(err.to_string()))?;
        Ok(Self { client, policy })
    }

    pub fn get(&self, url: &str) -> Option<Response> {
        for attempt in 0..self.policy.retries {
            match self.client.get(url).send() {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if is_retryable_status(status) {
                        tracing::debug!(url, status, attempt, "retryable status");
                        thread::sleep(backoff_delay(self.policy.backoff_base, attempt));
                        continue;
                    }
                    return Some(response);
                }
                Err(err) => {
                    tracing::debug!(url, attempt, error = %err, "transport error");
                    thread::sleep(backoff_delay(self.policy.backoff_base, attempt));
                }
            }
        }
        None
    }
}

pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

pub fn backoff_delay(base: f64, attempt: u32) -> Duration {
    Duration::from_secs_f64(base.powi(attempt as i32).max(0.0))
}
