//! Resilient page retrieval with bounded retries, exponential backoff, and a
//! mandatory politeness delay.

use std::time::Duration;

use reqwest::StatusCode;

use crate::browser::BrowserSession;
use crate::user_agent::next_identity;

/// Errors produced while retrieving a page.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status}")]
    HttpStatus { status: StatusCode },
    #[error("browser error: {0}")]
    Browser(String),
    #[error("landmark '{selector}' did not appear in time")]
    LandmarkTimeout { selector: String },
    #[error("retries exhausted after {attempts} attempts")]
    ExhaustedRetries { attempts: usize },
}

/// Retry budget and delay contract shared by both fetch paths.
///
/// `base_delay` is paid once on every success (politeness), and scales
/// as `base_delay * 2^attempt` between failed attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    fn backoff(&self, attempt: usize) -> Duration {
        let shift = attempt.min(30) as u32;
        self.base_delay * (1u32 << shift)
    }
}

/// Stateless page fetcher. A fresh HTTP client and outbound identity are
/// built per attempt so retries never reuse a fingerprint.
pub struct Fetcher;

impl Fetcher {
    /// Retrieves `url` over plain HTTP within the retry budget.
    pub async fn fetch_static(url: &str, policy: &RetryPolicy) -> Result<String, FetchError> {
        for attempt in 0..policy.max_retries {
            match Self::attempt_static(url).await {
                Ok(body) => {
                    tokio::time::sleep(policy.base_delay).await;
                    return Ok(body);
                }
                Err(err) => {
                    let wait = policy.backoff(attempt);
                    tracing::warn!(
                        "fetch of {} failed (attempt {}/{}): {}; backing off {:.1}s",
                        url,
                        attempt + 1,
                        policy.max_retries,
                        err,
                        wait.as_secs_f64()
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
        Err(FetchError::ExhaustedRetries {
            attempts: policy.max_retries,
        })
    }

    async fn attempt_static(url: &str) -> Result<String, FetchError> {
        let identity = next_identity();
        let client = reqwest::Client::builder()
            .user_agent(identity.user_agent)
            .timeout(Duration::from_secs(30))
            .build()?;
        let mut request = client.get(url);
        for (name, value) in identity.headers {
            request = request.header(*name, *value);
        }
        let resp = request.send().await?;
        if !resp.status().is_success() {
            return Err(FetchError::HttpStatus {
                status: resp.status(),
            });
        }
        Ok(resp.text().await?)
    }

    /// Retrieves `url` through the headless browser session within the retry
    /// budget, gating readiness on `landmark` appearing in the DOM.
    pub async fn fetch_rendered(
        session: &BrowserSession,
        url: &str,
        landmark: &str,
        policy: &RetryPolicy,
    ) -> Result<String, FetchError> {
        for attempt in 0..policy.max_retries {
            match session.render_page(url, landmark).await {
                Ok(html) => {
                    tokio::time::sleep(policy.base_delay).await;
                    return Ok(html);
                }
                Err(err) => {
                    let wait = policy.backoff(attempt);
                    tracing::warn!(
                        "rendered fetch of {} failed (attempt {}/{}): {}; backing off {:.1}s",
                        url,
                        attempt + 1,
                        policy.max_retries,
                        err,
                        wait.as_secs_f64()
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
        Err(FetchError::ExhaustedRetries {
            attempts: policy.max_retries,
        })
    }
}
