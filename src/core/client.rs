use crate::domain::model::Employee;
use crate::utils::error::{ExtractorError, Result};
use reqwest::{header, Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// Bounded-retry settings for one logical request. Attempt counts and
/// delays are explicit inputs here, never module state.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the initial attempt; 3 retries means up to 4 requests.
    pub max_retries: u32,
    /// Backoff before retry N is `base_delay * 2^(N-1)`.
    pub base_delay: Duration,
    /// Pause after a 429 without a parseable Retry-After header.
    pub rate_limit_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(2),
            rate_limit_delay: Duration::from_secs(6),
        }
    }
}

impl RetryPolicy {
    fn backoff_delay(&self, failed_attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(failed_attempt.saturating_sub(1))
    }
}

enum RequestOutcome {
    Success(Value),
    Transient(String),
    RateLimited {
        retry_after: Option<Duration>,
        message: String,
    },
    Permanent(ExtractorError),
}

/// HTTP client for the company-directory API. Holds the credentials and
/// retry policy for the lifetime of one extraction run.
pub struct DirectoryClient {
    client: Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl DirectoryClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            ExtractorError::ProcessingError {
                message: format!("failed to build HTTP client: {e}"),
            }
        })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            retry,
        })
    }

    /// Fetch one page of employee records. Non-object items in the
    /// `results` array are skipped; a missing `results` key reads as an
    /// empty page, which ends pagination upstream.
    pub async fn fetch_employee_page(
        &self,
        company_id: &str,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<Employee>> {
        let query = [
            ("companyId", company_id.to_string()),
            ("page", page.to_string()),
            ("pageSize", page_size.to_string()),
        ];
        let body = self.request_with_retry("company_employee", &query).await?;

        let mut employees = Vec::new();
        if let Some(Value::Array(items)) = body.get("results") {
            for item in items {
                if let Value::Object(fields) = item {
                    employees.push(Employee {
                        fields: fields.clone(),
                    });
                }
            }
        }
        Ok(employees)
    }

    async fn request_with_retry(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let total_attempts = self.retry.max_retries + 1;
        let mut last_failure = String::new();

        for attempt in 1..=total_attempts {
            match self.send_once(&url, query).await {
                RequestOutcome::Success(body) => return Ok(body),
                RequestOutcome::Permanent(err) => return Err(err),
                RequestOutcome::Transient(message) => {
                    tracing::warn!("⚠️ {} (attempt {}/{})", message, attempt, total_attempts);
                    last_failure = message;
                    if attempt < total_attempts {
                        let delay = self.retry.backoff_delay(attempt);
                        tracing::info!("⏳ Retrying in {:?}", delay);
                        tokio::time::sleep(delay).await;
                    }
                }
                RequestOutcome::RateLimited {
                    retry_after,
                    message,
                } => {
                    tracing::warn!("⚠️ {} (attempt {}/{})", message, attempt, total_attempts);
                    last_failure = message;
                    if attempt < total_attempts {
                        let delay = retry_after.unwrap_or(self.retry.rate_limit_delay);
                        tracing::info!("⏳ Rate limited, pausing for {:?}", delay);
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(ExtractorError::FetchError {
            message: format!(
                "request to {url} failed after {total_attempts} attempts: {last_failure}"
            ),
        })
    }

    async fn send_once(&self, url: &str, query: &[(&str, String)]) -> RequestOutcome {
        let sent = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .query(query)
            .send()
            .await;

        let response = match sent {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return RequestOutcome::Transient(format!("request to {url} timed out: {e}"))
            }
            Err(e) if e.is_connect() => {
                return RequestOutcome::Transient(format!("connection to {url} failed: {e}"))
            }
            Err(e) => return RequestOutcome::Transient(format!("request to {url} failed: {e}")),
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse::<u64>().ok())
                .map(Duration::from_secs);
            return RequestOutcome::RateLimited {
                retry_after,
                message: format!("rate limited (429) by {url}"),
            };
        }
        if status.is_server_error() {
            return RequestOutcome::Transient(format!("HTTP {status} from {url}"));
        }
        if !status.is_success() {
            return RequestOutcome::Permanent(ExtractorError::FetchError {
                message: format!("HTTP {status} from {url}"),
            });
        }

        match response.json::<Value>().await {
            Ok(body) => RequestOutcome::Success(body),
            Err(e) => RequestOutcome::Permanent(ExtractorError::FetchError {
                message: format!("malformed JSON from {url}: {e}"),
            }),
        }
    }
}
