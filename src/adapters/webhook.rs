//! Outbound webhook client for forwarding clipboard events.
//!
//! Sends payloads to another instance's `/api/webhook` endpoint. The queue
//! delivers in order; a failing head item is retried after a delay and
//! dropped once it has used up its attempts.

use std::collections::VecDeque;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, warn};

use crate::domain::WebhookPayload;

/// Errors that can occur delivering a payload
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Webhook URL is not configured")]
    MissingUrl,

    #[error("Webhook request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP error! status: {status}: {body}")]
    Status { status: u16, body: String },
}

/// HTTP client for one webhook endpoint
#[derive(Debug, Clone)]
pub struct WebhookClient {
    url: String,
    client: reqwest::Client,
}

impl WebhookClient {
    /// Create a client for the given endpoint URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Create a client whose requests give up after `timeout`
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST one payload as JSON. Any non-2xx status is a failure.
    pub async fn send(&self, payload: &WebhookPayload) -> Result<(), WebhookError> {
        if self.url.is_empty() {
            return Err(WebhookError::MissingUrl);
        }

        let response = self.client.post(&self.url).json(payload).send().await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(WebhookError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

/// Retry behavior for queued deliveries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per item before it is dropped
    pub max_retries: u32,

    /// Pause between attempts on the same item
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Clone)]
struct QueuedPayload {
    payload: WebhookPayload,
    attempts: u32,
}

/// Outcome of draining the queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub delivered: usize,
    pub dropped: usize,
}

/// FIFO delivery queue with per-item retries
pub struct WebhookQueue {
    client: WebhookClient,
    policy: RetryPolicy,
    items: VecDeque<QueuedPayload>,
}

impl WebhookQueue {
    /// Create an empty queue
    pub fn new(client: WebhookClient, policy: RetryPolicy) -> Self {
        Self {
            client,
            policy,
            items: VecDeque::new(),
        }
    }

    /// Add a payload to the back of the queue
    pub fn push(&mut self, payload: WebhookPayload) {
        self.items.push_back(QueuedPayload {
            payload,
            attempts: 0,
        });
    }

    /// Number of payloads waiting
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if nothing is waiting
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Discard everything waiting
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Deliver every queued payload in order
    pub async fn drain(&mut self) -> DrainReport {
        let mut report = DrainReport::default();

        while let Some(head) = self.items.front_mut() {
            match self.client.send(&head.payload).await {
                Ok(()) => {
                    debug!(kind = %head.payload.kind, "Webhook delivered");
                    self.items.pop_front();
                    report.delivered += 1;
                }
                Err(e) => {
                    head.attempts += 1;
                    warn!(attempt = head.attempts, error = %e, "Webhook request failed");

                    if head.attempts >= self.policy.max_retries {
                        error!("Max retries reached, removing item from queue");
                        self.items.pop_front();
                        report.dropped += 1;
                    } else {
                        tokio::time::sleep(self.policy.retry_delay).await;
                    }
                }
            }
        }

        report
    }
}
