//! Adapters between the clipboard service and the outside world.
//!
//! - `http`: inbound HTTP API (axum)
//! - `webhook`: outbound webhook client for forwarding events (reqwest)

pub mod http;
pub mod webhook;

// Re-export the entry points
pub use http::{build_router, serve};
pub use webhook::{DrainReport, RetryPolicy, WebhookClient, WebhookError, WebhookQueue};
