//! Core clipboard logic.
//!
//! This module contains:
//! - Preview: preview text and image detection
//! - Classifier: payload → record normalization
//! - Query: filter and pagination planning
//! - Reconcile: read-time image flag correction
//! - Service: the above wired to a store with deadlines

pub mod classifier;
pub mod preview;
pub mod query;
pub mod reconcile;
pub mod service;

// Re-export commonly used types
pub use classifier::{classify, classify_at};
pub use preview::{detect_image, ImageSignal, Preview};
pub use query::{plan, FilterSpec, PageResponse, PageWindow, QueryParams, QueryPlan, SortOrder, TypeFilter};
pub use reconcile::reconcile;
pub use service::{ClipboardService, Deadlines, ServiceError};
