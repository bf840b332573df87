//! HTTP API for the clipboard service.
//!
//! Routes:
//! - `POST   /api/webhook`         ingest one clipboard event
//! - `GET    /api/clipboard`       paginated, filtered history
//! - `DELETE /api/clipboard/{id}`  delete one record
//! - `GET    /health`              liveness probe

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{delete, get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::{ClipboardService, PageResponse, QueryParams, ServiceError};
use crate::domain::WebhookPayload;
use crate::store::StoreOperation;

/// Success body for writes
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

/// Failure body
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HealthResponse {
    pub status: String,
}

/// History query string. Values stay raw so bad input clamps instead of 400ing.
#[derive(Debug, Default)]
pub struct ListQuery {
    page: Option<String>,
    page_size: Option<String>,
    type_filter: Option<String>,
    search: Option<String>,
}

impl ListQuery {
    /// Collect known parameters, keeping the first value of a repeated key
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();

        for (key, value) in pairs {
            let slot = match key.as_str() {
                "page" => &mut query.page,
                "pageSize" => &mut query.page_size,
                "type" => &mut query.type_filter,
                "search" => &mut query.search,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }

        query
    }
}

impl From<ListQuery> for QueryParams {
    fn from(q: ListQuery) -> Self {
        QueryParams::from_query_strings(
            q.page.as_deref(),
            q.page_size.as_deref(),
            q.type_filter.as_deref(),
            q.search.as_deref(),
        )
    }
}

/// An error rendered as `{"error": ...}` with a status code
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::InvalidId(_) => ApiError::new(StatusCode::BAD_REQUEST, "Invalid ID"),
            ServiceError::NotFound(_) => ApiError::new(StatusCode::NOT_FOUND, "Item not found"),
            ServiceError::Storage { operation, .. } => {
                let message = match operation {
                    StoreOperation::Insert => "Failed to save data",
                    StoreOperation::Count => "Failed to count documents",
                    StoreOperation::Find => "Failed to fetch data",
                    StoreOperation::Delete => "Failed to delete item",
                };
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

async fn webhook_handler(
    State(service): State<Arc<ClipboardService>>,
    payload: Result<Json<WebhookPayload>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "Rejected webhook payload");
        ApiError::new(StatusCode::BAD_REQUEST, rejection.body_text())
    })?;

    service.ingest(payload).await?;
    Ok(MessageResponse::new("Data received successfully"))
}

async fn list_handler(
    State(service): State<Arc<ClipboardService>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<PageResponse>, ApiError> {
    let query = ListQuery::from_pairs(pairs);
    let page = service.list(query.into()).await?;
    Ok(Json(page))
}

async fn delete_handler(
    State(service): State<Arc<ClipboardService>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    service.delete(&id).await?;
    Ok(MessageResponse::new("Item deleted successfully"))
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Build the HTTP API router over the given service.
pub fn build_router(service: Arc<ClipboardService>) -> Router {
    Router::new()
        .route("/api/webhook", post(webhook_handler))
        .route("/api/clipboard", get(list_handler))
        .route("/api/clipboard/{id}", delete(delete_handler))
        .route("/health", get(health_handler))
        .with_state(service)
}

/// Serve the API on a bound listener until Ctrl-C
pub async fn serve(listener: TcpListener, service: Arc<ClipboardService>) -> Result<()> {
    let addr = listener.local_addr().context("Failed to read listener address")?;
    info!(%addr, store = service.store_name(), "Server starting");

    axum::serve(listener, build_router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down"),
        Err(e) => {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
