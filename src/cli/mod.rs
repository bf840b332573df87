//! Command-line interface for ecopaste.
//!
//! Provides commands for running the HTTP service, ingesting and listing
//! clipboard records locally, deleting records, and forwarding events to
//! a remote instance.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::adapters::http;
use crate::adapters::webhook::{WebhookClient, WebhookQueue};
use crate::config::{self, ResolvedConfig};
use crate::core::{ClipboardService, PageResponse, QueryParams};
use crate::domain::{ClipValue, WebhookPayload};
use crate::store::{ClipboardStore, MemoryStore, SqliteStore};

/// ecopaste - Clipboard history service
#[derive(Parser, Debug)]
#[command(name = "ecopaste")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP service
    Serve {
        /// Address to bind to (overrides config)
        #[arg(short, long)]
        bind: Option<String>,

        /// Keep history in memory instead of the database
        #[arg(long)]
        memory: bool,
    },

    /// Classify and store a clipboard event locally
    Ingest {
        /// Content kind (text, html, image, ...)
        kind: String,

        /// Content value
        value: String,

        /// Optional subtype hint
        #[arg(long)]
        subtype: Option<String>,

        /// RFC 3339 timestamp (defaults to now)
        #[arg(long)]
        timestamp: Option<String>,

        /// Parse the value as JSON instead of plain text
        #[arg(long)]
        json: bool,
    },

    /// List stored clipboard records, newest first
    List {
        /// Page number (starts at 1)
        #[arg(short, long, allow_hyphen_values = true)]
        page: Option<i64>,

        /// Records per page (1-100)
        #[arg(long, allow_hyphen_values = true)]
        page_size: Option<i64>,

        /// Filter: all, image or text
        #[arg(short = 't', long = "type")]
        type_filter: Option<String>,

        /// Case-insensitive preview search
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Delete a stored record
    Delete {
        /// Record ID
        id: String,
    },

    /// Send a clipboard event to a remote webhook
    Push {
        /// Content kind (text, html, image, ...)
        kind: String,

        /// Content value
        value: String,

        /// Optional subtype hint
        #[arg(long)]
        subtype: Option<String>,

        /// Webhook URL (overrides config)
        #[arg(long, env = "ECOPASTE_WEBHOOK_URL")]
        url: Option<String>,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let cfg = config::config()?;

        match self.command {
            Commands::Serve { bind, memory } => serve(cfg, bind, memory).await,
            Commands::Ingest {
                kind,
                value,
                subtype,
                timestamp,
                json,
            } => ingest(cfg, kind, value, subtype, timestamp, json).await,
            Commands::List {
                page,
                page_size,
                type_filter,
                search,
            } => {
                let params = QueryParams {
                    page,
                    page_size,
                    type_filter,
                    search,
                };
                list(cfg, params).await
            }
            Commands::Delete { id } => delete(cfg, &id).await,
            Commands::Push {
                kind,
                value,
                subtype,
                url,
            } => push(cfg, kind, value, subtype, url).await,
            Commands::Config => show_config(cfg),
        }
    }
}

/// Open the configured database
fn open_store(cfg: &ResolvedConfig) -> Result<SqliteStore> {
    if let Some(parent) = cfg.database.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory: {}", parent.display()))?;
    }

    SqliteStore::open(&cfg.database)
        .with_context(|| format!("Failed to open database: {}", cfg.database.display()))
}

/// Build the service over the configured database
fn open_service(cfg: &ResolvedConfig) -> Result<ClipboardService> {
    let store: Arc<dyn ClipboardStore> = Arc::new(open_store(cfg)?);
    Ok(ClipboardService::with_deadlines(store, cfg.timeouts.deadlines()))
}

/// Run the HTTP service
async fn serve(cfg: &ResolvedConfig, bind: Option<String>, memory: bool) -> Result<()> {
    let store: Arc<dyn ClipboardStore> = if memory {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(open_store(cfg)?)
    };
    let service = Arc::new(ClipboardService::with_deadlines(store, cfg.timeouts.deadlines()));

    let address = bind.unwrap_or_else(|| cfg.bind.clone());
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    http::serve(listener, service).await
}

fn build_payload(
    kind: String,
    value: String,
    subtype: Option<String>,
    as_json: bool,
) -> Result<WebhookPayload> {
    let value = if as_json {
        let parsed: serde_json::Value =
            serde_json::from_str(&value).context("Value is not valid JSON")?;
        ClipValue::from(parsed)
    } else {
        ClipValue::from(value)
    };

    let mut payload = WebhookPayload::new(kind, value);
    payload.subtype = subtype;
    Ok(payload)
}

/// Classify and store one event
async fn ingest(
    cfg: &ResolvedConfig,
    kind: String,
    value: String,
    subtype: Option<String>,
    timestamp: Option<String>,
    as_json: bool,
) -> Result<()> {
    let mut payload = build_payload(kind, value, subtype, as_json)?;
    payload.timestamp = timestamp;

    let service = open_service(cfg)?;
    let record = service.ingest(payload).await?;

    eprintln!("Stored clipboard record");
    eprintln!("   ID: {}", record.id);
    eprintln!("   Type: {}", record.kind);
    eprintln!("   Image: {}", record.is_image);
    eprintln!("   Timestamp: {}", record.timestamp.to_rfc3339());
    if !record.preview.is_empty() {
        eprintln!("   Preview: {}", record.preview);
    }

    Ok(())
}

/// Print one page of history
async fn list(cfg: &ResolvedConfig, params: QueryParams) -> Result<()> {
    let service = open_service(cfg)?;
    let page = service.list(params).await?;
    print_page(&page);
    Ok(())
}

fn print_page(page: &PageResponse) {
    if page.items.is_empty() {
        println!("No clipboard records found");
    } else {
        println!(
            "{:<38} {:<8} {:<6} {:<26} {:<40}",
            "ID", "TYPE", "IMAGE", "TIMESTAMP", "PREVIEW"
        );
        println!("{}", "-".repeat(120));

        for item in &page.items {
            let preview: String = item.preview.chars().take(40).collect();
            println!(
                "{:<38} {:<8} {:<6} {:<26} {:<40}",
                item.id.as_str(),
                item.kind,
                if item.is_image { "yes" } else { "no" },
                item.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
                preview
            );
        }
    }

    println!(
        "\nPage {}/{} ({} per page, {} total)",
        page.page, page.total_pages, page.page_size, page.total
    );
}

/// Delete one record
async fn delete(cfg: &ResolvedConfig, id: &str) -> Result<()> {
    let service = open_service(cfg)?;
    service.delete(id).await?;
    eprintln!("Deleted {}", id);
    Ok(())
}

/// Forward one event to a remote webhook
async fn push(
    cfg: &ResolvedConfig,
    kind: String,
    value: String,
    subtype: Option<String>,
    url: Option<String>,
) -> Result<()> {
    let url = url
        .or_else(|| cfg.webhook.url.clone())
        .context("No webhook URL. Use --url or set webhook.url in config")?;

    let mut payload = WebhookPayload::now(kind, value);
    payload.subtype = subtype;

    let mut queue = WebhookQueue::new(WebhookClient::new(url.clone()), cfg.webhook.retry_policy());
    queue.push(payload);
    let report = queue.drain().await;

    if report.dropped > 0 {
        anyhow::bail!("Failed to deliver clipboard event to {}", url);
    }

    eprintln!("Delivered clipboard event to {}", url);
    Ok(())
}

/// Show the resolved configuration (for debugging)
fn show_config(cfg: &ResolvedConfig) -> Result<()> {
    println!("ecopaste configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:     {}", cfg.home.display());
    println!("  Database: {}", cfg.database.display());
    println!();
    println!("Server:");
    println!("  Bind: {}", cfg.bind);
    println!();
    println!("Store deadlines:");
    println!("  Insert: {}s", cfg.timeouts.insert_seconds);
    println!("  Query:  {}s", cfg.timeouts.query_seconds);
    println!("  Delete: {}s", cfg.timeouts.delete_seconds);
    println!();
    println!("Webhook:");
    println!("  URL:         {}", cfg.webhook.url.as_deref().unwrap_or("(not set)"));
    println!("  Max retries: {}", cfg.webhook.max_retries);
    println!("  Retry delay: {}ms", cfg.webhook.retry_delay_ms);

    Ok(())
}
