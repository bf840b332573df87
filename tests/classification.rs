//! Classification Integration Tests
//!
//! Properties of payload classification that hold for any input.

use chrono::{TimeZone, Utc};
use ecopaste::core::preview::{MAX_PREVIEW_CHARS, URL_IMAGE_PREVIEW};
use ecopaste::core::{classify_at, detect_image, reconcile};
use ecopaste::domain::{ClipValue, RecordId, WebhookPayload};
use serde_json::json;

fn ingested_at() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap()
}

#[test]
fn test_declared_images_are_always_images() {
    let values = [
        ClipValue::from("data:image/png;base64,iVBOR"),
        ClipValue::from("plain words"),
        ClipValue::from(json!({"width": 10})),
        ClipValue::from(json!(null)),
    ];

    for value in values {
        let record = classify_at(WebhookPayload::new("image", value), ingested_at());
        assert!(record.is_image, "kind=image must classify as image");
    }
}

#[test]
fn test_non_string_values_get_empty_preview() {
    for kind in ["text", "html", "files", "rtf"] {
        let record = classify_at(
            WebhookPayload::new(kind, json!(["/tmp/a.png", "/tmp/b.txt"])),
            ingested_at(),
        );
        assert_eq!(record.preview, "");
        assert!(!record.is_image);
    }
}

#[test]
fn test_unknown_kinds_keep_value_untouched() {
    let payload = WebhookPayload::new("rtf", "{\\rtf1 hello}").with_subtype("rich");
    let record = classify_at(payload, ingested_at());

    assert_eq!(record.kind, "rtf");
    assert_eq!(record.value, ClipValue::from("{\\rtf1 hello}"));
    assert_eq!(record.subtype.as_deref(), Some("rich"));
    assert_eq!(record.preview, "");
    assert!(!record.is_image);
}

#[test]
fn test_preview_never_exceeds_limit() {
    let inputs = [
        "x".repeat(MAX_PREVIEW_CHARS - 1),
        "x".repeat(MAX_PREVIEW_CHARS),
        "x".repeat(MAX_PREVIEW_CHARS + 1),
        "é".repeat(MAX_PREVIEW_CHARS * 3),
        format!("<div>{}</div>", "word ".repeat(100)),
    ];

    for input in inputs {
        let record = classify_at(WebhookPayload::new("text", input.as_str()), ingested_at());
        assert!(record.preview.chars().count() <= MAX_PREVIEW_CHARS + 3);
    }
}

#[test]
fn test_image_urls_in_text_and_html() {
    for kind in ["text", "html"] {
        let record = classify_at(
            WebhookPayload::new(kind, "https://x.com/a.png"),
            ingested_at(),
        );
        assert!(record.is_image);
        assert_eq!(record.preview, URL_IMAGE_PREVIEW);
    }

    // Not a URL: no http prefix
    let record = classify_at(WebhookPayload::new("text", "see a.png"), ingested_at());
    assert!(!record.is_image);
    assert_eq!(record.preview, "see a.png");
}

#[test]
fn test_classifier_and_reconciler_agree() {
    let samples = [
        "https://cdn.example.com/pic.JPEG?size=large",
        "<img src=\"cat.gif\">",
        "http://example.com/page.html",
        "just text",
        "",
    ];

    for sample in samples {
        let classified = classify_at(WebhookPayload::new("text", sample), ingested_at());
        assert_eq!(classified.is_image, detect_image(sample).is_some());

        // A record stored without the flag is corrected to the same answer
        let mut stale = classified.clone().with_id(RecordId::generate());
        stale.is_image = false;
        let corrected = reconcile(vec![stale]);
        assert_eq!(corrected[0].is_image, classified.is_image, "sample: {sample}");
    }
}

#[test]
fn test_timestamp_fallback() {
    let record = classify_at(
        WebhookPayload::new("text", "a").with_timestamp("2024-01-02T03:04:05.678Z"),
        ingested_at(),
    );
    assert_eq!(
        record.timestamp,
        Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap() + chrono::Duration::milliseconds(678)
    );

    for bad in ["", "not a date", "2024-13-40T00:00:00Z"] {
        let record = classify_at(WebhookPayload::new("text", "a").with_timestamp(bad), ingested_at());
        assert_eq!(record.timestamp, ingested_at());
    }
}
