//! Preview extraction and image detection.
//!
//! Turns raw clipboard text plus its declared kind into a short display
//! string and an image flag. The image heuristics here are the single
//! source of truth for both ingestion and read-time reconciliation.

/// Preview for image content and for HTML carrying an `<img src=...>` tag
pub const IMAGE_PREVIEW: &str = "Image";

/// Preview for image content carried inline as a base64 data URI
pub const BASE64_IMAGE_PREVIEW: &str = "Image (base64)";

/// Preview for text that is a link to an image
pub const URL_IMAGE_PREVIEW: &str = "Image (URL)";

/// Maximum preview length in characters (excluding the ellipsis)
pub const MAX_PREVIEW_CHARS: usize = 200;

/// Appended to truncated previews
pub const ELLIPSIS: &str = "...";

const BASE64_MARKER: &str = "base64,";

const IMAGE_EXTENSIONS: [&str; 7] = [".jpg", ".jpeg", ".png", ".gif", ".webp", ".bmp", ".svg"];

/// Why a piece of text was recognized as an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSignal {
    /// HTML containing an image tag with a source attribute
    InlineMarkup,

    /// An http(s) link whose path names an image file
    Url,
}

impl ImageSignal {
    /// Fixed preview shown for this kind of image
    pub fn preview(self) -> &'static str {
        match self {
            ImageSignal::InlineMarkup => IMAGE_PREVIEW,
            ImageSignal::Url => URL_IMAGE_PREVIEW,
        }
    }
}

/// Result of preview extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub text: String,
    pub is_image: bool,
}

impl Preview {
    fn image(text: &str) -> Self {
        Self {
            text: text.to_string(),
            is_image: true,
        }
    }
}

/// Detect image-bearing text.
///
/// Markup wins over URL detection so that HTML fragments linking to an
/// image file are still previewed as inline images.
pub fn detect_image(text: &str) -> Option<ImageSignal> {
    if has_inline_image_markup(text) {
        Some(ImageSignal::InlineMarkup)
    } else if is_image_url(text) {
        Some(ImageSignal::Url)
    } else {
        None
    }
}

/// True if the text contains both an `<img` opener and a `src=` attribute
pub fn has_inline_image_markup(text: &str) -> bool {
    text.contains("<img") && text.contains("src=")
}

/// True if the text starts with `http` and mentions an image extension
pub fn is_image_url(text: &str) -> bool {
    if !text.starts_with("http") {
        return false;
    }

    let lower = text.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.contains(ext))
}

/// Build the preview and image flag for a string value of the given kind
pub fn extract(value: &str, kind: &str) -> Preview {
    match kind {
        "image" => Preview::image(image_preview(value)),
        "text" | "html" => match detect_image(value) {
            Some(signal) => Preview::image(signal.preview()),
            None => Preview {
                text: text_preview(value),
                is_image: false,
            },
        },
        _ => Preview {
            text: String::new(),
            is_image: false,
        },
    }
}

/// Fixed marker for declared image content
pub fn image_preview(value: &str) -> &'static str {
    if value.contains(BASE64_MARKER) {
        BASE64_IMAGE_PREVIEW
    } else {
        IMAGE_PREVIEW
    }
}

/// Strip tags, trim, and cap the result at [`MAX_PREVIEW_CHARS`]
pub fn text_preview(value: &str) -> String {
    let text = strip_html_tags(value);

    match text.char_indices().nth(MAX_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}{}", &text[..cut], ELLIPSIS),
        None => text,
    }
}

/// Remove every `<...>` span and trim surrounding whitespace.
///
/// An unmatched `<` stops stripping; it and everything after it are kept.
pub fn strip_html_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(start) = rest.find('<') {
        match rest[start..].find('>') {
            Some(len) => {
                out.push_str(&rest[..start]);
                rest = &rest[start + len + 1..];
            }
            None => break,
        }
    }
    out.push_str(rest);

    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html_tags() {
        assert_eq!(strip_html_tags("<p>Hello <b>world</b></p>"), "Hello world");
        assert_eq!(strip_html_tags("  plain text \n"), "plain text");
        assert_eq!(strip_html_tags("<br/><hr>"), "");
        assert_eq!(strip_html_tags(""), "");
    }

    #[test]
    fn test_strip_unmatched_open_bracket() {
        assert_eq!(strip_html_tags("<i>a</i> < b"), "a < b");
        assert_eq!(strip_html_tags("x <b>y</b> <unclosed"), "x y <unclosed");
        // A lone `>` is ordinary text
        assert_eq!(strip_html_tags("a > b"), "a > b");
    }

    #[test]
    fn test_text_preview_truncation() {
        let exact = "a".repeat(MAX_PREVIEW_CHARS);
        assert_eq!(text_preview(&exact), exact);

        let long = "b".repeat(MAX_PREVIEW_CHARS + 1);
        let preview = text_preview(&long);
        assert_eq!(preview, format!("{}...", "b".repeat(MAX_PREVIEW_CHARS)));
    }

    #[test]
    fn test_text_preview_counts_characters() {
        let long = "é".repeat(MAX_PREVIEW_CHARS + 10);
        let preview = text_preview(&long);
        assert!(preview.ends_with(ELLIPSIS));
        assert_eq!(preview.chars().count(), MAX_PREVIEW_CHARS + ELLIPSIS.len());
    }

    #[test]
    fn test_is_image_url() {
        assert!(is_image_url("https://x.com/a.png"));
        assert!(is_image_url("http://cdn.example.com/photos/CAT.JPEG?size=large"));
        assert!(is_image_url("https://example.com/logo.svg"));
        assert!(!is_image_url("https://example.com/index.html"));
        assert!(!is_image_url("ftp://example.com/a.png"));
        assert!(!is_image_url("see https://x.com/a.png"));
    }

    #[test]
    fn test_detect_image() {
        assert_eq!(
            detect_image(r#"<div><img class="x" src="a.png"></div>"#),
            Some(ImageSignal::InlineMarkup)
        );
        assert_eq!(detect_image("https://x.com/a.gif"), Some(ImageSignal::Url));
        assert_eq!(detect_image("<img alt='no source'>"), None);
        assert_eq!(detect_image("hello"), None);
    }

    #[test]
    fn test_extract_by_kind() {
        let p = extract("data:image/png;base64,iVBORw0KGgo=", "image");
        assert_eq!(p, Preview::image(BASE64_IMAGE_PREVIEW));

        let p = extract("/Users/me/Pictures/cat.png", "image");
        assert_eq!(p, Preview::image(IMAGE_PREVIEW));

        let p = extract(r#"<p><img src="x.png"></p>"#, "html");
        assert_eq!(p, Preview::image(IMAGE_PREVIEW));

        let p = extract("https://x.com/a.png", "text");
        assert_eq!(p, Preview::image(URL_IMAGE_PREVIEW));

        let p = extract("<p>Hello</p>", "html");
        assert_eq!(p.text, "Hello");
        assert!(!p.is_image);

        let p = extract("{\\rtf1 hello}", "rtf");
        assert_eq!(p.text, "");
        assert!(!p.is_image);
    }
}
