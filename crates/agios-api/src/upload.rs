//! Upload validation: content sniffing, the MIME allow-list and file name
//! handling.

use std::path::Path;

/// Bytes inspected when sniffing content
const SNIFF_LEN: usize = 512;

/// Exact MIME types accepted besides every `text/*` and `image/*` type
const ALLOWED_EXACT: &[&str] = &[
    "application/pdf",
    "application/x-javascript",
    "application/x-python",
];

const ALLOWED_PREFIXES: &[&str] = &["text/", "image/"];

/// Guess the MIME type of `content` from its leading bytes.
///
/// Only signatures the service cares about are recognised; anything else is
/// `text/plain` when it looks like text and `application/octet-stream`
/// otherwise.
pub fn sniff_mime(content: &[u8]) -> &'static str {
    let head = &content[..content.len().min(SNIFF_LEN)];

    const SIGNATURES: &[(&[u8], &str)] = &[
        (b"%PDF-", "application/pdf"),
        (b"\x89PNG\r\n\x1a\n", "image/png"),
        (b"\xff\xd8\xff", "image/jpeg"),
        (b"GIF87a", "image/gif"),
        (b"GIF89a", "image/gif"),
        (b"PK\x03\x04", "application/zip"),
        (b"\x1f\x8b\x08", "application/x-gzip"),
        (b"Rar!\x1a\x07", "application/x-rar-compressed"),
        (b"\x7fELF", "application/octet-stream"),
        (b"{\\rtf", "text/rtf"),
        (b"\xef\xbb\xbf", "text/plain"),
        (b"\xfe\xff", "text/plain"),
        (b"\xff\xfe", "text/plain"),
    ];

    if let Some((_, mime)) = SIGNATURES.iter().find(|(magic, _)| head.starts_with(magic)) {
        return *mime;
    }

    if head.len() >= 12 && &head[..4] == b"RIFF" && &head[8..12] == b"WEBP" {
        return "image/webp";
    }

    if head.len() >= 12 && &head[4..8] == b"ftyp" {
        match &head[8..12] {
            b"heic" | b"heix" => return "image/heic",
            b"mif1" | b"msf1" | b"heif" => return "image/heif",
            _ => {}
        }
    }

    if let Some(markup) = sniff_markup(head) {
        return markup;
    }

    if head.iter().any(|b| is_binary(*b)) {
        "application/octet-stream"
    } else {
        "text/plain"
    }
}

fn sniff_markup(head: &[u8]) -> Option<&'static str> {
    let start = head.iter().position(|b| !b.is_ascii_whitespace())?;
    let text = String::from_utf8_lossy(&head[start..]).to_ascii_lowercase();

    if text.starts_with("<?xml") {
        return Some("text/xml");
    }
    const HTML_TAGS: &[&str] = &[
        "<!doctype html", "<html", "<head", "<body", "<script", "<iframe", "<style", "<title",
        "<table", "<div", "<p", "<h1", "<br", "<a", "<font", "<b", "<!--",
    ];
    HTML_TAGS
        .iter()
        .find(|tag| {
            text.strip_prefix(*tag)
                .and_then(|rest| rest.chars().next())
                .is_some_and(|c| c == ' ' || c == '>')
        })
        .map(|_| "text/html")
}

fn is_binary(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0b | 0x0e..=0x1a | 0x1c..=0x1f)
}

pub fn is_supported(mime: &str) -> bool {
    ALLOWED_EXACT.contains(&mime) || ALLOWED_PREFIXES.iter().any(|p| mime.starts_with(p))
}

/// Client file name reduced to a safe display name: no directories, no
/// markup or control characters
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control() && !matches!(c, '<' | '>' | '"' | '\'' | '&' | '`'))
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.');

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Storage name `<id><ext>`, keeping the original extension if there is one
pub fn storage_name(id: &str, original: &str) -> String {
    match Path::new(original).extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() => format!("{id}.{}", ext.to_ascii_lowercase()),
        _ => id.to_string(),
    }
}
