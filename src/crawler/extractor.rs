//! Content classification and link extraction
//!
//! Decides what kind of document a response body is, pulls outbound links
//! out of HTML, and caps stored content. Classification trusts the
//! Content-Type header first and falls back to sniffing a prefix of the
//! body when the header is absent or unhelpful.

use crate::url::canonicalize_url;
use crate::UrlError;
use scraper::{Html, Selector};
use url::Url;

/// How many leading bytes the sniffer inspects
const SNIFF_WINDOW: usize = 1024;

/// Classification of a fetched response body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Parseable HTML; links are extracted
    Html,
    /// Plain text; stored but never parsed for links
    Text,
    /// Binary payload; neither stored nor parsed
    Binary,
    /// Could not be classified; treated like binary
    Unknown,
}

impl ContentKind {
    /// Classifies a body from its Content-Type header, falling back to
    /// sniffing the first bytes when the header is missing or generic.
    pub fn detect(content_type: Option<&str>, body: &[u8]) -> Self {
        if let Some(header) = content_type {
            // Strip parameters like "; charset=utf-8"
            let mime = header
                .split(';')
                .next()
                .unwrap_or("")
                .trim()
                .to_ascii_lowercase();

            match mime.as_str() {
                "text/html" | "application/xhtml+xml" => return Self::Html,
                "" | "application/octet-stream" => {} // sniff instead
                m if m.starts_with("text/") => return Self::Text,
                m if m.starts_with("image/")
                    || m.starts_with("audio/")
                    || m.starts_with("video/")
                    || m.starts_with("font/") =>
                {
                    return Self::Binary
                }
                "application/pdf" | "application/zip" | "application/gzip" => {
                    return Self::Binary
                }
                _ => return Self::Unknown,
            }
        }
        Self::sniff(body)
    }

    /// Guesses the kind from the leading bytes of the body
    fn sniff(body: &[u8]) -> Self {
        let window = &body[..body.len().min(SNIFF_WINDOW)];
        if window.is_empty() {
            return Self::Unknown;
        }

        if let Ok(text) = std::str::from_utf8(window) {
            let lowered = text.trim_start().to_ascii_lowercase();
            if lowered.starts_with("<!doctype html") || lowered.starts_with("<html") {
                return Self::Html;
            }
            if !text.contains('\0') {
                return Self::Text;
            }
        }
        if window.contains(&0) {
            return Self::Binary;
        }
        Self::Unknown
    }
}

/// What the extractor produced for one fetched page
#[derive(Debug, Default)]
pub struct ExtractedPage {
    /// Stored body text, capped and absent for binary/unknown content
    pub content: Option<String>,

    /// Outbound links: absolute, canonical, in-page deduplicated, in
    /// document order
    pub links: Vec<Url>,
}

/// Extracts content and links from a response body.
///
/// `page_url` is the final URL after redirects, used as the base for
/// resolving relative links unless the document carries a `<base href>`.
/// Links that fail to resolve or canonicalize are skipped.
///
/// # Arguments
///
/// * `body` - Raw response body
/// * `content_type` - Content-Type header value, if any
/// * `page_url` - Final URL of the page
/// * `max_content_bytes` - Cap on stored content (0 stores nothing)
pub fn extract(
    body: &[u8],
    content_type: Option<&str>,
    page_url: &Url,
    max_content_bytes: usize,
) -> ExtractedPage {
    match ContentKind::detect(content_type, body) {
        ContentKind::Html => {
            let html = String::from_utf8_lossy(body);
            let document = Html::parse_document(&html);
            let base = base_url(&document, page_url);
            let links = collect_links(&document, &base);
            ExtractedPage {
                content: cap_content(&html, max_content_bytes),
                links,
            }
        }
        ContentKind::Text => ExtractedPage {
            content: cap_content(&String::from_utf8_lossy(body), max_content_bytes),
            links: Vec::new(),
        },
        ContentKind::Binary | ContentKind::Unknown => {
            tracing::debug!(
                "Skipping non-text content at {} ({})",
                page_url,
                content_type.unwrap_or("no content-type")
            );
            ExtractedPage::default()
        }
    }
}

/// Resolves the effective base URL, honoring the first valid `<base href>`
fn base_url(document: &Html, page_url: &Url) -> Url {
    let selector = Selector::parse("base[href]").expect("valid selector");
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .find_map(|href| page_url.join(href).ok())
        .unwrap_or_else(|| page_url.clone())
}

/// Collects anchor hrefs resolved against `base`, deduplicated in order
fn collect_links(document: &Html, base: &Url) -> Vec<Url> {
    let selector = Selector::parse("a[href]").expect("valid selector");
    let mut seen = std::collections::HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&selector) {
        let href = match element.value().attr("href") {
            Some(h) => h.trim(),
            None => continue,
        };
        if skip_href(href) {
            continue;
        }
        let resolved = match resolve(base, href) {
            Ok(url) => url,
            Err(_) => continue,
        };
        if seen.insert(resolved.as_str().to_string()) {
            links.push(resolved);
        }
    }
    links
}

/// True for hrefs that can never name a fetchable page
fn skip_href(href: &str) -> bool {
    if href.is_empty() || href.starts_with('#') {
        return true;
    }
    let lowered = href.to_ascii_lowercase();
    lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
}

/// Joins an href against the base and canonicalizes the result
fn resolve(base: &Url, href: &str) -> Result<Url, UrlError> {
    let joined = base.join(href).map_err(|e| UrlError::Parse(e.to_string()))?;
    canonicalize_url(&joined)
}

/// Truncates content to at most `max_bytes`, never splitting a character.
///
/// Returns `None` when the cap is zero.
fn cap_content(text: &str, max_bytes: usize) -> Option<String> {
    if max_bytes == 0 {
        return None;
    }
    if text.len() <= max_bytes {
        return Some(text.to_string());
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    Some(text[..end].to_string())
}
