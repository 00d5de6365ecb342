use crate::{UrlError, UrlResult};
use url::Url;

/// Canonicalizes a URL string into the form used for dedup identity.
///
/// # Canonicalization Steps
///
/// 1. Parse the URL; reject if malformed or relative
/// 2. Reject schemes other than http/https
/// 3. Require a host
/// 4. Strip the fragment
/// 5. Sort query parameters by key (stable for equal keys)
/// 6. Drop an empty query string entirely
///
/// Host lowercasing and dot-segment removal (`.` and `..`) are performed by
/// the `url` crate during parsing. Scheme, path case, and query values are
/// preserved: canonicalization must never merge URLs that a server could
/// treat as distinct resources.
///
/// # Examples
///
/// ```
/// use gleaner::canonicalize;
///
/// let url = canonicalize("http://EXAMPLE.com/a/../b?z=1&a=2#frag").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/b?a=2&z=1");
/// ```
pub fn canonicalize(url_str: &str) -> UrlResult<Url> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(UrlError::UnsupportedScheme(other.to_string())),
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);

    if url.query().is_some() {
        let mut pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));

        if pairs.is_empty() {
            url.set_query(None);
        } else {
            let query = pairs
                .iter()
                .map(|(k, v)| {
                    if v.is_empty() {
                        k.clone()
                    } else {
                        format!("{}={}", k, v)
                    }
                })
                .collect::<Vec<_>>()
                .join("&");
            url.set_query(Some(&query));
        }
    }

    Ok(url)
}

/// Canonicalizes an already-parsed URL in place, returning its canonical form.
///
/// Used for URLs produced by joining relative links against a base, which
/// are parsed but not yet canonical.
pub fn canonicalize_url(url: &Url) -> UrlResult<Url> {
    canonicalize(url.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_host() {
        let result = canonicalize("https://EXAMPLE.COM/Page").unwrap();
        assert_eq!(result.as_str(), "https://example.com/Page");
    }

    #[test]
    fn test_scheme_preserved() {
        let result = canonicalize("http://example.com/page").unwrap();
        assert_eq!(result.scheme(), "http");
    }

    #[test]
    fn test_strip_fragment() {
        let result = canonicalize("https://example.com/page#section").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_sort_query_params() {
        let result = canonicalize("https://example.com/page?b=2&a=1").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page?a=1&b=2");
    }

    #[test]
    fn test_empty_query_dropped() {
        let result = canonicalize("https://example.com/page?").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_valueless_query_key_kept() {
        let result = canonicalize("https://example.com/page?flag").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page?flag");
    }

    #[test]
    fn test_dot_segments_removed() {
        let result = canonicalize("https://example.com/a/../b/./c").unwrap();
        assert_eq!(result.as_str(), "https://example.com/b/c");
    }

    #[test]
    fn test_empty_path_becomes_root() {
        let result = canonicalize("https://example.com").unwrap();
        assert_eq!(result.as_str(), "https://example.com/");
    }

    #[test]
    fn test_reject_unsupported_scheme() {
        let result = canonicalize("ftp://example.com/file");
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_reject_relative_url() {
        let result = canonicalize("/just/a/path");
        assert!(matches!(result, Err(UrlError::Parse(_))));
    }

    #[test]
    fn test_reject_malformed() {
        assert!(canonicalize("not a url").is_err());
    }

    #[test]
    fn test_whitespace_trimmed() {
        let result = canonicalize("  https://example.com/page  ").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_identity_stable() {
        // Canonicalizing a canonical URL is a no-op
        let once = canonicalize("https://Example.com/a/?b=2&a=1#x").unwrap();
        let twice = canonicalize(once.as_str()).unwrap();
        assert_eq!(once, twice);
    }
}
