//! URL canonicalization and host keying
//!
//! All dedup and per-host bookkeeping in the crawler operates on canonical
//! URL forms produced by this module.

mod normalize;

pub use normalize::{canonicalize, canonicalize_url};

use url::Url;

/// Returns the per-host key for a URL: the lowercased host, plus the port
/// when it differs from the scheme default.
///
/// Two URLs with the same key share one politeness budget.
pub fn host_key(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_key_without_port() {
        let url = Url::parse("https://example.com/page").unwrap();
        assert_eq!(host_key(&url), "example.com");
    }

    #[test]
    fn test_host_key_with_explicit_port() {
        let url = Url::parse("http://example.com:8080/page").unwrap();
        assert_eq!(host_key(&url), "example.com:8080");
    }

    #[test]
    fn test_host_key_default_port_elided() {
        // The url crate drops the default port for the scheme
        let url = Url::parse("https://example.com:443/page").unwrap();
        assert_eq!(host_key(&url), "example.com");
    }
}
