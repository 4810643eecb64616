//! Page-URL canonicalization.
//!
//! A thread is keyed by `origin + pathname` with a trailing slash enforced;
//! query string and fragment never participate in the key. URL parsing
//! lower-cases scheme and host, while path case is preserved:
//! `https://Example.com/Page?x=1#y` → `https://example.com/Page/`.

use reqwest::Url;

/// Normalize a page link into the canonical thread-lookup key.
///
/// Returns `None` for absent or unparseable input, which callers treat as
/// "explore all" (a wider cache key), not as an error.
pub fn normalize_page_url(link: Option<&str>) -> Option<String> {
    let link = link?.trim();
    if link.is_empty() {
        return None;
    }
    let url = Url::parse(link).ok()?;
    // Opaque origins (data:, mailto:, ...) have no host to key on.
    url.host_str()?;

    let origin = url.origin().ascii_serialization();
    let path = url.path();
    let mut normalized = format!("{origin}{path}");
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Some(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_query_and_fragment() {
        assert_eq!(
            normalize_page_url(Some("https://example.com/page?x=1#y")),
            Some("https://example.com/page/".to_string())
        );
    }

    #[test]
    fn test_host_lowercased_path_preserved() {
        assert_eq!(
            normalize_page_url(Some("https://Example.com/Page?x=1#y")),
            Some("https://example.com/Page/".to_string())
        );
    }

    #[test]
    fn test_trailing_slash_enforced() {
        assert_eq!(
            normalize_page_url(Some("https://example.com")),
            Some("https://example.com/".to_string())
        );
        assert_eq!(
            normalize_page_url(Some("https://example.com/a/b/")),
            Some("https://example.com/a/b/".to_string())
        );
    }

    #[test]
    fn test_already_normalized_is_stable() {
        let once = normalize_page_url(Some("https://example.com/Page?x=1")).unwrap();
        assert_eq!(normalize_page_url(Some(&once)), Some(once.clone()));
    }

    #[test]
    fn test_unparseable_means_explore_all() {
        assert_eq!(normalize_page_url(None), None);
        assert_eq!(normalize_page_url(Some("")), None);
        assert_eq!(normalize_page_url(Some("not a url")), None);
        assert_eq!(normalize_page_url(Some("mailto:a@b.c")), None);
    }

    #[test]
    fn test_non_default_port_kept() {
        assert_eq!(
            normalize_page_url(Some("http://localhost:3000/thread?q=2")),
            Some("http://localhost:3000/thread/".to_string())
        );
    }
}
