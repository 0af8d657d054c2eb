use sha2::{Digest, Sha256};
use url::form_urlencoded;
use url::Url;

/// Query parameters that only carry campaign/referral tracking.
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "ref",
    "source",
    "fbclid",
    "gclid",
    "mc_cid",
    "mc_eid",
];

/// Normalizes an article link so the same story reached through different
/// share links maps to one identifier.
///
/// - Scheme and host are lowercased (the `url` crate does this on parse)
/// - A leading `www.` is dropped from the host
/// - Trailing slashes are removed from the path; path case is preserved
/// - The fragment is dropped
/// - Tracking parameters are removed, remaining parameters keep their order
///
/// Links that do not parse as absolute URLs are returned trimmed.
///
/// # Examples
///
/// ```
/// use bionews::util::normalize_url;
///
/// assert_eq!(
///     normalize_url("https://www.Example.com/News/?utm_source=x#top"),
///     "https://example.com/News"
/// );
/// ```
pub fn normalize_url(link: &str) -> String {
    let trimmed = link.trim();
    let url = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(_) => return trimmed.to_string(),
    };

    let host = url.host_str().unwrap_or("");
    let host = host.strip_prefix("www.").unwrap_or(host);

    let mut normalized = format!("{}://{}", url.scheme(), host);
    if let Some(port) = url.port() {
        normalized.push(':');
        normalized.push_str(&port.to_string());
    }
    normalized.push_str(url.path().trim_end_matches('/'));

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.to_ascii_lowercase().as_str()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if !kept.is_empty() {
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(kept)
            .finish();
        normalized.push('?');
        normalized.push_str(&query);
    }

    normalized
}

/// Stable identifier for an article: hex SHA-256 of its normalized link.
pub fn article_id(link: &str) -> String {
    let hash = Sha256::digest(normalize_url(link).as_bytes());
    format!("{:x}", hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_www_prefix() {
        assert_eq!(
            normalize_url("https://www.example.com/article"),
            "https://example.com/article"
        );
    }

    #[test]
    fn test_removes_trailing_slash() {
        assert_eq!(
            normalize_url("https://example.com/article/"),
            "https://example.com/article"
        );
    }

    #[test]
    fn test_lowercases_domain_only() {
        assert_eq!(
            normalize_url("https://Example.COM/Article"),
            "https://example.com/Article"
        );
    }

    #[test]
    fn test_removes_utm_parameters() {
        assert_eq!(
            normalize_url("https://example.com/article?utm_source=twitter&utm_medium=social"),
            "https://example.com/article"
        );
    }

    #[test]
    fn test_tracking_param_names_case_insensitive() {
        assert_eq!(
            normalize_url("https://example.com/article?UTM_Source=feed"),
            "https://example.com/article"
        );
    }

    #[test]
    fn test_preserves_non_tracking_parameters() {
        assert_eq!(
            normalize_url("https://example.com/article?id=123"),
            "https://example.com/article?id=123"
        );
    }

    #[test]
    fn test_mixed_tracking_and_real_params() {
        let result = normalize_url("https://example.com/article?page=2&utm_campaign=test");
        assert_eq!(result, "https://example.com/article?page=2");
    }

    #[test]
    fn test_removes_fragment() {
        assert_eq!(
            normalize_url("https://example.com/article#section"),
            "https://example.com/article"
        );
    }

    #[test]
    fn test_handles_empty_path() {
        assert_eq!(normalize_url("https://example.com"), "https://example.com");
    }

    #[test]
    fn test_removes_fbclid() {
        assert_eq!(
            normalize_url("https://example.com/article?fbclid=abc123"),
            "https://example.com/article"
        );
    }

    #[test]
    fn test_keeps_explicit_port() {
        assert_eq!(
            normalize_url("http://example.com:8080/a/"),
            "http://example.com:8080/a"
        );
    }

    #[test]
    fn test_unparseable_link_returned_trimmed() {
        assert_eq!(normalize_url("  not a url  "), "not a url");
    }

    #[test]
    fn test_article_id_ignores_tracking_variants() {
        let a = article_id("https://www.example.com/story?utm_source=rss");
        let b = article_id("https://example.com/story/");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_article_id_differs_per_path() {
        assert_ne!(
            article_id("https://example.com/story-1"),
            article_id("https://example.com/story-2")
        );
    }
}
