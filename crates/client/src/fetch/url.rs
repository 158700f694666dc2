//! URL canonicalization for consistent request identities.

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Canonicalize an absolute URL string so equal resources share one identity.
///
/// Trims whitespace, defaults a missing scheme to `https`, and drops the
/// fragment. Host lowercasing comes from the URL parser for http(s); the
/// query string is kept as-is since it is part of the request identity.
pub fn canonicalize(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let url_str = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };

    let mut parsed = url::Url::parse(&url_str).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Resolve a request target against the application origin.
///
/// Paths starting with `/` are joined onto `origin` (a seed asset such as
/// `/index.html`, or a page-relative fetch); anything else must be an
/// absolute URL and is canonicalized.
pub fn resolve(origin: &str, target: &str) -> Result<url::Url, UrlError> {
    let trimmed = target.trim();
    if trimmed.starts_with('/') && !trimmed.starts_with("//") {
        let base = canonicalize(origin)?;
        let mut joined = base.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
        joined.set_fragment(None);
        return Ok(joined);
    }
    canonicalize(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_lowercase_host_keeps_query() {
        let url = canonicalize("  https://IMAGES.Unsplash.com/photo-1?w=400#frag ").unwrap();
        assert_eq!(url.as_str(), "https://images.unsplash.com/photo-1?w=400");
    }

    #[test]
    fn test_canonicalize_default_scheme() {
        let url = canonicalize("cocktails.example/app.css").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.path(), "/app.css");
    }

    #[test]
    fn test_canonicalize_unsupported_scheme() {
        let result = canonicalize("chrome-extension://abc/background.js");
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_canonicalize_empty() {
        assert!(matches!(canonicalize("   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_resolve_root_relative() {
        let url = resolve("http://localhost:5173", "/index.html").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5173/index.html");
    }

    #[test]
    fn test_resolve_root() {
        let url = resolve("https://Cocktails.example", "/").unwrap();
        assert_eq!(url.as_str(), "https://cocktails.example/");
    }

    #[test]
    fn test_resolve_keeps_query_drops_fragment() {
        let url = resolve("https://cocktails.example", "/api/list?spirit=gin#top").unwrap();
        assert_eq!(url.as_str(), "https://cocktails.example/api/list?spirit=gin");
    }

    #[test]
    fn test_resolve_absolute_ignores_origin() {
        let url = resolve("https://cocktails.example", "https://images.unsplash.com/photo-1?w=400").unwrap();
        assert_eq!(url.host_str(), Some("images.unsplash.com"));
    }

    #[test]
    fn test_resolve_bad_origin() {
        assert!(matches!(resolve("ftp://x", "/index.html"), Err(UrlError::UnsupportedScheme(_))));
    }
}
