//! Endpoint and URL helpers.
//!
//! The remote API hands out a mix of relative paths (`/files/x.gpkg`,
//! `files/x.gpkg`) and absolute URLs. Everything outbound goes through
//! [`resolve`] so there is exactly one slash between the base and the path.

use url::Url;

use crate::error::FetchError;

/// Returns true if `endpoint` carries its own http(s) scheme.
pub fn is_absolute(endpoint: &str) -> bool {
    endpoint.starts_with("http://") || endpoint.starts_with("https://")
}

/// Joins a relative endpoint onto `base` with exactly one separating slash.
pub fn join(base: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

/// Resolves `endpoint` against `base`, keeping absolute URLs verbatim.
pub fn resolve(base: &str, endpoint: &str) -> String {
    if is_absolute(endpoint) {
        endpoint.to_string()
    } else {
        join(base, endpoint)
    }
}

/// Default metric label for an endpoint.
///
/// Relative endpoints lose their leading slashes; absolute URLs are reduced
/// to their path.
pub fn metric_label(endpoint: &str) -> String {
    if is_absolute(endpoint) {
        if let Ok(url) = Url::parse(endpoint) {
            return url.path().trim_start_matches('/').to_string();
        }
        return endpoint.to_string();
    }
    endpoint.trim_start_matches('/').to_string()
}

/// Validates and normalises a base URL.
///
/// # Errors
///
/// Fails unless `raw` is an absolute http or https URL with a host.
pub fn normalize_base_url(raw: &str) -> Result<String, FetchError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed).map_err(|e| FetchError::InvalidBaseUrl(format!("{raw}: {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(FetchError::InvalidBaseUrl(format!(
            "{raw}: scheme must be http or https"
        )));
    }
    if parsed.host_str().is_none() {
        return Err(FetchError::InvalidBaseUrl(format!("{raw}: no host")));
    }

    Ok(trimmed.to_string())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://api.example.com";

    #[test]
    fn test_join_single_slash() {
        assert_eq!(join(BASE, "/api/login"), "https://api.example.com/api/login");
        assert_eq!(join(BASE, "api/login"), "https://api.example.com/api/login");
        assert_eq!(
            join("https://api.example.com//", "//api/login"),
            "https://api.example.com/api/login"
        );
    }

    #[test]
    fn test_resolve_keeps_absolute_urls() {
        let url = "https://cdn.example.com/files/abc.gpkg";
        assert_eq!(resolve(BASE, url), url);
        assert_eq!(resolve(BASE, "http://other/x"), "http://other/x");
    }

    #[test]
    fn test_resolve_relative_forms() {
        assert_eq!(
            resolve(BASE, "/files/abc123.gpkg"),
            "https://api.example.com/files/abc123.gpkg"
        );
        assert_eq!(
            resolve(BASE, "files/abc123.gpkg"),
            "https://api.example.com/files/abc123.gpkg"
        );
    }

    #[test]
    fn test_httpish_path_is_not_absolute() {
        // A path that merely starts with "http" is still relative.
        assert!(!is_absolute("httpbin/get"));
        assert_eq!(resolve(BASE, "httpbin/get"), "https://api.example.com/httpbin/get");
    }

    #[test]
    fn test_metric_label() {
        assert_eq!(metric_label("/api/login"), "api/login");
        assert_eq!(
            metric_label("https://cdn.example.com/files/abc.gpkg?sig=1"),
            "files/abc.gpkg"
        );
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("https://api.example.com/").unwrap(),
            "https://api.example.com"
        );
        assert!(normalize_base_url("ftp://api.example.com").is_err());
        assert!(normalize_base_url("not a url").is_err());
    }
}
