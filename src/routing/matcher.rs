//! Route matching primitives.
//!
//! # Responsibilities
//! - Normalize hosts and paths into their canonical form
//! - Split a `host/prefix` registration target
//! - Match host suffix, path prefix + pattern, and method
//!
//! # Design Decisions
//! - Host matching is case-insensitive and hierarchical (`.example.com` covers subdomains)
//! - Path matching is case-sensitive
//! - Empty host = matches every host
//! - Normalization is idempotent

use std::borrow::Cow;

use axum::http::Method;
use percent_encoding::percent_decode_str;
use regex::Regex;

use crate::routing::error::RouterError;

pub const PATH_SEPARATOR: char = '/';
pub const HOST_SEPARATOR: char = '.';

/// Normalize a path: leading separator always, trailing separator only when `at_end`.
///
/// The root path is always `/`.
pub fn normalize_path(path: &str, at_end: bool) -> String {
    let trimmed = path.trim_end_matches(PATH_SEPARATOR);
    let trimmed = trimmed.trim_start_matches(PATH_SEPARATOR);
    if trimmed.is_empty() {
        return PATH_SEPARATOR.to_string();
    }

    let mut out = String::with_capacity(trimmed.len() + 2);
    out.push(PATH_SEPARATOR);
    out.push_str(trimmed);
    if at_end {
        out.push(PATH_SEPARATOR);
    }
    out
}

/// Percent-decode a request path before matching.
///
/// `%2F` decodes to a separator. Malformed escapes pass through as-is.
/// Returns `None` when the decoded bytes are not UTF-8.
pub fn decode_path(path: &str) -> Option<Cow<'_, str>> {
    percent_decode_str(path).decode_utf8().ok()
}

/// Normalize a host into a lower-cased dotted suffix pattern.
///
/// `"Example.COM."` becomes `".example.com"`; an empty host stays empty.
pub fn normalize_host(host: &str) -> String {
    let host = host
        .trim_start_matches('*')
        .trim_start_matches(HOST_SEPARATOR)
        .trim_end_matches(HOST_SEPARATOR);
    if host.is_empty() {
        return String::new();
    }
    format!("{}{}", HOST_SEPARATOR, host.to_ascii_lowercase())
}

/// Strip a `:port` suffix from a request host, leaving IPv6 literals intact.
pub fn strip_port(host: &str) -> &str {
    if let Some(rest) = host.strip_prefix('[') {
        // [::1]:8080
        return match rest.find(']') {
            Some(end) => &host[..end + 2],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((name, port)) if !name.contains(':') && port.bytes().all(|b| b.is_ascii_digit()) => name,
        _ => host,
    }
}

/// Split a registration target into `(host, prefix)`.
///
/// - `"example.com"` is a host; the prefix is the root.
/// - `"/api"` is a prefix with no host.
/// - `"example.com/api"` is both.
///
/// Neither half is normalized here.
pub fn split_host_prefix(target: &str) -> Result<(&str, &str), RouterError> {
    if target.contains(|c: char| c.is_whitespace() || c == '?' || c == '#') {
        return Err(RouterError::InvalidPrefix(target.to_string()));
    }

    let (host, prefix) = match target.find(PATH_SEPARATOR) {
        None => (target, "/"),
        Some(0) => ("", target),
        Some(idx) => (&target[..idx], &target[idx + 1..]),
    };

    if !is_valid_host(host) {
        return Err(RouterError::InvalidPrefix(target.to_string()));
    }
    Ok((host, prefix))
}

fn is_valid_host(host: &str) -> bool {
    host.strip_prefix('*')
        .unwrap_or(host)
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'.')
}

/// Returns true if a request host falls under a normalized route host.
pub fn matches_host(route_host: &str, request_host: &str) -> bool {
    if route_host.is_empty() {
        return true;
    }
    matches_normalized_host(route_host, &normalize_host(strip_port(request_host)))
}

/// [`matches_host`] for a request host that is already port-stripped and normalized.
pub fn matches_normalized_host(route_host: &str, request_host: &str) -> bool {
    route_host.is_empty() || request_host.ends_with(route_host)
}

/// Result of a successful path match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatch {
    /// Path remainder relative to the prefix, normalized.
    pub path: String,
    /// Capture groups of the pattern, in order. Unmatched optional groups are empty.
    pub params: Vec<String>,
}

/// Match a request path against a normalized prefix and optional pattern.
pub fn matches_path(prefix: &str, pattern: Option<&Regex>, request_path: &str) -> Option<PathMatch> {
    let path = normalize_path(request_path, false);
    if path == prefix {
        return Some(PathMatch {
            path: PATH_SEPARATOR.to_string(),
            params: Vec::new(),
        });
    }

    let rel = path.strip_prefix(prefix)?;
    match pattern {
        None => {
            // "/a" must not swallow "/ab"
            if prefix != "/" && !rel.is_empty() && !rel.starts_with(PATH_SEPARATOR) {
                return None;
            }
            Some(PathMatch {
                path: normalize_path(rel, false),
                params: Vec::new(),
            })
        }
        Some(re) => {
            let caps = re.captures(rel)?;
            let params = caps
                .iter()
                .skip(1)
                .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
                .collect();
            Some(PathMatch {
                path: normalize_path(rel, false),
                params,
            })
        }
    }
}

/// Returns true if the method is a literal member of the set.
pub fn matches_method(methods: &[Method], method: &Method) -> bool {
    methods.contains(method)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("", false), "/");
        assert_eq!(normalize_path("", true), "/");
        assert_eq!(normalize_path("/", true), "/");
        assert_eq!(normalize_path("a", false), "/a");
        assert_eq!(normalize_path("/a/", false), "/a");
        assert_eq!(normalize_path("/a", true), "/a/");
        assert_eq!(normalize_path("a//", true), "/a/");
        assert_eq!(normalize_path("/a/b//", false), "/a/b");
    }

    #[test]
    fn test_normalize_idempotent() {
        for p in ["", "/", "a", "/a/", "a//", "//x/y/", "/users/42"] {
            for at_end in [false, true] {
                let once = normalize_path(p, at_end);
                assert_eq!(normalize_path(&once, at_end), once, "path {p:?}");
            }
        }
        for h in ["", ".", "example.com", "Example.COM..", ".api.example.com", "*.example.com"] {
            let once = normalize_host(h);
            assert_eq!(normalize_host(&once), once, "host {h:?}");
        }
    }

    #[test]
    fn test_decode_path() {
        assert_eq!(decode_path("/users/%34%32").as_deref(), Some("/users/42"));
        assert_eq!(decode_path("/files/my%20doc").as_deref(), Some("/files/my doc"));
        assert_eq!(decode_path("/a%2Fb").as_deref(), Some("/a/b"));
        assert_eq!(decode_path("/caf%C3%A9").as_deref(), Some("/café"));
        assert_eq!(decode_path("/100%").as_deref(), Some("/100%"));
        assert_eq!(decode_path("/plain").as_deref(), Some("/plain"));
        assert_eq!(decode_path("/bad%FF"), None);
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("example.com"), ".example.com");
        assert_eq!(normalize_host("Example.COM."), ".example.com");
        assert_eq!(normalize_host("*.example.com"), ".example.com");
        assert_eq!(normalize_host(""), "");
        assert_eq!(normalize_host("."), "");
    }

    #[test]
    fn test_strip_port() {
        assert_eq!(strip_port("example.com:8080"), "example.com");
        assert_eq!(strip_port("example.com"), "example.com");
        assert_eq!(strip_port("[::1]:8080"), "[::1]");
        assert_eq!(strip_port("::1"), "::1");
    }

    #[test]
    fn test_split_host_prefix() {
        assert_eq!(split_host_prefix("example.com").unwrap(), ("example.com", "/"));
        assert_eq!(split_host_prefix("/api").unwrap(), ("", "/api"));
        assert_eq!(split_host_prefix("example.com/api/v1").unwrap(), ("example.com", "api/v1"));
        assert_eq!(split_host_prefix("*.example.com/api").unwrap(), ("*.example.com", "api"));
        assert!(split_host_prefix("/a b").is_err());
        assert!(split_host_prefix("/a?x").is_err());
        assert!(split_host_prefix("exa_mple.com/a").is_err());
    }

    #[test]
    fn test_host_matcher() {
        let host = normalize_host("example.com");
        assert!(matches_host(&host, "example.com"));
        assert!(matches_host(&host, "api.example.com"));
        assert!(matches_host(&host, "API.Example.com:8443"));
        assert!(!matches_host(&host, "notexample.com"));
        assert!(!matches_host(&host, "com"));
        assert!(matches_host("", "anything.org"));
    }

    #[test]
    fn test_normalized_host_matcher() {
        let host = normalize_host("example.com");
        assert!(matches_normalized_host(&host, ".example.com"));
        assert!(matches_normalized_host(&host, ".api.example.com"));
        assert!(!matches_normalized_host(&host, ".notexample.com"));
        assert!(!matches_normalized_host(&host, ".com"));
        assert!(!matches_normalized_host(&host, ""));
        assert!(matches_normalized_host("", ""));

        for request in ["api.example.com:8080", "EXAMPLE.COM.", "other.org", "[::1]:80"] {
            let normalized = normalize_host(strip_port(request));
            assert_eq!(
                matches_normalized_host(&host, &normalized),
                matches_host(&host, request),
                "{request}"
            );
        }
    }

    #[test]
    fn test_path_default_route() {
        let m = matches_path("/a", None, "/a").unwrap();
        assert_eq!(m.path, "/");
        let m = matches_path("/a", None, "/a/b/c/").unwrap();
        assert_eq!(m.path, "/b/c");
        assert!(matches_path("/a", None, "/ab").is_none());
        assert!(matches_path("/a", None, "/b").is_none());

        let m = matches_path("/", None, "/anything").unwrap();
        assert_eq!(m.path, "/anything");
    }

    #[test]
    fn test_path_pattern_route() {
        let re = Regex::new(r"^([0-9]+)$").unwrap();
        let m = matches_path("/users/", Some(&re), "/users/42").unwrap();
        assert_eq!(m.params, vec!["42"]);
        assert_eq!(m.path, "/42");

        assert!(matches_path("/users/", Some(&re), "/users/abc").is_none());
        assert!(matches_path("/users/", Some(&re), "/usersX42").is_none());
    }

    #[test]
    fn test_path_optional_group() {
        let re = Regex::new(r"^(a)?(b)$").unwrap();
        let m = matches_path("/x/", Some(&re), "/x/b").unwrap();
        assert_eq!(m.params, vec!["".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_method_matcher() {
        let methods = [Method::GET, Method::HEAD];
        assert!(matches_method(&methods, &Method::GET));
        assert!(!matches_method(&methods, &Method::POST));
    }
}
