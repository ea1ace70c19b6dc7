//! Routes and the values that flow into and out of them.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;
use regex::Regex;

use crate::routing::error::RouterError;
use crate::routing::matcher::{self, PathMatch};

/// A request handler bound to a route.
///
/// Any `Fn(Request<Body>, RouteMatch) -> impl Future<Output = impl IntoResponse>`
/// implements this.
pub trait RouteHandler: Send + Sync {
    fn call(&self, req: Request<Body>, matched: RouteMatch) -> BoxFuture<'static, Response>;
}

impl<F, Fut, R> RouteHandler for F
where
    F: Fn(Request<Body>, RouteMatch) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
    fn call(&self, req: Request<Body>, matched: RouteMatch) -> BoxFuture<'static, Response> {
        let fut = (self)(req, matched);
        Box::pin(async move { fut.await.into_response() })
    }
}

/// Shared handler reference stored in a [`Route`].
pub type Handler = Arc<dyn RouteHandler>;

/// Wrap a closure or async fn as a [`Handler`].
pub fn handler<H>(h: H) -> Handler
where
    H: RouteHandler + 'static,
{
    Arc::new(h)
}

/// What the router learned while matching, handed to the handler by value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteMatch {
    /// Prefix of the matched route.
    pub prefix: String,
    /// Request path relative to the prefix.
    pub path: String,
    /// Positional capture groups of the route pattern.
    pub params: Vec<String>,
}

impl RouteMatch {
    /// Positional parameter, if present.
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }
}

/// Passed to a gateway while it registers its routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountContext {
    prefix: String,
}

impl MountContext {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    /// The prefix the gateway is mounted at.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

/// Everything a caller says about a route apart from where it is mounted.
#[derive(Debug, Clone, Default)]
pub struct RouteDescriptor {
    pub pattern: Option<Regex>,
    pub methods: Vec<Method>,
    pub scopes: Vec<String>,
    pub description: Option<String>,
}

impl RouteDescriptor {
    /// Set the path pattern, matched against the remainder after the prefix.
    pub fn pattern(mut self, pattern: &str) -> Result<Self, RouterError> {
        self.pattern = Some(Regex::new(pattern)?);
        Ok(self)
    }

    pub fn method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }

    pub fn methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods.extend(methods);
        self
    }

    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.push(scope.into());
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// An immutable (host, prefix, pattern, methods) to handler binding.
pub struct Route {
    host: String,
    prefix: String,
    pattern: Option<Regex>,
    methods: Vec<Method>,
    priority: usize,
    scopes: Vec<String>,
    description: Option<String>,
    handler: Handler,
}

impl Route {
    /// Build a route from a `host/prefix` target.
    ///
    /// Methods default to `GET`. Priority is assigned by the router.
    pub fn new(
        host_prefix: &str,
        pattern: Option<Regex>,
        handler: Option<Handler>,
        methods: Vec<Method>,
    ) -> Result<Self, RouterError> {
        let handler = handler.ok_or(RouterError::InvalidHandler)?;
        let (host, prefix) = matcher::split_host_prefix(host_prefix)?;

        let mut deduped: Vec<Method> = Vec::with_capacity(methods.len().max(1));
        for method in methods {
            if !deduped.contains(&method) {
                deduped.push(method);
            }
        }
        if deduped.is_empty() {
            deduped.push(Method::GET);
        }

        Ok(Self {
            host: matcher::normalize_host(host),
            prefix: matcher::normalize_path(prefix, pattern.is_some()),
            pattern,
            methods: deduped,
            priority: 0,
            scopes: Vec::new(),
            description: None,
            handler,
        })
    }

    pub(crate) fn with_priority(mut self, priority: usize) -> Self {
        self.priority = priority;
        self
    }

    pub(crate) fn with_metadata(mut self, scopes: Vec<String>, description: Option<String>) -> Self {
        self.scopes = scopes;
        self.description = description.filter(|d| !d.is_empty());
        self
    }

    /// Normalized host suffix, empty for any host.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn pattern(&self) -> Option<&Regex> {
        self.pattern.as_ref()
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn priority(&self) -> usize {
        self.priority
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Host as a wildcard, e.g. `*.example.com`, or `*` for any host.
    pub fn host_wildcard(&self) -> String {
        format!("*{}", self.host)
    }

    /// Prefix plus the pattern source with its anchors removed.
    pub fn path(&self) -> String {
        let mut path = self.prefix.clone();
        if let Some(re) = &self.pattern {
            let src = re.as_str();
            let src = src.strip_prefix('^').unwrap_or(src);
            let src = src.strip_suffix('$').unwrap_or(src);
            path.push_str(src);
        }
        path
    }

    pub fn matches_host(&self, host: &str) -> bool {
        matcher::matches_host(&self.host, host)
    }

    /// Host check for the router's scan, which normalizes the request host once up front.
    pub fn matches_normalized_host(&self, host: &str) -> bool {
        matcher::matches_normalized_host(&self.host, host)
    }

    pub fn matches_path(&self, path: &str) -> Option<PathMatch> {
        matcher::matches_path(&self.prefix, self.pattern.as_ref(), path)
    }

    pub fn matches_method(&self, method: &Method) -> bool {
        matcher::matches_method(&self.methods, method)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("host", &self.host)
            .field("prefix", &self.prefix)
            .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
            .field("methods", &self.methods)
            .field("priority", &self.priority)
            .field("scopes", &self.scopes)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<route")?;
        if !self.host.is_empty() {
            write!(f, " host={:?}", self.host_wildcard())?;
        }
        write!(f, " path={:?}", self.path())?;
        let methods: Vec<&str> = self.methods.iter().map(Method::as_str).collect();
        write!(f, " methods={:?}>", methods)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Handler {
        handler(|_req: Request<Body>, _m: RouteMatch| async { "ok" })
    }

    #[test]
    fn test_new_route_host_only() {
        let route = Route::new("Example.com", None, Some(noop()), vec![]).unwrap();
        assert_eq!(route.host(), ".example.com");
        assert_eq!(route.prefix(), "/");
        assert_eq!(route.methods(), &[Method::GET]);
    }

    #[test]
    fn test_new_route_host_and_prefix() {
        let re = Regex::new("^([a-z]+)$").unwrap();
        let route = Route::new("example.com/api", Some(re), Some(noop()), vec![Method::POST]).unwrap();
        assert_eq!(route.host(), ".example.com");
        assert_eq!(route.prefix(), "/api/");
        assert_eq!(route.path(), "/api/([a-z]+)");
        assert_eq!(route.to_string(), r#"<route host="*.example.com" path="/api/([a-z]+)" methods=["POST"]>"#);
    }

    #[test]
    fn test_new_route_prefix_only() {
        let route = Route::new("/cert/", None, Some(noop()), vec![Method::GET, Method::GET]).unwrap();
        assert_eq!(route.host(), "");
        assert_eq!(route.prefix(), "/cert");
        assert_eq!(route.methods().len(), 1);
        assert_eq!(route.to_string(), r#"<route path="/cert" methods=["GET"]>"#);
    }

    #[test]
    fn test_new_route_requires_handler() {
        let err = Route::new("/a", None, None, vec![]).unwrap_err();
        assert!(matches!(err, RouterError::InvalidHandler));
    }

    #[test]
    fn test_descriptor_builder() {
        let desc = RouteDescriptor::default()
            .pattern(r"^/(\d+)$")
            .unwrap()
            .method(Method::GET)
            .scope("read")
            .describe("fetch");
        assert!(desc.pattern.is_some());
        assert_eq!(desc.scopes, vec!["read"]);
        assert_eq!(desc.description.as_deref(), Some("fetch"));

        assert!(RouteDescriptor::default().pattern("(").is_err());
    }

    #[test]
    fn test_route_match_param() {
        let m = RouteMatch {
            prefix: "/users/".into(),
            path: "/42".into(),
            params: vec!["42".into()],
        };
        assert_eq!(m.param(0), Some("42"));
        assert_eq!(m.param(1), None);
    }
}
