//! Route registration, lookup and dispatch.
//!
//! # Responsibilities
//! - Store routes in match order
//! - Record mounted gateways by prefix
//! - Resolve (host, method, path) to a route, a 404 or a 405
//! - Invoke the matched handler
//!
//! # Design Decisions
//! - One reader/writer lock guards the route table and the prefix map
//! - Resolution is synchronous and runs under the read lock; handlers run after it is released
//! - Longest prefix first, then most recently registered pattern route, then registration order
//! - First match on (host, path, method) wins; a path match with the wrong method keeps scanning

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use parking_lot::RwLock;
use regex::Regex;

use crate::gateways::RouterGateway;
use crate::http::request::request_host;
use crate::http::response;
use crate::observability::metrics;
use crate::routing::cache::{CacheKey, CachedOutcome, RouteCache};
use crate::routing::error::RouterError;
use crate::routing::gateway::{Gateway, GatewayInfo};
use crate::routing::matcher;
use crate::routing::route::{Handler, MountContext, Route, RouteDescriptor, RouteMatch};

pub const ROUTER_DESCRIPTION: &str = "Routes HTTP requests to services and handlers";

/// Outcome of resolving a request against the route table.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// A route matched host, path and method.
    Matched { route: Arc<Route>, matched: RouteMatch },
    /// No route matched host and path.
    NotFound,
    /// Some route matched host and path, none matched the method.
    MethodNotAllowed { allowed: Vec<Method> },
}

impl Resolution {
    pub fn status(&self) -> StatusCode {
        match self {
            Resolution::Matched { .. } => StatusCode::OK,
            Resolution::NotFound => StatusCode::NOT_FOUND,
            Resolution::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

impl PartialEq for Resolution {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Resolution::Matched { route: a, matched: ma },
                Resolution::Matched { route: b, matched: mb },
            ) => Arc::ptr_eq(a, b) && ma == mb,
            (Resolution::NotFound, Resolution::NotFound) => true,
            (
                Resolution::MethodNotAllowed { allowed: a },
                Resolution::MethodNotAllowed { allowed: b },
            ) => a == b,
            _ => false,
        }
    }
}

#[derive(Debug)]
struct RouteEntry {
    route: Arc<Route>,
    seq: u64,
}

#[derive(Debug, Default)]
struct RouteTable {
    routes: Vec<RouteEntry>,
    prefixes: HashMap<String, GatewayInfo>,
    next_seq: u64,
    generation: u64,
}

impl RouteTable {
    fn insert(&mut self, route: Route) -> Arc<Route> {
        let priority = if route.pattern().is_some() {
            self.routes.len()
        } else {
            0
        };
        let route = Arc::new(route.with_priority(priority));
        let seq = self.next_seq;
        self.next_seq += 1;
        self.routes.push(RouteEntry {
            route: route.clone(),
            seq,
        });

        self.routes.sort_by(|a, b| {
            b.route
                .prefix()
                .len()
                .cmp(&a.route.prefix().len())
                .then_with(|| b.route.priority().cmp(&a.route.priority()))
                .then_with(|| a.seq.cmp(&b.seq))
        });
        self.generation += 1;
        route
    }

    /// Linear scan. Returns the resolution and its cacheable form.
    fn scan(&self, host: &str, method: &Method, path: &str) -> (Resolution, CachedOutcome) {
        let mut path_matched = false;
        let mut allowed: Vec<Method> = Vec::new();

        for (index, entry) in self.routes.iter().enumerate() {
            let route = &entry.route;
            if !route.matches_normalized_host(host) {
                continue;
            }
            let Some(m) = route.matches_path(path) else {
                continue;
            };

            if route.matches_method(method) {
                let matched = RouteMatch {
                    prefix: route.prefix().to_string(),
                    path: m.path.clone(),
                    params: m.params.clone(),
                };
                let outcome = CachedOutcome::Matched {
                    index,
                    path: m.path,
                    params: m.params,
                };
                return (
                    Resolution::Matched {
                        route: route.clone(),
                        matched,
                    },
                    outcome,
                );
            }

            path_matched = true;
            for method in route.methods() {
                if !allowed.contains(method) {
                    allowed.push(method.clone());
                }
            }
        }

        if path_matched {
            (
                Resolution::MethodNotAllowed {
                    allowed: allowed.clone(),
                },
                CachedOutcome::MethodNotAllowed { allowed },
            )
        } else {
            (Resolution::NotFound, CachedOutcome::NotFound)
        }
    }

    fn materialize(&self, outcome: CachedOutcome) -> Resolution {
        match outcome {
            CachedOutcome::Matched {
                index,
                path,
                params,
            } => {
                let route = self.routes[index].route.clone();
                let matched = RouteMatch {
                    prefix: route.prefix().to_string(),
                    path,
                    params,
                };
                Resolution::Matched { route, matched }
            }
            CachedOutcome::NotFound => Resolution::NotFound,
            CachedOutcome::MethodNotAllowed { allowed } => Resolution::MethodNotAllowed { allowed },
        }
    }
}

/// The gateway's routing table.
///
/// Shared as `Arc<Router>` between the HTTP front door and every plugin that registers routes.
pub struct Router {
    label: String,
    table: RwLock<RouteTable>,
    cache: Option<RouteCache>,
}

impl Router {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            table: RwLock::new(RouteTable::default()),
            cache: None,
        }
    }

    /// Memoize resolutions, remembering at most `capacity` of them.
    pub fn with_cache(mut self, capacity: usize) -> Self {
        self.cache = Some(RouteCache::new(capacity));
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn description(&self) -> &str {
        ROUTER_DESCRIPTION
    }

    /// Add a route for a `host/prefix` target.
    ///
    /// A `None` pattern makes this the default route for the prefix. Methods default to `GET`.
    pub fn add_handler_ex(
        &self,
        host_prefix: &str,
        pattern: Option<Regex>,
        handler: Option<Handler>,
        methods: Vec<Method>,
    ) -> Result<Arc<Route>, RouterError> {
        let route = Route::new(host_prefix, pattern, handler, methods)?;
        Ok(self.insert(route))
    }

    /// Add a route under the prefix of a mounted gateway, carrying the descriptor's scopes and
    /// description.
    pub fn add_handler(
        &self,
        ctx: &MountContext,
        descriptor: RouteDescriptor,
        handler: Handler,
    ) -> Result<Arc<Route>, RouterError> {
        let RouteDescriptor {
            pattern,
            methods,
            scopes,
            description,
        } = descriptor;
        let route = Route::new(ctx.prefix(), pattern, Some(handler), methods)
            .map_err(|e| {
                tracing::error!(prefix = %ctx.prefix(), error = %e, "Route construction failed");
                e
            })?
            .with_metadata(scopes, description);
        Ok(self.insert(route))
    }

    fn insert(&self, route: Route) -> Arc<Route> {
        let (route, count) = {
            let mut table = self.table.write();
            let route = table.insert(route);
            if let Some(cache) = &self.cache {
                cache.clear();
            }
            (route, table.routes.len())
        };

        tracing::debug!(route = %route, priority = route.priority(), "Route registered");
        metrics::set_route_count(count);
        route
    }

    /// Mount a gateway and let it register its routes under `prefix`.
    ///
    /// The prefix stays recorded if the gateway fails to register; startup is expected to abort.
    pub fn mount_gateway(&self, prefix: &str, gateway: &dyn Gateway) -> Result<(), RouterError> {
        let prefix = matcher::normalize_path(prefix, false);
        matcher::split_host_prefix(&prefix)?;

        {
            let mut table = self.table.write();
            if table.prefixes.contains_key(&prefix) {
                return Err(RouterError::DuplicatePrefix(prefix));
            }
            table.prefixes.insert(
                prefix.clone(),
                GatewayInfo {
                    prefix: prefix.clone(),
                    label: gateway.label().to_string(),
                    description: gateway.description().to_string(),
                },
            );
        }

        tracing::info!(prefix = %prefix, label = %gateway.label(), "Mounting gateway");
        gateway.register_handlers(&MountContext::new(prefix), self)
    }

    /// Mount the router's own description endpoints at `prefix`.
    pub fn mount_self(self: &Arc<Self>, prefix: &str) -> Result<(), RouterError> {
        let gateway = RouterGateway::new(self);
        self.mount_gateway(prefix, &gateway)
    }

    /// Mounted prefixes, sorted.
    pub fn prefixes(&self) -> Vec<String> {
        let table = self.table.read();
        let mut prefixes: Vec<String> = table.prefixes.keys().cloned().collect();
        prefixes.sort();
        prefixes
    }

    /// Mounted gateways, sorted by prefix.
    pub fn gateways(&self) -> Vec<GatewayInfo> {
        let table = self.table.read();
        let mut gateways: Vec<GatewayInfo> = table.prefixes.values().cloned().collect();
        gateways.sort_by(|a, b| a.prefix.cmp(&b.prefix));
        gateways
    }

    /// Routes in match order.
    pub fn routes(&self) -> Vec<Arc<Route>> {
        let table = self.table.read();
        table.routes.iter().map(|e| e.route.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.table.read().routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve a request. `host` may carry a port; `path` need not be normalized.
    pub fn resolve(&self, host: &str, method: &Method, path: &str) -> Resolution {
        let host = matcher::normalize_host(matcher::strip_port(host));
        let path = matcher::normalize_path(path, false);
        let table = self.table.read();

        let Some(cache) = &self.cache else {
            return table.scan(&host, method, &path).0;
        };

        let key = CacheKey {
            host,
            method: method.clone(),
            path,
        };
        if let Some(outcome) = cache.get(&key, table.generation, table.routes.len()) {
            metrics::record_cache_lookup(true);
            return table.materialize(outcome);
        }
        metrics::record_cache_lookup(false);

        let (resolution, outcome) = table.scan(&key.host, method, &key.path);
        // still under the read lock, so no mutation can slip in between scan and insert
        cache.insert(key, table.generation, outcome);
        resolution
    }

    /// Resolve without consulting or filling the cache.
    pub fn resolve_uncached(&self, host: &str, method: &Method, path: &str) -> Resolution {
        let host = matcher::normalize_host(matcher::strip_port(host));
        let path = matcher::normalize_path(path, false);
        self.table.read().scan(&host, method, &path).0
    }

    /// Number of memoized resolutions, zero when caching is off.
    pub fn cached_len(&self) -> usize {
        self.cache.as_ref().map(RouteCache::len).unwrap_or(0)
    }

    /// Resolve and run a request.
    pub async fn dispatch(&self, mut req: Request<Body>) -> Response {
        let start = Instant::now();
        let method = req.method().clone();
        let host = request_host(&req).to_string();
        let Some(path) = matcher::decode_path(req.uri().path()).map(Cow::into_owned) else {
            tracing::debug!(
                method = %method,
                host = %host,
                raw_path = %req.uri().path(),
                "Request path is not valid UTF-8 once decoded"
            );
            metrics::record_dispatch(&method, "bad_request", "none", StatusCode::BAD_REQUEST, start);
            return response::error_response(StatusCode::BAD_REQUEST);
        };

        match self.resolve(&host, &method, &path) {
            Resolution::Matched { route, matched } => {
                tracing::debug!(
                    method = %method,
                    host = %host,
                    path = %path,
                    prefix = %matched.prefix,
                    params = ?matched.params,
                    "Route matched"
                );
                req.extensions_mut().insert(matched.clone());
                let res = route.handler().call(req, matched).await;
                metrics::record_dispatch(&method, "matched", route.prefix(), res.status(), start);
                res
            }
            Resolution::NotFound => {
                tracing::debug!(method = %method, host = %host, path = %path, "No route matched");
                metrics::record_dispatch(&method, "not_found", "none", StatusCode::NOT_FOUND, start);
                response::not_found()
            }
            Resolution::MethodNotAllowed { allowed } => {
                tracing::debug!(
                    method = %method,
                    host = %host,
                    path = %path,
                    allowed = ?allowed,
                    "Method not allowed"
                );
                metrics::record_dispatch(
                    &method,
                    "method_not_allowed",
                    "none",
                    StatusCode::METHOD_NOT_ALLOWED,
                    start,
                );
                response::method_not_allowed(&allowed)
            }
        }
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("label", &self.label)
            .field("prefixes", &self.prefixes())
            .field("routes", &self.len())
            .field("cache", &self.cache.is_some())
            .finish()
    }
}

impl fmt::Display for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<router")?;
        if !self.label.is_empty() {
            write!(f, " label={:?}", self.label)?;
        }
        let prefixes = self.prefixes();
        if !prefixes.is_empty() {
            write!(f, " prefixes={:?}", prefixes)?;
        }
        for route in self.routes() {
            write!(f, " {}", route)?;
        }
        write!(f, ">")
    }
}
