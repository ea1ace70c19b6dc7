//! The router describing itself: mounted prefixes and the route table.

use std::sync::{Arc, Weak};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::http::response;
use crate::routing::{handler, Gateway, MountContext, Route, RouteDescriptor, RouteMatch, Router, RouterError};

/// One row of `GET <prefix>/routes`.
#[derive(Debug, Serialize)]
pub struct RouteView {
    pub host: Option<String>,
    pub path: String,
    pub methods: Vec<String>,
    pub priority: usize,
    pub scopes: Vec<String>,
    pub description: Option<String>,
}

impl From<&Route> for RouteView {
    fn from(route: &Route) -> Self {
        Self {
            host: (!route.host().is_empty()).then(|| route.host_wildcard()),
            path: route.path(),
            methods: route.methods().iter().map(ToString::to_string).collect(),
            priority: route.priority(),
            scopes: route.scopes().to_vec(),
            description: route.description().map(str::to_string),
        }
    }
}

/// Gateway serving the router's own introspection endpoints.
///
/// Holds a weak reference so the route table does not keep itself alive.
pub struct RouterGateway {
    router: Weak<Router>,
    label: String,
    description: String,
}

impl RouterGateway {
    pub fn new(router: &Arc<Router>) -> Self {
        Self {
            router: Arc::downgrade(router),
            label: router.label().to_string(),
            description: router.description().to_string(),
        }
    }
}

impl Gateway for RouterGateway {
    fn label(&self) -> &str {
        &self.label
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn register_handlers(&self, ctx: &MountContext, router: &Router) -> Result<(), RouterError> {
        // GET /
        //   List mounted prefixes with their label and description
        let weak = self.router.clone();
        router.add_handler(
            ctx,
            RouteDescriptor::default().describe("List mounted gateways"),
            handler(move |_req: Request<Body>, m: RouteMatch| {
                let weak = weak.clone();
                async move { list_gateways(weak, m) }
            }),
        )?;

        // GET /routes
        //   List routes in match order
        let weak = self.router.clone();
        router.add_handler(
            ctx,
            RouteDescriptor::default()
                .pattern("^routes$")?
                .describe("List routes in match order"),
            handler(move |_req: Request<Body>, _m: RouteMatch| {
                let weak = weak.clone();
                async move { list_routes(weak) }
            }),
        )?;

        Ok(())
    }
}

fn list_gateways(router: Weak<Router>, m: RouteMatch) -> Response {
    if m.path != "/" {
        return response::not_found();
    }
    match router.upgrade() {
        Some(router) => Json(router.gateways()).into_response(),
        None => response::error_response(StatusCode::SERVICE_UNAVAILABLE),
    }
}

fn list_routes(router: Weak<Router>) -> Response {
    match router.upgrade() {
        Some(router) => {
            let routes: Vec<RouteView> = router.routes().iter().map(|r| RouteView::from(r.as_ref())).collect();
            Json(routes).into_response()
        }
        None => response::error_response(StatusCode::SERVICE_UNAVAILABLE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn get_json(router: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let res = router.dispatch(req).await;
        let status = res.status();
        let body = axum::body::to_bytes(res.into_body(), 64 * 1024).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_lists_prefixes_and_routes() {
        let router = Arc::new(Router::new("main"));
        router.mount_self("/router").unwrap();

        let (status, json) = get_json(&router, "/router").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json[0]["prefix"], "/router");
        assert_eq!(json[0]["label"], "main");
        assert_eq!(json[0]["description"], crate::routing::router::ROUTER_DESCRIPTION);

        let (status, json) = get_json(&router, "/router/routes").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().unwrap().len(), 2);
        assert_eq!(json[0]["path"], "/router/routes");
        assert_eq!(json[0]["methods"][0], "GET");
        assert_eq!(json[1]["path"], "/router");
        assert_eq!(json[1]["host"], serde_json::Value::Null);

        let (status, _) = get_json(&router, "/router/other").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_dropped_router() {
        let router = Arc::new(Router::new("main"));
        let weak = Arc::downgrade(&router);
        drop(router);

        let res = list_routes(weak);
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
