//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request};
use plugin_gateway::config::GatewayConfig;
use plugin_gateway::lifecycle::{startup, Shutdown};
use plugin_gateway::routing::{
    handler, Gateway, MountContext, RouteDescriptor, RouteMatch, Router, RouterError,
};
use tokio::net::TcpListener;

/// A running gateway bound to an ephemeral port.
#[allow(dead_code)]
pub struct TestGateway {
    pub addr: SocketAddr,
    pub router: Arc<Router>,
    pub shutdown: Shutdown,
}

#[allow(dead_code)]
impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Build the gateway from `config` and serve it on 127.0.0.1 with a random port.
#[allow(dead_code)]
pub async fn start_gateway(config: GatewayConfig) -> TestGateway {
    let app = startup::build(config).unwrap();
    let router = app.router.clone();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = app.server.run(listener, server_shutdown).await;
    });

    // Give the accept loop a moment to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestGateway {
        addr,
        router,
        shutdown,
    }
}

/// HTTP client that never goes through a proxy or reuses connections.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// A plugin exposing `GET /items`, `GET|DELETE /items/<id>` and a catch-all.
#[allow(dead_code)]
pub struct ItemsGateway;

impl Gateway for ItemsGateway {
    fn label(&self) -> &str {
        "items"
    }

    fn description(&self) -> &str {
        "Item store"
    }

    fn register_handlers(&self, ctx: &MountContext, router: &Router) -> Result<(), RouterError> {
        router.add_handler(
            ctx,
            RouteDescriptor::default().describe("Catch-all"),
            handler(|_req: Request<Body>, m: RouteMatch| async move { format!("default {}", m.path) }),
        )?;
        router.add_handler(
            ctx,
            RouteDescriptor::default()
                .pattern(r"^([0-9]+)$")?
                .methods([Method::GET, Method::DELETE])
                .scope("items:read")
                .describe("Get or delete an item"),
            handler(|req: Request<Body>, m: RouteMatch| async move {
                format!("{} item {}", req.method(), m.params[0])
            }),
        )?;
        Ok(())
    }
}
