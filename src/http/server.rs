//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum app with a single fallback into the routing engine
//! - Wire up middleware (tracing, limits, request ID, security headers)
//! - Bind server to listener and shut down gracefully

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer, set_header::SetResponseHeaderLayer, timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::routing::Router as GatewayRouter;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<GatewayRouter>,
}

/// HTTP front door for the gateway.
pub struct HttpServer {
    app: Router,
    config: GatewayConfig,
    router: Arc<GatewayRouter>,
}

impl HttpServer {
    /// Create a new HTTP server dispatching into `router`.
    pub fn new(config: GatewayConfig, router: Arc<GatewayRouter>) -> Self {
        let state = AppState {
            router: router.clone(),
        };
        let app = Self::build_app(&config, state);
        Self { app, config, router }
    }

    /// Build the Axum app with all middleware layers.
    #[allow(deprecated)]
    fn build_app(config: &GatewayConfig, state: AppState) -> Router {
        let mut app = Router::new().fallback(dispatch_handler).with_state(state);
        if config.security.enable_headers {
            app = app.layer(SetResponseHeaderLayer::if_not_present(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ));
        }
        app.layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// The Axum app, for driving requests without a listener.
    pub fn app(&self) -> Router {
        self.app.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.router.len(),
            "HTTP server starting"
        );

        let app = self.app.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Every request lands here and is resolved by the routing engine.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.router.dispatch(request).await
}
