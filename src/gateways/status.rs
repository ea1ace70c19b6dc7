//! Gateway status endpoint.

use std::time::Instant;

use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::http::response;
use crate::routing::{handler, Gateway, MountContext, RouteDescriptor, RouteMatch, Router, RouterError};

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
}

pub struct StatusGateway {
    label: String,
    description: String,
    started: Instant,
}

impl StatusGateway {
    pub fn new(label: impl Into<String>, description: Option<String>) -> Self {
        Self {
            label: label.into(),
            description: description.unwrap_or_else(|| "Reports gateway status".to_string()),
            started: Instant::now(),
        }
    }
}

impl Gateway for StatusGateway {
    fn label(&self) -> &str {
        &self.label
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn register_handlers(&self, ctx: &MountContext, router: &Router) -> Result<(), RouterError> {
        let started = self.started;
        router.add_handler(
            ctx,
            RouteDescriptor::default().describe("Gateway version and uptime"),
            handler(move |_req: Request<Body>, m: RouteMatch| async move { get_status(started, m) }),
        )?;
        Ok(())
    }
}

fn get_status(started: Instant, m: RouteMatch) -> Response {
    if m.path != "/" {
        return response::not_found();
    }
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        uptime_secs: started.elapsed().as_secs(),
    })
    .into_response()
}
