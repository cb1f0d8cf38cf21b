//! Request interceptor pipeline.
//!
//! Each route is served through an ordered list of [`Interceptor`] stages
//! composed around its terminal handler. Stages are listed outermost first:
//! `[RequestLog, Authenticate]` logs every request, including the ones the
//! auth gate turns away.

use crate::auth::middleware::auth_middleware;
use crate::AppState;
use axum::{
    extract::Request,
    http::header,
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};
use std::time::Instant;
use tracing::info;

/// A capability applied to a request before it reaches its handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interceptor {
    /// Logs method, URI, host, status and latency.
    RequestLog,
    /// Rejects requests without a valid bearer token (the auth gate).
    Authenticate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    stages: Vec<Interceptor>,
}

impl Pipeline {
    pub fn new(stages: Vec<Interceptor>) -> Self {
        Self { stages }
    }

    /// Pipeline for routes anyone may call.
    pub fn public() -> Self {
        Self::new(vec![Interceptor::RequestLog])
    }

    /// Pipeline for routes that need an authenticated subject.
    pub fn authenticated() -> Self {
        Self::new(vec![Interceptor::RequestLog, Interceptor::Authenticate])
    }

    pub fn for_route(requires_auth: bool) -> Self {
        if requires_auth {
            Self::authenticated()
        } else {
            Self::public()
        }
    }

    pub fn stages(&self) -> &[Interceptor] {
        &self.stages
    }

    pub fn requires_auth(&self) -> bool {
        self.stages.contains(&Interceptor::Authenticate)
    }

    /// Wraps `endpoint` in every stage. The innermost stage is applied
    /// first so the first listed stage ends up outermost.
    pub fn wrap(
        &self,
        endpoint: MethodRouter<AppState>,
        state: &AppState,
    ) -> MethodRouter<AppState> {
        self.stages
            .iter()
            .rev()
            .fold(endpoint, |endpoint, stage| match stage {
                Interceptor::RequestLog => endpoint.route_layer(middleware::from_fn(log_request)),
                Interceptor::Authenticate => endpoint.route_layer(
                    middleware::from_fn_with_state(state.tokens.clone(), auth_middleware),
                ),
            })
    }
}

/// Logs one line per request once the response is known.
pub async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let host = req
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    info!(
        %method,
        %uri,
        %host,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );

    response
}
