//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the fallback handler
//! - Wire up middleware (request ID, tracing, access log, Riap stages)
//! - Bind server to listener
//! - Stop once shutdown is triggered

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware,
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::call::{Registry, ServeCall};
use crate::config::RiapConfig;
use crate::lifecycle::Shutdown;
use crate::http::error_page;
use crate::http::middleware::{
    access_log_middleware, parse_request_middleware, serve_call_middleware,
};
use crate::parse::ParseRequest;
use crate::riap::RpcRequest;

/// HTTP server wrapping the Riap middleware stack.
pub struct RiapServer {
    router: Router,
    config: RiapConfig,
}

impl RiapServer {
    /// Create a server from ready-built stages.
    pub fn new(config: RiapConfig, parse: ParseRequest, serve: ServeCall) -> Self {
        let router = Self::build_router(&config, Arc::new(parse), Arc::new(serve));
        Self { router, config }
    }

    /// Create a server that calls into `registry`, which also supplies the
    /// positional argument metadata.
    pub fn with_registry(config: RiapConfig, registry: Arc<Registry>) -> Result<Self, regex::Error> {
        let parse = ParseRequest::from_config(&config.parse_request)?
            .with_schema_source(registry.clone());
        let serve = ServeCall::new(registry, &config.serve_call);
        Ok(Self::new(config, parse, serve))
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers wrap outward: the last one added sees the request first.
    fn build_router(config: &RiapConfig, parse: Arc<ParseRequest>, serve: Arc<ServeCall>) -> Router {
        let router = Router::new()
            .route("/", any(unhandled_action))
            .route("/{*path}", any(unhandled_action))
            .layer(middleware::from_fn_with_state(serve, serve_call_middleware))
            .layer(middleware::from_fn_with_state(parse, parse_request_middleware));

        let router = if config.observability.access_log {
            router.layer(middleware::from_fn(access_log_middleware))
        } else {
            router
        };

        router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The assembled router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn into_router(self) -> Router {
        self.router
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RiapConfig {
        &self.config
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` is triggered.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let signalled = shutdown.signalled();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                signalled.await;
                tracing::info!("Draining in-flight requests");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Reached by Riap actions the dispatcher does not serve.
async fn unhandled_action(request: Request<Body>) -> Response {
    let action = request
        .extensions()
        .get::<RpcRequest>()
        .map(|rpc| rpc.action.to_string())
        .unwrap_or_default();
    tracing::debug!(action = %action, "No handler for Riap action");
    error_page::render(
        StatusCode::NOT_IMPLEMENTED,
        &format!("Action '{action}' not implemented"),
        request.headers(),
    )
}
