//! Access logging.
//!
//! One structured event per request, written after the inner stages ran.
//! Riap fields come from the response extensions left by the serve-call
//! stage; for streamed calls the call duration is whatever has been recorded
//! when the response head goes out.

use std::time::Instant;

use axum::{body::Body, http::Request, middleware::Next, response::Response};

use crate::call::CallTimingHandle;
use crate::riap::RpcRequest;

pub async fn access_log_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let response = next.run(request).await;

    let rpc = response.extensions().get::<RpcRequest>();
    let call_ms = response
        .extensions()
        .get::<CallTimingHandle>()
        .and_then(|t| t.snapshot().duration())
        .map(|d| d.num_milliseconds());

    tracing::info!(
        target: "riap_http::access",
        request_id = %request_id,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        action = rpc.map(|r| r.action.as_str()).unwrap_or("-"),
        uri = rpc.and_then(|r| r.uri.as_deref()).unwrap_or("-"),
        call_ms = ?call_ms,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "request"
    );

    response
}
