//! Request normalization middleware.
//!
//! Buffers the body, builds the [`RpcRequest`] and stores it in the request
//! extensions for the stages below. Malformed input short-circuits with an
//! error page.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::error::ClientError;
use crate::http::error_page;
use crate::parse::ParseRequest;

pub async fn parse_request_middleware(
    State(parser): State<Arc<ParseRequest>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();

    let bytes = match axum::body::to_bytes(body, parser.max_body_size()).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let err = ClientError::BodyRead(e.to_string());
            tracing::warn!(path = %parts.uri.path(), error = %err, "Rejected request body");
            return error_page::client_error(&err, &parts.headers);
        }
    };

    match parser.normalize(&parts, &bytes) {
        Ok(rpc) => {
            tracing::debug!(
                action = %rpc.action,
                uri = rpc.uri.as_deref().unwrap_or("-"),
                fmt = %rpc.fmt,
                "Parsed Riap request"
            );
            parts.extensions.insert(rpc);
            next.run(Request::from_parts(parts, Body::from(bytes))).await
        }
        Err(err) => {
            tracing::info!(
                path = %parts.uri.path(),
                status = err.status().as_u16(),
                error = %err,
                "Rejected Riap request"
            );
            error_page::client_error(&err, &parts.headers)
        }
    }
}
