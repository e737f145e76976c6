//! Call dispatch middleware.
//!
//! # Responsibilities
//! - Pass anything that is not a Riap `call` to the next stage
//! - Check output format, `log_level` and target uri before calling
//! - Run the call and write the formatted result
//! - Stream per-call log lines when `log_level` is requested
//!
//! # Design Decisions
//! - A streamed response commits `200 text/plain` before the call runs, so
//!   the call outcome only shows in the body
//! - The log sink is detached before the result is written
//! - A streamed call is cancelled once the response body is dropped
//! - Timing and the request record go into the response extensions

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures_util::stream;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::call::logger::{dropped_notice, RESULT_MARKER, STREAM_CAPACITY};
use crate::call::{CallLogger, CallTimingHandle, LogLevel, ServeCall};
use crate::error::ClientError;
use crate::format::Formatter;
use crate::http::error_page;
use crate::riap::{is_truthy, CallResult, RpcRequest, TargetUri};

pub async fn serve_call_middleware(
    State(serve): State<Arc<ServeCall>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let rpc = request
        .extensions()
        .get::<RpcRequest>()
        .filter(|rpc| rpc.action.is_call())
        .cloned();
    let Some(rpc) = rpc else {
        return next.run(request).await;
    };
    let headers = request.headers().clone();

    let call = match prepare(&serve, &rpc) {
        Ok(call) => call,
        Err(err) => {
            tracing::info!(
                uri = rpc.uri.as_deref().unwrap_or("-"),
                status = err.status().as_u16(),
                error = %err,
                "Refused call"
            );
            return error_page::client_error(&err, &headers);
        }
    };

    let timing = CallTimingHandle::default();
    let mut response = match call.log_level {
        Some(level) => stream_call(serve, call, level, rpc.mark_log(), timing.clone()),
        None => respond(serve, call, &timing, &headers).await,
    };
    response.extensions_mut().insert(timing);
    response.extensions_mut().insert(rpc);
    response
}

/// Everything checked before the call is made.
struct PreparedCall {
    formatter: &'static dyn Formatter,
    log_level: Option<LogLevel>,
    target: TargetUri,
    args: serde_json::Map<String, Value>,
    limit: Option<Duration>,
}

fn prepare(serve: &ServeCall, rpc: &RpcRequest) -> Result<PreparedCall, ClientError> {
    let formatter = serve.formatter(&rpc.fmt)?;

    let log_level = match rpc.log_level().filter(|v| is_truthy(v)) {
        None => None,
        Some(Value::String(s)) => Some(
            s.parse::<LogLevel>()
                .map_err(|_| ClientError::InvalidLogLevel(s.clone()))?,
        ),
        Some(other) => return Err(ClientError::InvalidLogLevel(other.to_string())),
    };

    let uri = rpc.uri.as_deref().unwrap_or_default();
    let target = TargetUri::parse(uri).map_err(|reason| ClientError::InvalidUri {
        uri: uri.to_string(),
        reason,
    })?;

    Ok(PreparedCall {
        formatter,
        log_level,
        target,
        args: rpc.args.clone().unwrap_or_default(),
        limit: serve.time_limit_for(rpc),
    })
}

async fn respond(
    serve: Arc<ServeCall>,
    call: PreparedCall,
    timing: &CallTimingHandle,
    headers: &HeaderMap,
) -> Response {
    let result = serve
        .execute(call.target, call.args, CallLogger::detached(), call.limit, timing)
        .await;

    match call.formatter.format(&result) {
        Ok(formatted) => {
            let mut response = (StatusCode::OK, Body::from(formatted.body)).into_response();
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(formatted.content_type),
            );
            response
        }
        Err(e) => {
            tracing::error!(format = call.formatter.name(), error = %e, "Can't format result");
            error_page::render(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("Can't format result: {e}"),
                headers,
            )
        }
    }
}

fn stream_call(
    serve: Arc<ServeCall>,
    call: PreparedCall,
    level: LogLevel,
    mark: bool,
    timing: CallTimingHandle,
) -> Response {
    let (tx, rx) = mpsc::channel::<Vec<u8>>(STREAM_CAPACITY);
    let (logger, guard) = CallLogger::streaming(level, mark, tx.clone());
    let uri = call.target.to_string();

    tokio::spawn(async move {
        let result = tokio::select! {
            result = serve.execute(call.target, call.args, logger, call.limit, &timing) => result,
            _ = tx.closed() => {
                tracing::info!(uri = %uri, "Client went away, call cancelled");
                return;
            }
        };

        let dropped = guard.close();
        if dropped > 0 {
            tracing::warn!(uri = %uri, dropped, "Streamed log lines dropped");
            let _ = tx.send(dropped_notice(dropped, mark)).await;
        }

        let mut chunk = Vec::new();
        if mark {
            chunk.push(RESULT_MARKER);
        }
        chunk.extend(encode_streamed(call.formatter, &result));
        let _ = tx.send(chunk).await;
    });

    let body = stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|chunk| (Ok::<_, Infallible>(chunk), rx))
    });

    let mut response = (StatusCode::OK, Body::from_stream(body)).into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    response
}

fn encode_streamed(formatter: &dyn Formatter, result: &CallResult) -> Vec<u8> {
    match formatter.encode(result) {
        Ok(body) => body,
        Err(e) => {
            tracing::error!(format = formatter.name(), error = %e, "Can't format streamed result");
            serde_json::json!([500, format!("Can't format result: {e}")])
                .to_string()
                .into_bytes()
        }
    }
}
