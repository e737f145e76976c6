//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceExt;

use riap_http::call::{CallError, Registry, ServeCall, TimeLimit};
use riap_http::config::RiapConfig;
use riap_http::lifecycle::Shutdown;
use riap_http::parse::ParseRequest;
use riap_http::riap::{ArgSpec, CallResult};
use riap_http::RiapServer;

/// Iterations of `/Test/spin`, which loops until it is cancelled.
pub static SPIN_TICKS: AtomicUsize = AtomicUsize::new(0);

/// Functions used across the integration tests.
pub fn test_registry() -> Registry {
    Registry::new()
        .register(
            "/Math/add",
            vec![ArgSpec::new("a").pos(0), ArgSpec::new("b").pos(1)],
            |args, _log| async move {
                let num = |k: &str| match args.get(k) {
                    Some(Value::Number(n)) => n.as_f64(),
                    Some(Value::String(s)) => s.parse().ok(),
                    _ => None,
                };
                match (num("a"), num("b")) {
                    (Some(a), Some(b)) => Ok(CallResult::ok(json!(a + b))),
                    _ => Ok(CallResult::new(400, "a and b must be numbers")),
                }
            },
        )
        .register(
            "/Math/sum",
            vec![ArgSpec::new("nums").pos(0).greedy()],
            |args, _log| async move {
                let total: f64 = args
                    .get("nums")
                    .and_then(Value::as_array)
                    .map(|items| items.iter().filter_map(Value::as_f64).sum())
                    .unwrap_or_default();
                Ok(CallResult::ok(json!(total)))
            },
        )
        .register("/Test/echo", vec![], |args, _log| async move {
            Ok(CallResult::ok(Value::Object(args)))
        })
        .register("/Test/hang", vec![], |_args, _log| async move {
            std::future::pending::<()>().await;
            Ok(CallResult::ok(Value::Null))
        })
        .register("/Test/fail", vec![], |_args, _log| async move {
            Err(CallError::Failed("boom".into()))
        })
        .register("/Test/log", vec![], |_args, log| async move {
            log.debug("debug line");
            log.info("info line");
            tokio::time::sleep(Duration::from_millis(20)).await;
            log.warn("warn line");
            Ok(CallResult::ok(json!("done")))
        })
        .register("/Test/spin", vec![], |_args, log| async move {
            while SPIN_TICKS.fetch_add(1, Ordering::SeqCst) < usize::MAX {
                log.info("tick");
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            Ok(CallResult::ok(Value::Null))
        })
}

/// Assert that `/Test/spin` has run and is no longer running.
pub async fn assert_spin_stopped() {
    tokio::time::sleep(Duration::from_millis(50)).await;
    let settled = SPIN_TICKS.load(Ordering::SeqCst);
    assert!(settled > 0, "spin never started");
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(SPIN_TICKS.load(Ordering::SeqCst), settled, "spin still running");
}

/// Full middleware stack over [`test_registry`].
pub fn router(config: RiapConfig) -> Router {
    RiapServer::with_registry(config, Arc::new(test_registry()))
        .unwrap()
        .into_router()
}

/// Full middleware stack with a fixed call time limit.
pub fn router_with_time_limit(config: RiapConfig, limit: Duration) -> Router {
    let registry = Arc::new(test_registry());
    let parse = ParseRequest::from_config(&config.parse_request)
        .unwrap()
        .with_schema_source(registry.clone());
    let serve = ServeCall::new(registry, &config.serve_call).with_time_limit(TimeLimit::Fixed(limit));
    RiapServer::new(config, parse, serve).into_router()
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.to_vec()).unwrap()
    }

    pub fn content_type(&self) -> &str {
        self.headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }
}

/// Send one request through `router` in-process.
pub async fn send(router: Router, request: Request<Body>) -> TestResponse {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    TestResponse { status, headers, body }
}

/// Serve the full stack on an ephemeral port.
pub async fn start_server(config: RiapConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = RiapServer::with_registry(config, Arc::new(test_registry())).unwrap();

    let shutdown = Shutdown::new();
    let stop = shutdown.clone();
    tokio::spawn(async move {
        let _ = server.run(listener, stop).await;
    });
    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
