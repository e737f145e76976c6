//! `riap-http` server binary.
//!
//! Loads the configuration, installs logging, registers a small set of demo
//! functions and serves them until SIGINT/SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use riap_http::call::{CallError, Registry};
use riap_http::config::{self, RiapConfig};
use riap_http::lifecycle::{signals, Shutdown};
use riap_http::observability;
use riap_http::riap::{ArgSpec, CallResult};
use riap_http::RiapServer;

#[derive(Debug, Parser)]
#[command(name = "riap-http", version, about = "Serve Riap function calls over HTTP")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => RiapConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        config::validate_config(&config).map_err(config::ConfigError::Validation)?;
    }

    observability::init_tracing(&config.observability)?;

    tracing::info!("riap-http v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        uri_patterns = ?config.parse_request.uri_patterns,
        time_limit_secs = config.serve_call.time_limit_secs,
        "Configuration loaded"
    );

    let registry = Arc::new(demo_registry());
    tracing::info!(functions = registry.len(), "Function registry ready");

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    let server = RiapServer::with_registry(config, registry)?;
    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn demo_registry() -> Registry {
    Registry::new()
        .register("/Demo/echo", vec![], |args, _log| async move {
            Ok(CallResult::ok(Value::Object(args)))
        })
        .register(
            "/Demo/sum",
            vec![ArgSpec::new("nums").pos(0).greedy()],
            |args, log| async move {
                let nums = match args.get("nums") {
                    Some(Value::Array(items)) => items.clone(),
                    Some(other) => vec![other.clone()],
                    None => Vec::new(),
                };
                let mut total = 0.0;
                for n in &nums {
                    let n = match n {
                        Value::Number(n) => n.as_f64(),
                        Value::String(s) => s.parse().ok(),
                        _ => None,
                    }
                    .ok_or_else(|| CallError::InvalidArgument {
                        name: "nums".into(),
                        reason: format!("{n} is not a number"),
                    })?;
                    log.debug(format!("adding {n}"));
                    total += n;
                }
                Ok(CallResult::ok(json!(total)))
            },
        )
        .register(
            "/Demo/sleep",
            vec![ArgSpec::new("secs").pos(0)],
            |args, log| async move {
                let secs = args.get("secs").and_then(Value::as_f64).unwrap_or(1.0).max(0.0);
                log.info(format!("sleeping {secs}s"));
                tokio::time::sleep(Duration::from_secs_f64(secs)).await;
                log.info("woke up");
                Ok(CallResult::ok(json!(secs)))
            },
        )
        .register(
            "/Demo/fail",
            vec![ArgSpec::new("message").pos(0)],
            |args, _log| async move {
                let message = args
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("requested failure")
                    .to_string();
                Err(CallError::Failed(message))
            },
        )
}
