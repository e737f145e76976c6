//! Call execution with time limit.
//!
//! # Responsibilities
//! - Select the formatter for the requested output format
//! - Resolve the time limit (fixed or computed per request)
//! - Run the call under the deadline and record timing
//! - Substitute timeout / exception / BUG results
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities over a spawned task
//! - The call task is aborted on timeout and when the caller goes away
//! - Panics inside the called function are reported as exceptions

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::task::JoinHandle;

use crate::call::{CallError, CallLogger, CallOptions, CallRequest, CallTimingHandle, Caller};
use crate::config::{FormatsConfig, ServeCallConfig};
use crate::error::ClientError;
use crate::format::{self, Formatter};
use crate::riap::{CallResult, RpcRequest, TargetUri};

/// Computes the time limit for one request.
pub type TimeLimitFn = Arc<dyn Fn(&ServeCall, &RpcRequest) -> Option<Duration> + Send + Sync>;

/// How long a call may run. A zero duration means no limit.
#[derive(Clone, Default)]
pub enum TimeLimit {
    #[default]
    Unlimited,
    Fixed(Duration),
    Computed(TimeLimitFn),
}

impl TimeLimit {
    pub fn from_secs(secs: u64) -> Self {
        if secs == 0 {
            TimeLimit::Unlimited
        } else {
            TimeLimit::Fixed(Duration::from_secs(secs))
        }
    }

    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&ServeCall, &RpcRequest) -> Option<Duration> + Send + Sync + 'static,
    {
        TimeLimit::Computed(Arc::new(f))
    }
}

impl fmt::Debug for TimeLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeLimit::Unlimited => f.write_str("Unlimited"),
            TimeLimit::Fixed(d) => f.debug_tuple("Fixed").field(d).finish(),
            TimeLimit::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// The call dispatcher state shared by the serve-call middleware.
pub struct ServeCall {
    caller: Arc<dyn Caller>,
    formats: FormatsConfig,
    time_limit: TimeLimit,
    options: CallOptions,
}

impl ServeCall {
    pub fn new(caller: Arc<dyn Caller>, config: &ServeCallConfig) -> Self {
        Self {
            caller,
            formats: config.formats.clone(),
            time_limit: TimeLimit::from_secs(config.time_limit_secs),
            options: CallOptions::default(),
        }
    }

    pub fn with_time_limit(mut self, time_limit: TimeLimit) -> Self {
        self.time_limit = time_limit;
        self
    }

    pub fn formats(&self) -> &FormatsConfig {
        &self.formats
    }

    /// Formatter for `fmt`, if the format is both enabled and known.
    pub fn formatter(&self, fmt: &str) -> Result<&'static dyn Formatter, ClientError> {
        if !self.formats.allows(fmt) {
            return Err(ClientError::UnknownFormat(fmt.to_string()));
        }
        format::lookup(fmt).ok_or_else(|| ClientError::UnknownFormat(fmt.to_string()))
    }

    /// Effective limit for `request`; `None` means unlimited.
    pub fn time_limit_for(&self, request: &RpcRequest) -> Option<Duration> {
        let limit = match &self.time_limit {
            TimeLimit::Unlimited => None,
            TimeLimit::Fixed(d) => Some(*d),
            TimeLimit::Computed(f) => f(self, request),
        };
        limit.filter(|d| !d.is_zero())
    }

    /// Invoke `target` and return its result or a substitute.
    pub async fn execute(
        &self,
        target: TargetUri,
        args: Map<String, Value>,
        logger: CallLogger,
        limit: Option<Duration>,
        timing: &CallTimingHandle,
    ) -> CallResult {
        let uri = target.to_string();
        let request = CallRequest {
            target,
            args,
            options: self.options,
            logger,
        };

        timing.mark_start();
        let mut task = CallTask(tokio::spawn(self.caller.call(request)));
        let joined = match limit {
            None => (&mut task.0).await,
            Some(limit) => match tokio::time::timeout(limit, &mut task.0).await {
                Ok(joined) => joined,
                Err(_) => {
                    drop(task);
                    timing.mark_finish();
                    tracing::warn!(uri = %uri, limit_ms = limit.as_millis() as u64, "Call timed out");
                    return CallResult::timed_out();
                }
            },
        };
        timing.mark_finish();

        match joined {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                tracing::warn!(uri = %uri, error = %e, "Call failed");
                CallResult::exception(e)
            }
            Err(e) if e.is_panic() => {
                let message = panic_message(e.into_panic());
                tracing::error!(uri = %uri, panic = %message, "Called function panicked");
                CallResult::exception(message)
            }
            Err(_) => {
                tracing::error!(uri = %uri, "Call ended without result or failure");
                CallResult::bug()
            }
        }
    }
}

/// Aborts the call task when dropped, so a call never outlives the request
/// that started it.
struct CallTask(JoinHandle<Result<CallResult, CallError>>);

impl Drop for CallTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl fmt::Debug for ServeCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServeCall")
            .field("formats", &self.formats)
            .field("time_limit", &self.time_limit)
            .field("options", &self.options)
            .finish()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic in called function".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::Registry;
    use crate::riap::ArgSpec;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    fn registry() -> Registry {
        Registry::new()
            .register("/T/ok", vec![], |_args, _log| async { Ok(CallResult::ok(json!(1))) })
            .register("/T/hang", vec![], |_args, _log| async {
                std::future::pending::<()>().await;
                Ok(CallResult::ok(json!(null)))
            })
            .register("/T/fail", vec![], |_args, _log| async {
                Err(CallError::Failed("boom".into()))
            })
            .register("/T/panic", vec![ArgSpec::new("x")], |args, _log| async move {
                if !args.contains_key("x") {
                    panic!("kaboom");
                }
                Ok(CallResult::ok(json!(null)))
            })
    }

    fn serve(limit: TimeLimit) -> ServeCall {
        ServeCall::new(Arc::new(registry()), &ServeCallConfig::default()).with_time_limit(limit)
    }

    async fn run(serve: &ServeCall, uri: &str, limit: Option<Duration>) -> CallResult {
        serve
            .execute(
                TargetUri::parse(uri).unwrap(),
                Map::new(),
                CallLogger::detached(),
                limit,
                &CallTimingHandle::default(),
            )
            .await
    }

    #[tokio::test]
    async fn test_ok_records_timing() {
        let serve = serve(TimeLimit::Unlimited);
        let timing = CallTimingHandle::default();
        let res = serve
            .execute(
                TargetUri::parse("pm:/T/ok").unwrap(),
                Map::new(),
                CallLogger::detached(),
                None,
                &timing,
            )
            .await;
        assert_eq!(res, CallResult::ok(json!(1)));
        assert!(timing.snapshot().duration().is_some());
    }

    #[tokio::test]
    async fn test_timeout() {
        let serve = serve(TimeLimit::Unlimited);
        let started = Instant::now();
        let res = run(&serve, "pm:/T/hang", Some(Duration::from_millis(100))).await;
        assert_eq!(res, CallResult::timed_out());
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_dropped_execute_aborts_call() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let registry = Registry::new().register("/T/spin", vec![], move |_args, _log| {
            let counter = Arc::clone(&counter);
            async move {
                while counter.fetch_add(1, Ordering::SeqCst) < usize::MAX {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
                Ok(CallResult::ok(json!(null)))
            }
        });
        let serve = ServeCall::new(Arc::new(registry), &ServeCallConfig::default());

        let call = run(&serve, "pm:/T/spin", Some(Duration::from_secs(60)));
        assert!(tokio::time::timeout(Duration::from_millis(50), call).await.is_err());

        tokio::time::sleep(Duration::from_millis(50)).await;
        let settled = ticks.load(Ordering::SeqCst);
        assert!(settled > 0);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), settled);
    }

    #[tokio::test]
    async fn test_exception_and_panic() {
        let serve = serve(TimeLimit::Unlimited);
        let res = run(&serve, "pm:/T/fail", None).await;
        assert_eq!(res.message, "Exception: boom");

        let res = run(&serve, "pm:/T/panic", None).await;
        assert_eq!(res.status, 500);
        assert_eq!(res.message, "Exception: kaboom");
    }

    #[test]
    fn test_time_limit_resolution() {
        let req = RpcRequest::call("pm:/T/ok", "json");

        assert_eq!(serve(TimeLimit::Unlimited).time_limit_for(&req), None);
        assert_eq!(serve(TimeLimit::from_secs(0)).time_limit_for(&req), None);
        assert_eq!(
            serve(TimeLimit::from_secs(3)).time_limit_for(&req),
            Some(Duration::from_secs(3))
        );

        let computed = serve(TimeLimit::computed(|_serve, req| {
            req.option("timeout")
                .and_then(|v| v.as_str())
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
        }));
        assert_eq!(computed.time_limit_for(&req), None);

        let mut with_opt = req.clone();
        with_opt.options.insert("timeout".into(), json!("250"));
        assert_eq!(computed.time_limit_for(&with_opt), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_formatter_selection() {
        let mut config = ServeCallConfig::default();
        config.formats.php = false;
        let serve = ServeCall::new(Arc::new(registry()), &config);

        assert_eq!(serve.formatter("json").unwrap().name(), "json");
        assert!(matches!(serve.formatter("php"), Err(ClientError::UnknownFormat(_))));
        assert!(matches!(serve.formatter("xml"), Err(ClientError::UnknownFormat(_))));
    }
}
