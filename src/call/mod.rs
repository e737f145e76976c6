//! Call dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! RpcRequest (action = call)
//!     → dispatch.rs  pick formatter, resolve time limit, run the call
//!     → Caller       external call mechanism (registry.rs is the in-process one)
//!     → CallResult   (or timeout / exception / BUG substitute)
//!     → formatter
//! ```
//!
//! # Design Decisions
//! - The call runs in its own task; the deadline aborts it
//! - The log sink is passed in the call context, never global
//! - Failures become result envelopes, not HTTP errors

pub mod dispatch;
pub mod logger;
pub mod registry;
pub mod timing;

use futures_util::future::BoxFuture;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::riap::{CallResult, TargetUri};

pub use self::dispatch::{ServeCall, TimeLimit, TimeLimitFn};
pub use self::logger::{CallLogger, LogLevel};
pub use self::registry::Registry;
pub use self::timing::{CallTiming, CallTimingHandle};

/// Failure raised by a call mechanism or the function it invoked.
#[derive(Debug, Error)]
pub enum CallError {
    #[error("{0}")]
    Failed(String),

    #[error("invalid argument '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Flags passed to the call mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallOptions {
    /// Load the module on demand before calling.
    pub load: bool,
    /// Convert date/time arguments to epoch seconds.
    pub convert_datetime_args: bool,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            load: false,
            convert_datetime_args: true,
        }
    }
}

/// Everything the call mechanism receives for one invocation.
#[derive(Debug)]
pub struct CallRequest {
    pub target: TargetUri,
    pub args: Map<String, Value>,
    pub options: CallOptions,
    pub logger: CallLogger,
}

pub type CallFuture = BoxFuture<'static, Result<CallResult, CallError>>;

/// The external call mechanism.
pub trait Caller: Send + Sync + 'static {
    fn call(&self, request: CallRequest) -> CallFuture;
}
