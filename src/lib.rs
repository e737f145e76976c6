//! Riap over HTTP.
//!
//! Two axum middleware stages turn an HTTP request into a Riap function
//! call and the call result back into an HTTP response:
//!
//! ```text
//!     HTTP request
//!         → parse_request  (headers, body, uri pattern, query, path info)
//!         → RpcRequest in request extensions
//!         → serve_call     (format, log_level, target, time limit)
//!         → Caller         (in-process Registry or any other mechanism)
//!         → CallResult → json / yaml / php body, or a streamed text/plain body
//! ```

pub mod call;
pub mod config;
pub mod error;
pub mod format;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod parse;
pub mod riap;

pub use call::{Caller, Registry, ServeCall, TimeLimit};
pub use config::RiapConfig;
pub use error::ClientError;
pub use http::RiapServer;
pub use lifecycle::Shutdown;
pub use parse::ParseRequest;
pub use riap::{CallResult, RpcRequest};
